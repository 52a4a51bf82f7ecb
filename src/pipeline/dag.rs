// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipescaffold contributors

//! Job graph for composite workflows
//!
//! Validates the `needs` edges between the jobs of a composite workflow and
//! gives them a stable execution order.

use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{depth_first_search, Control, DfsEvent};
use std::collections::HashMap;

use super::descriptor::JobMap;
use crate::errors::{ScaffoldError, ScaffoldResult};

/// Dependency graph between the jobs of one workflow
pub struct JobGraph {
    graph: DiGraph<String, ()>,
    name_to_index: HashMap<String, NodeIndex>,
}

impl JobGraph {
    /// Build and validate the graph of a job map
    pub fn build(jobs: &JobMap) -> ScaffoldResult<Self> {
        let mut builder = Self {
            graph: DiGraph::new(),
            name_to_index: HashMap::new(),
        };

        for name in jobs.keys() {
            let node = builder.graph.add_node(name.clone());
            builder.name_to_index.insert(name.clone(), node);
        }

        for (name, job) in jobs {
            let job_node = builder.name_to_index[name];

            for need in &job.needs {
                let need_node = builder.name_to_index.get(need).ok_or_else(|| {
                    ScaffoldError::InvalidJobGraph {
                        reason: format!("job '{}' needs unknown job '{}'", name, need),
                    }
                })?;

                if !builder.graph.contains_edge(*need_node, job_node) {
                    builder.graph.add_edge(*need_node, job_node, ());
                }
            }
        }

        builder.topological_order()?;
        Ok(builder)
    }

    /// Job names so that every job follows the jobs it needs
    pub fn topological_order(&self) -> ScaffoldResult<Vec<String>> {
        toposort(&self.graph, None)
            .map(|nodes| nodes.into_iter().map(|n| self.graph[n].clone()).collect())
            .map_err(|cycle| ScaffoldError::InvalidJobGraph {
                reason: format!(
                    "dependency cycle through {}",
                    self.cycle_members(cycle.node_id()).join(" -> ")
                ),
            })
    }

    /// Jobs reachable from `start`, in discovery order
    fn cycle_members(&self, start: NodeIndex) -> Vec<String> {
        let mut members = Vec::new();

        depth_first_search(&self.graph, Some(start), |event| {
            if let DfsEvent::Discover(node, _) = event {
                members.push(self.graph[node].clone());
            }
            Control::<()>::Continue
        });

        members
    }

    /// Whether `job` needs `other`, directly or transitively
    pub fn depends_on(&self, job: &str, other: &str) -> bool {
        match (self.name_to_index.get(job), self.name_to_index.get(other)) {
            (Some(job), Some(other)) => has_path_connecting(&self.graph, *other, *job, None),
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}
