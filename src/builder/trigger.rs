// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipescaffold contributors

//! Trigger builder
//!
//! Push, pull request and release triggers own a single entry that later
//! calls replace. Schedules accumulate. Manual dispatch inputs merge.

use serde_yaml::{Mapping, Value};

use crate::pipeline::{canonical_key, InputMap, TriggerMap};

/// Branch filter accepted by push and pull request triggers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branches(Vec<String>);

impl Branches {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl Default for Branches {
    /// `main` and `master`
    fn default() -> Self {
        Self(vec!["main".into(), "master".into()])
    }
}

impl From<&str> for Branches {
    fn from(branch: &str) -> Self {
        Self(vec![branch.to_string()])
    }
}

impl From<String> for Branches {
    fn from(branch: String) -> Self {
        Self(vec![branch])
    }
}

impl From<Vec<String>> for Branches {
    fn from(branches: Vec<String>) -> Self {
        Self(branches)
    }
}

impl From<Vec<&str>> for Branches {
    fn from(branches: Vec<&str>) -> Self {
        Self(branches.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Branches {
    fn from(branches: &[&str]) -> Self {
        Self(branches.iter().map(|b| b.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Branches {
    fn from(branches: [&str; N]) -> Self {
        Self(branches.iter().map(|b| b.to_string()).collect())
    }
}

/// Builder for the `on:` section of a workflow
#[derive(Debug, Clone, Default)]
pub struct TriggerBuilder {
    triggers: TriggerMap,
}

impl TriggerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_push(mut self, branches: impl Into<Branches>) -> Self {
        self.triggers
            .insert("push".into(), filter("branches", branches.into().0));
        self
    }

    pub fn on_pull_request(mut self, branches: impl Into<Branches>) -> Self {
        self.triggers
            .insert("pull_request".into(), filter("branches", branches.into().0));
        self
    }

    /// Release events, `published` by default
    pub fn on_release<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut types: Vec<String> = types.into_iter().map(Into::into).collect();
        if types.is_empty() {
            types.push("published".into());
        }
        self.triggers.insert("release".into(), filter("types", types));
        self
    }

    /// Add a cron schedule; repeated calls add more schedules
    pub fn on_schedule(mut self, cron: &str) -> Self {
        let mut entry = Mapping::new();
        entry.insert("cron".into(), cron.into());

        let schedule = self
            .triggers
            .entry("schedule".into())
            .or_insert_with(|| Value::Sequence(Vec::new()));
        if !schedule.is_sequence() {
            *schedule = Value::Sequence(Vec::new());
        }
        if let Value::Sequence(entries) = schedule {
            entries.push(Value::Mapping(entry));
        }
        self
    }

    /// Enable manual dispatch, merging `inputs` into any declared before
    pub fn on_workflow_dispatch(mut self, inputs: InputMap) -> Self {
        let event = self
            .triggers
            .entry("workflow_dispatch".into())
            .or_insert_with(|| Value::Mapping(Mapping::new()));
        if !event.is_mapping() {
            *event = Value::Mapping(Mapping::new());
        }

        // an event without inputs still enables manual runs
        if let (false, Value::Mapping(event)) = (inputs.is_empty(), event) {
            let declared = event
                .entry("inputs".into())
                .or_insert_with(|| Value::Mapping(Mapping::new()));
            if !declared.is_mapping() {
                *declared = Value::Mapping(Mapping::new());
            }
            if let Value::Mapping(declared) = declared {
                for (key, spec) in inputs {
                    declared.insert(canonical_key(&key).into(), spec.to_value());
                }
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    pub fn build(&self) -> TriggerMap {
        self.triggers.clone()
    }
}

fn filter(key: &str, values: Vec<String>) -> Value {
    let mut map = Mapping::new();
    map.insert(
        key.into(),
        Value::Sequence(values.into_iter().map(Value::from).collect()),
    );
    Value::Mapping(map)
}
