// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipescaffold contributors

//! GitHub Actions workflow document

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::errors::ScaffoldError;
use crate::pipeline::{EnvMap, TriggerMap};

/// A complete workflow file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDocument {
    pub name: String,

    pub on: TriggerMap,

    pub jobs: IndexMap<String, Job>,
}

/// One job of a workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(rename = "runs-on")]
    pub runs_on: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub needs: Vec<String>,

    #[serde(rename = "if", default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    pub steps: Vec<Step>,
}

/// One step of a job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "if", default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uses: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<String>,

    #[serde(rename = "with", default, skip_serializing_if = "IndexMap::is_empty")]
    pub with: IndexMap<String, Value>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub env: EnvMap,
}

impl Step {
    /// A step using an action
    pub fn uses(name: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uses: Some(action.into()),
            ..Self::default()
        }
    }

    /// A step running a shell command
    pub fn run(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            run: Some(command.into()),
            ..Self::default()
        }
    }

    pub fn with_params(mut self, params: IndexMap<String, Value>) -> Self {
        self.with = params;
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_env(mut self, env: EnvMap) -> Self {
        self.env = env;
        self
    }
}

impl WorkflowDocument {
    /// Render as YAML with a bare `on:` key
    ///
    /// YAML 1.1 readers treat a bare `on` as a boolean, so serializers quote
    /// it. GitHub expects the bare form.
    pub fn to_yaml(&self) -> Result<String, ScaffoldError> {
        let yaml = serde_yaml::to_string(self).map_err(|e| ScaffoldError::Serialization {
            message: e.to_string(),
        })?;
        Ok(unquote_on_key(&yaml))
    }
}

fn unquote_on_key(yaml: &str) -> String {
    let mut out = String::with_capacity(yaml.len());
    for line in yaml.split_inclusive('\n') {
        match line
            .strip_prefix("'on':")
            .or_else(|| line.strip_prefix("\"on\":"))
        {
            Some(rest) => {
                out.push_str("on:");
                out.push_str(rest);
            }
            None => out.push_str(line),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> WorkflowDocument {
        let mut on = TriggerMap::new();
        on.insert(
            "push".into(),
            serde_yaml::from_str("branches: [main]").unwrap(),
        );

        let mut jobs = IndexMap::new();
        jobs.insert(
            "build".to_string(),
            Job {
                runs_on: "ubuntu-latest".into(),
                needs: Vec::new(),
                condition: None,
                steps: vec![
                    Step::uses("Checkout code", "actions/checkout@v4"),
                    Step::run("Run BuildPipeline", "cargo run -- run build::BuildPipeline")
                        .with_id("pipeline"),
                ],
            },
        );

        WorkflowDocument {
            name: "Build".into(),
            on,
            jobs,
        }
    }

    #[test]
    fn test_on_key_is_bare() {
        let yaml = document().to_yaml().unwrap();
        assert!(yaml.lines().any(|l| l == "on:"));
        assert!(!yaml.contains("'on'"));
        assert!(!yaml.contains("\"on\""));
    }

    #[test]
    fn test_top_level_key_order() {
        let yaml = document().to_yaml().unwrap();
        let name = yaml.find("name: Build").unwrap();
        let on = yaml.find("\non:").unwrap();
        let jobs = yaml.find("\njobs:").unwrap();
        assert!(name < on && on < jobs);
    }

    #[test]
    fn test_empty_step_fields_are_omitted() {
        let yaml = document().to_yaml().unwrap();
        assert!(yaml.contains("runs-on: ubuntu-latest"));
        assert!(yaml.contains("id: pipeline"));
        assert!(!yaml.contains("needs:"));
        assert!(!yaml.contains("env:"));
        assert!(!yaml.contains("with:"));
    }

    #[test]
    fn test_nested_on_keys_are_untouched() {
        assert_eq!(unquote_on_key("'on':\n  x: 1\n"), "on:\n  x: 1\n");
        assert_eq!(unquote_on_key("  'on': 1\n"), "  'on': 1\n");
    }

    #[test]
    fn test_rendered_document_parses_back() {
        let doc = document();
        let yaml = doc.to_yaml().unwrap();
        let value: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert!(value.get("jobs").and_then(|j| j.get("build")).is_some());
    }
}
