// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipescaffold contributors

//! Pipeline descriptor structures
//!
//! A descriptor is the analysis-time snapshot of what a pipeline needs from
//! CI. Its body uses the same keys as a sidecar override file so the two
//! can be merged key by key.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

/// Runner used when a pipeline does not ask for one
pub const DEFAULT_RUNS_ON: &str = "ubuntu-latest";

/// Runtime version assumed when a pipeline does not ask for one
pub const DEFAULT_RUNTIME_VERSION: &str = "3.11";

/// Declared inputs, in declaration order
pub type InputMap = IndexMap<String, InputSpec>;

/// Trigger events and their options, in declaration order
pub type TriggerMap = IndexMap<String, Value>;

/// Environment variables, in declaration order
pub type EnvMap = IndexMap<String, String>;

/// Jobs of a composite workflow, in declaration order
pub type JobMap = IndexMap<String, JobSpec>;

/// Snapshot of one pipeline's CI contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDescriptor {
    /// Pipeline name (lookup key)
    pub name: String,

    /// Human readable description
    pub description: String,

    /// Module reference used to build the execution command
    pub module: String,

    /// Descriptor body
    pub config: DescriptorConfig,
}

impl PipelineDescriptor {
    /// Runner label, falling back to the default
    pub fn runs_on(&self) -> &str {
        self.config.runs_on.as_deref().unwrap_or(DEFAULT_RUNS_ON)
    }

    /// Runtime version, falling back to the default
    pub fn runtime_version(&self) -> &str {
        self.config
            .runtime_version
            .as_deref()
            .unwrap_or(DEFAULT_RUNTIME_VERSION)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> Result<String, crate::ScaffoldError> {
        serde_yaml::to_string(self).map_err(Into::into)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, crate::ScaffoldError> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }
}

/// Descriptor body; empty sections are left out when serialized
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptorConfig {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub inputs: InputMap,

    #[serde(default, skip_serializing_if = "SetupSpec::is_empty")]
    pub setup: SetupSpec,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub triggers: TriggerMap,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub env: EnvMap,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runs_on: Option<String>,

    #[serde(default, alias = "pythonVersion", skip_serializing_if = "Option::is_none")]
    pub runtime_version: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub jobs: JobMap,
}

impl DescriptorConfig {
    /// Top-level keys a sidecar file may replace
    pub const KEYS: &'static [&'static str] = &[
        "inputs",
        "setup",
        "triggers",
        "env",
        "runsOn",
        "runtimeVersion",
        "pythonVersion",
        "dependencies",
        "jobs",
    ];

    /// Input keys declared as `workflow_dispatch` inputs
    pub fn dispatch_input_keys(&self) -> Vec<String> {
        self.triggers
            .get("workflow_dispatch")
            .and_then(|event| event.get("inputs"))
            .and_then(Value::as_mapping)
            .map(|inputs| {
                inputs
                    .keys()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A declared input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSpec {
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl InputSpec {
    pub fn new(description: impl Into<String>, required: bool, default: Option<Value>) -> Self {
        Self {
            description: description.into(),
            required,
            default,
        }
    }

    /// Default rendered as plain text (empty when there is none)
    pub fn default_text(&self) -> String {
        match &self.default {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => serde_yaml::to_string(other)
                .map(|s| s.trim_end().to_string())
                .unwrap_or_default(),
        }
    }

    /// Mapping form used inside `workflow_dispatch.inputs`
    pub fn to_value(&self) -> Value {
        let mut map = Mapping::new();
        map.insert("description".into(), self.description.clone().into());
        map.insert("required".into(), self.required.into());
        if let Some(default) = &self.default {
            map.insert("default".into(), default.clone());
        }
        Value::Mapping(map)
    }
}

/// Environment preparation for a pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetupSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<SetupAction>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<SetupStep>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub caches: Vec<CacheSpec>,
}

impl SetupSpec {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.steps.is_empty() && self.caches.is_empty()
    }
}

/// A reusable action run during setup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupAction {
    pub name: String,
    pub uses: String,
    #[serde(rename = "with", default, skip_serializing_if = "IndexMap::is_empty")]
    pub with: IndexMap<String, Value>,
}

/// A shell command run during setup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupStep {
    pub name: String,
    pub run: String,
}

/// A cached directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSpec {
    pub name: String,
    pub path: String,
    pub key: String,
    #[serde(rename = "restore-keys", default, skip_serializing_if = "Vec::is_empty")]
    pub restore_keys: Vec<String>,
}

/// One job of a composite workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    /// Pipeline the job runs
    pub pipeline: String,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub inputs: IndexMap<String, Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub needs: Vec<String>,

    #[serde(rename = "runsOn", default, skip_serializing_if = "Option::is_none")]
    pub runs_on: Option<String>,

    #[serde(rename = "if", default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl JobSpec {
    /// Create a job running the given pipeline
    pub fn new(pipeline: impl Into<String>) -> Self {
        Self {
            pipeline: pipeline.into(),
            inputs: IndexMap::new(),
            needs: Vec::new(),
            runs_on: None,
            condition: None,
        }
    }

    /// Pass a value to one of the pipeline's inputs
    pub fn input(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.inputs
            .insert(super::inputs::canonical_key(key), value.into());
        self
    }

    /// Jobs that must finish first
    pub fn needs<I, S>(mut self, jobs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.needs.extend(jobs.into_iter().map(Into::into));
        self
    }

    pub fn runs_on(mut self, runner: impl Into<String>) -> Self {
        self.runs_on = Some(runner.into());
        self
    }

    /// Only run the job when the expression holds
    pub fn condition(mut self, expression: impl Into<String>) -> Self {
        self.condition = Some(expression.into());
        self
    }
}
