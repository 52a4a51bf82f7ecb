// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipescaffold contributors

//! Pipeline input keys and runtime input values
//!
//! Inputs have exactly one key form: lower-case kebab-case. Keys are
//! normalized when they are declared, and the `INPUT_*` environment
//! variables written by the generated workflow map back onto that form.

use indexmap::IndexMap;

/// Environment variable prefix used to hand inputs to a pipeline
pub const INPUT_ENV_PREFIX: &str = "INPUT_";

/// Normalize a key to the canonical kebab-case form
///
/// `Build_Command`, `build command` and `BUILD-COMMAND` all become
/// `build-command`.
pub fn canonical_key(key: &str) -> String {
    key.trim()
        .chars()
        .map(|c| match c {
            '_' | ' ' => '-',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Whether a key is already in canonical form
pub fn is_canonical_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('-')
        && !key.ends_with('-')
        && !key.contains("--")
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Environment variable carrying an input: `artifact-path` → `INPUT_ARTIFACT_PATH`
pub fn input_env_var(key: &str) -> String {
    format!("{}{}", INPUT_ENV_PREFIX, key.replace('-', "_").to_uppercase())
}

/// Input values handed to a running pipeline, keyed canonically
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineInputs {
    values: IndexMap<String, String>,
}

impl PipelineInputs {
    /// Create an empty input set
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect inputs from `INPUT_*` variables of the current process
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Collect inputs from an arbitrary set of environment variables
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut inputs = Self::new();
        for (key, value) in vars {
            if let Some(name) = key.as_ref().strip_prefix(INPUT_ENV_PREFIX) {
                if !name.is_empty() {
                    inputs.insert(name, value);
                }
            }
        }
        inputs
    }

    /// Set an input, normalizing its key
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(canonical_key(key), value.into());
    }

    /// Builder-style variant of [`insert`](Self::insert)
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Look up an input; empty values count as absent
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(&canonical_key(key))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Look up an input, falling back to a default
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Interpret an input as a boolean flag
    pub fn flag(&self, key: &str) -> bool {
        matches!(
            self.get(key).map(str::to_ascii_lowercase).as_deref(),
            Some("true" | "1" | "yes")
        )
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
