// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipescaffold contributors

//! Setup builder
//!
//! Accumulates toolchain actions, shell steps and caches in call order.

use indexmap::IndexMap;
use serde_yaml::Value;

use crate::pipeline::{CacheSpec, SetupAction, SetupSpec, SetupStep};

/// Builder for the setup section of a descriptor
#[derive(Debug, Clone, Default)]
pub struct SetupBuilder {
    actions: Vec<SetupAction>,
    steps: Vec<SetupStep>,
    caches: Vec<CacheSpec>,
}

impl SetupBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Python via `actions/setup-python`
    pub fn setup_python(mut self, version: &str, cache: Option<&str>) -> Self {
        let mut with = params([("python-version", version.into())]);
        if let Some(cache) = cache {
            with.insert("cache".into(), cache.into());
        }
        self.push_action("Set up Python", "actions/setup-python@v4", with);
        self
    }

    /// Node.js via `actions/setup-node`
    pub fn setup_node(mut self, version: &str, cache: Option<&str>) -> Self {
        let mut with = params([("node-version", version.into())]);
        if let Some(cache) = cache {
            with.insert("cache".into(), cache.into());
        }
        self.push_action("Set up Node.js", "actions/setup-node@v3", with);
        self
    }

    /// Java via `actions/setup-java`
    pub fn setup_java(mut self, version: &str, distribution: &str, cache: Option<&str>) -> Self {
        let mut with = params([
            ("distribution", distribution.into()),
            ("java-version", version.into()),
        ]);
        if let Some(cache) = cache {
            with.insert("cache".into(), cache.into());
        }
        self.push_action("Set up Java", "actions/setup-java@v3", with);
        self
    }

    /// Flutter via `subosito/flutter-action`
    pub fn setup_flutter(mut self, version: &str, channel: &str, cache: bool) -> Self {
        let with = params([
            ("flutter-version", version.into()),
            ("channel", channel.into()),
            ("cache", cache.into()),
        ]);
        self.push_action("Set up Flutter", "subosito/flutter-action@v2", with);
        self
    }

    /// Rust via `dtolnay/rust-toolchain`
    pub fn setup_rust(mut self, toolchain: &str, components: &[&str]) -> Self {
        let mut with = params([("toolchain", toolchain.into())]);
        if !components.is_empty() {
            with.insert("components".into(), components.join(", ").into());
        }
        self.push_action("Set up Rust", "dtolnay/rust-toolchain@master", with);
        self
    }

    /// Any other action
    pub fn add_action(mut self, name: &str, uses: &str, with: IndexMap<String, Value>) -> Self {
        self.push_action(name, uses, with);
        self
    }

    /// A shell command run before the pipeline
    pub fn add_step(mut self, name: &str, run: &str) -> Self {
        self.steps.push(SetupStep {
            name: name.to_string(),
            run: run.to_string(),
        });
        self
    }

    pub fn cache_pip(self, key_file: &str) -> Self {
        let key = format!("${{{{ runner.os }}}}-pip-${{{{ hashFiles('{}') }}}}", key_file);
        self.add_cache("pip", "~/.cache/pip", &key, Vec::new())
    }

    pub fn cache_npm(self, key_file: &str) -> Self {
        let key = format!("${{{{ runner.os }}}}-npm-${{{{ hashFiles('{}') }}}}", key_file);
        self.add_cache("npm", "~/.npm", &key, Vec::new())
    }

    pub fn cache_gradle(self, key_files: &[&str]) -> Self {
        let files = key_files
            .iter()
            .map(|f| format!("'{}'", f))
            .collect::<Vec<_>>()
            .join(", ");
        let key = format!("${{{{ runner.os }}}}-gradle-${{{{ hashFiles({}) }}}}", files);
        self.add_cache("gradle", "~/.gradle", &key, Vec::new())
    }

    /// Cargo registry, git checkouts and the target directory
    pub fn cache_cargo(self, key_file: &str) -> Self {
        let key = format!("${{{{ runner.os }}}}-cargo-${{{{ hashFiles('{}') }}}}", key_file);
        let restore = vec!["${{ runner.os }}-cargo-".to_string()];
        self.add_cache(
            "cargo",
            "~/.cargo/registry\n~/.cargo/git\ntarget",
            &key,
            restore,
        )
    }

    pub fn add_cache(mut self, name: &str, path: &str, key: &str, restore_keys: Vec<String>) -> Self {
        self.caches.push(CacheSpec {
            name: name.to_string(),
            path: path.to_string(),
            key: key.to_string(),
            restore_keys,
        });
        self
    }

    pub fn build(&self) -> SetupSpec {
        SetupSpec {
            actions: self.actions.clone(),
            steps: self.steps.clone(),
            caches: self.caches.clone(),
        }
    }

    fn push_action(&mut self, name: &str, uses: &str, with: IndexMap<String, Value>) {
        self.actions.push(SetupAction {
            name: name.to_string(),
            uses: uses.to_string(),
            with,
        });
    }
}

fn params<const N: usize>(pairs: [(&str, Value); N]) -> IndexMap<String, Value> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actions_keep_call_order() {
        let setup = SetupBuilder::new()
            .setup_node("18", Some("npm"))
            .setup_java("17", "temurin", None)
            .setup_flutter("3.16.0", "stable", true)
            .build();

        let uses: Vec<_> = setup.actions.iter().map(|a| a.uses.as_str()).collect();
        assert_eq!(
            uses,
            vec![
                "actions/setup-node@v3",
                "actions/setup-java@v3",
                "subosito/flutter-action@v2"
            ]
        );
        assert_eq!(setup.actions[0].with["cache"], Value::from("npm"));
        assert!(!setup.actions[1].with.contains_key("cache"));
        assert_eq!(setup.actions[2].with["cache"], Value::from(true));
    }

    #[test]
    fn test_cache_keys() {
        let setup = SetupBuilder::new()
            .cache_pip("**/requirements.txt")
            .cache_gradle(&["**/*.gradle*", "**/gradle-wrapper.properties"])
            .cache_cargo("**/Cargo.lock")
            .build();

        assert_eq!(
            setup.caches[0].key,
            "${{ runner.os }}-pip-${{ hashFiles('**/requirements.txt') }}"
        );
        assert_eq!(
            setup.caches[1].key,
            "${{ runner.os }}-gradle-${{ hashFiles('**/*.gradle*', '**/gradle-wrapper.properties') }}"
        );
        assert_eq!(setup.caches[2].restore_keys, vec!["${{ runner.os }}-cargo-"]);
    }

    #[test]
    fn test_empty_builder_builds_empty_spec() {
        assert!(SetupBuilder::new().build().is_empty());
    }

    #[test]
    fn test_build_is_repeatable() {
        let builder = SetupBuilder::new()
            .setup_rust("stable", &["clippy"])
            .add_step("Install tools", "cargo install cargo-nextest");
        assert_eq!(builder.build(), builder.build());
    }
}
