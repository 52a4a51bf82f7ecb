// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipescaffold contributors

//! External overrides of a descriptor
//!
//! A sidecar file (YAML or JSON) replaces top-level descriptor keys. A
//! `--trigger` value replaces the triggers after that.

use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

use crate::errors::{ScaffoldError, ScaffoldResult};
use crate::pipeline::{canonical_key, DescriptorConfig, TriggerMap};

/// Extensions tried for a sidecar file, in order
const SIDECAR_EXTENSIONS: &[&str] = &["yml", "yaml", "json"];

/// First sidecar file present for a pipeline stem
pub fn find_sidecar(sidecar_dir: &Path, stem: &str) -> Option<PathBuf> {
    SIDECAR_EXTENSIONS
        .iter()
        .map(|ext| sidecar_dir.join(format!("{}.{}", stem, ext)))
        .find(|path| path.is_file())
}

/// Read a sidecar file into a mapping of top-level keys
pub fn load_sidecar(path: &Path) -> ScaffoldResult<Mapping> {
    let config_error = |message: String| ScaffoldError::Config {
        path: path.to_path_buf(),
        message,
    };

    let content = std::fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
    let is_json = path.extension().is_some_and(|ext| ext == "json");

    let value: Value = if is_json {
        let json: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| config_error(e.to_string()))?;
        serde_yaml::to_value(json).map_err(|e| config_error(e.to_string()))?
    } else {
        serde_yaml::from_str(&content).map_err(|e| config_error(e.to_string()))?
    };

    match value {
        Value::Mapping(map) => Ok(map),
        Value::Null => Ok(Mapping::new()),
        _ => Err(config_error("expected a mapping of descriptor keys".into())),
    }
}

/// Replace descriptor keys with the ones present in `overrides`
///
/// Unknown keys are ignored with a warning. `pythonVersion` is accepted as
/// an alias of `runtimeVersion`. Input keys are brought into canonical form.
pub fn apply_overrides(
    config: &DescriptorConfig,
    overrides: &Mapping,
    source: &Path,
) -> ScaffoldResult<DescriptorConfig> {
    let config_error = |message: String| ScaffoldError::Config {
        path: source.to_path_buf(),
        message,
    };

    let mut merged = match serde_yaml::to_value(config).map_err(|e| config_error(e.to_string()))? {
        Value::Mapping(map) => map,
        _ => Mapping::new(),
    };

    for (key, value) in overrides {
        let Some(key) = key.as_str() else {
            tracing::warn!(path = %source.display(), "ignoring non-string override key");
            continue;
        };
        if !DescriptorConfig::KEYS.contains(&key) {
            tracing::warn!(path = %source.display(), key, "ignoring unknown override key");
            continue;
        }

        let key = if key == "pythonVersion" { "runtimeVersion" } else { key };
        merged.insert(Value::from(key), value.clone());
    }

    let mut config: DescriptorConfig =
        serde_yaml::from_value(Value::Mapping(merged)).map_err(|e| config_error(e.to_string()))?;
    canonicalize_input_keys(&mut config);
    Ok(config)
}

/// Rewrite every input key of a merged descriptor in canonical form
fn canonicalize_input_keys(config: &mut DescriptorConfig) {
    config.inputs = std::mem::take(&mut config.inputs)
        .into_iter()
        .map(|(key, spec)| (canonical_key(&key), spec))
        .collect();

    for job in config.jobs.values_mut() {
        job.inputs = std::mem::take(&mut job.inputs)
            .into_iter()
            .map(|(key, value)| (canonical_key(&key), value))
            .collect();
    }

    canonicalize_dispatch_inputs(&mut config.triggers);
}

fn canonicalize_dispatch_inputs(triggers: &mut TriggerMap) {
    let Some(inputs) = triggers
        .get_mut("workflow_dispatch")
        .and_then(|event| event.get_mut("inputs"))
        .and_then(Value::as_mapping_mut)
    else {
        return;
    };

    *inputs = std::mem::take(inputs)
        .into_iter()
        .map(|(key, spec)| match key.as_str() {
            Some(name) => (Value::from(canonical_key(name)), spec),
            None => (key, spec),
        })
        .collect();
}

/// Parse a `--trigger` JSON object into a trigger map
pub fn parse_trigger_override(json: &str) -> ScaffoldResult<TriggerMap> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| ScaffoldError::InvalidTrigger {
            message: e.to_string(),
        })?;

    if !value.is_object() {
        return Err(ScaffoldError::InvalidTrigger {
            message: "expected a JSON object keyed by event name".into(),
        });
    }

    let mut triggers: TriggerMap =
        serde_json::from_value(value).map_err(|e| ScaffoldError::InvalidTrigger {
            message: e.to_string(),
        })?;

    if triggers.is_empty() {
        return Err(ScaffoldError::InvalidTrigger {
            message: "at least one event is required".into(),
        });
    }
    canonicalize_dispatch_inputs(&mut triggers);
    Ok(triggers)
}
