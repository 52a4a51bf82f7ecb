// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipescaffold contributors

//! Step synthesis
//!
//! Steps are emitted in a fixed order: checkout, bootstrap steps, setup
//! actions, caches, setup steps and finally the step running the pipeline.

use indexmap::IndexMap;
use serde_yaml::Value;

use super::document::Step;
use super::project::{BootstrapStep, ScaffoldSettings};
use crate::pipeline::{input_env_var, EnvMap, InputMap, SetupSpec};

/// Action used for cache entries
pub const CACHE_ACTION: &str = "actions/cache@v4";

/// Step id of the step running the pipeline
pub const PIPELINE_STEP_ID: &str = "pipeline";

/// What the run step needs to know about the pipeline it runs
pub struct RunTarget<'a> {
    pub name: &'a str,
    pub module: &'a str,
    pub inputs: &'a InputMap,
    pub env: &'a EnvMap,
}

/// All steps of a job running one pipeline
pub fn job_steps(
    settings: &ScaffoldSettings,
    setup: &SetupSpec,
    target: &RunTarget<'_>,
    dispatch_keys: &[String],
    overrides: &IndexMap<String, Value>,
) -> Vec<Step> {
    let mut steps = vec![Step::uses("Checkout code", &settings.checkout_action)];
    steps.extend(settings.bootstrap_steps.iter().map(bootstrap_step));
    steps.extend(setup_steps(setup));
    steps.push(run_step(settings, target, dispatch_keys, overrides));
    steps
}

fn bootstrap_step(step: &BootstrapStep) -> Step {
    Step {
        name: step.name.clone(),
        uses: step.uses.clone(),
        run: step.run.clone(),
        with: step.with.clone(),
        ..Step::default()
    }
}

/// Setup actions, then caches, then setup commands
pub fn setup_steps(setup: &SetupSpec) -> Vec<Step> {
    let actions = setup
        .actions
        .iter()
        .map(|action| Step::uses(&action.name, &action.uses).with_params(action.with.clone()));

    let caches = setup.caches.iter().map(|cache| {
        let mut params = IndexMap::new();
        params.insert("path".to_string(), Value::from(cache.path.clone()));
        params.insert("key".to_string(), Value::from(cache.key.clone()));
        if !cache.restore_keys.is_empty() {
            params.insert(
                "restore-keys".to_string(),
                Value::from(cache.restore_keys.join("\n")),
            );
        }
        Step::uses(&cache.name, CACHE_ACTION).with_params(params)
    });

    let commands = setup
        .steps
        .iter()
        .map(|step| Step::run(&step.name, &step.run));

    actions.chain(caches).chain(commands).collect()
}

/// The step that runs the pipeline itself
pub fn run_step(
    settings: &ScaffoldSettings,
    target: &RunTarget<'_>,
    dispatch_keys: &[String],
    overrides: &IndexMap<String, Value>,
) -> Step {
    let mut env = input_bindings(target.inputs, dispatch_keys, overrides);
    for (key, value) in target.env {
        env.entry(key.clone()).or_insert_with(|| value.clone());
    }

    Step::run(
        format!("Run {}", target.name),
        format!(
            "{} run {}::{}",
            settings.run_command.trim_end(),
            target.module,
            target.name
        ),
    )
    .with_id(PIPELINE_STEP_ID)
    .with_env(env)
}

/// `INPUT_*` variables for every declared input
///
/// A value fixed by the job wins. Otherwise a key offered as a
/// `workflow_dispatch` input reads the dispatch value and any other key
/// gets its declared default.
pub fn input_bindings(
    inputs: &InputMap,
    dispatch_keys: &[String],
    overrides: &IndexMap<String, Value>,
) -> EnvMap {
    let mut env = EnvMap::new();

    for (key, spec) in inputs {
        let value = match overrides.get(key) {
            Some(value) => value_text(value),
            None if dispatch_keys.iter().any(|k| k == key) => {
                dispatch_expression(key, &spec.default_text())
            }
            None => spec.default_text(),
        };
        env.insert(input_env_var(key), value);
    }

    for (key, value) in overrides {
        env.entry(input_env_var(key))
            .or_insert_with(|| value_text(value));
    }

    env
}

/// `${{ inputs.key }}`, falling back to the default when there is one
fn dispatch_expression(key: &str, default: &str) -> String {
    if default.is_empty() {
        format!("${{{{ inputs.{} }}}}", key)
    } else {
        format!(
            "${{{{ inputs.{} || '{}' }}}}",
            key,
            default.replace('\'', "''")
        )
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
