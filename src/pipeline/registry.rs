// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipescaffold contributors

//! Pipeline registry
//!
//! Maps pipeline names to a factory, the pipeline's static accessors and
//! the module it was registered from. A registry is an ordinary value: each
//! generation run (and each test) owns its own.

use indexmap::IndexMap;

use super::contract::Pipeline;
use super::descriptor::{
    EnvMap, InputMap, JobMap, SetupSpec, TriggerMap, DEFAULT_RUNS_ON, DEFAULT_RUNTIME_VERSION,
};
use super::inputs::is_canonical_key;
use crate::errors::{ScaffoldError, ScaffoldResult};

/// Where a registered pipeline came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineMetadata {
    pub name: String,
    /// Module path given at registration, usually `module_path!()`
    pub module: String,
}

/// Everything the static accessors of a pipeline type report
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineAccessors {
    pub description: Option<String>,
    pub inputs: InputMap,
    pub setup: SetupSpec,
    pub triggers: TriggerMap,
    pub env: EnvMap,
    pub runs_on: String,
    pub runtime_version: String,
    pub dependencies: Vec<String>,
    pub jobs: JobMap,
}

impl PipelineAccessors {
    /// Query every accessor of `P`
    pub fn of<P: Pipeline>() -> Self {
        Self {
            description: P::description(),
            inputs: P::workflow_inputs(),
            setup: P::workflow_setup(),
            triggers: P::workflow_triggers(),
            env: P::workflow_env(),
            runs_on: P::workflow_runs_on(),
            runtime_version: P::workflow_runtime_version(),
            dependencies: P::workflow_dependencies(),
            jobs: P::workflow_jobs(),
        }
    }
}

impl Default for PipelineAccessors {
    fn default() -> Self {
        Self {
            description: None,
            inputs: InputMap::new(),
            setup: SetupSpec::default(),
            triggers: TriggerMap::new(),
            env: EnvMap::new(),
            runs_on: DEFAULT_RUNS_ON.to_string(),
            runtime_version: DEFAULT_RUNTIME_VERSION.to_string(),
            dependencies: Vec::new(),
            jobs: JobMap::new(),
        }
    }
}

/// A registered pipeline
#[derive(Clone)]
pub struct PipelineEntry {
    pub metadata: PipelineMetadata,
    factory: fn() -> Box<dyn Pipeline>,
    accessors: fn() -> PipelineAccessors,
}

impl PipelineEntry {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn module(&self) -> &str {
        &self.metadata.module
    }

    /// Construct a fresh pipeline instance
    pub fn instantiate(&self) -> Box<dyn Pipeline> {
        (self.factory)()
    }

    /// Query the pipeline's static accessors
    pub fn accessors(&self) -> PipelineAccessors {
        (self.accessors)()
    }
}

impl std::fmt::Debug for PipelineEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineEntry")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

fn construct<P: Pipeline + Default + 'static>() -> Box<dyn Pipeline> {
    Box::new(P::default())
}

/// Which registered pipelines discovery may return
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchScope {
    /// Module prefixes to search; empty means every module
    pub prefixes: Vec<String>,

    /// Whether pipelines living in a `test`/`tests` module are visible
    pub include_test: bool,
}

impl SearchScope {
    pub fn all() -> Self {
        Self {
            prefixes: Vec::new(),
            include_test: true,
        }
    }

    pub fn contains(&self, metadata: &PipelineMetadata) -> bool {
        let in_prefix = self.prefixes.is_empty()
            || self
                .prefixes
                .iter()
                .any(|p| metadata.module.starts_with(p.as_str()));
        let is_test = metadata
            .module
            .split("::")
            .any(|segment| segment == "test" || segment == "tests");

        in_prefix && (self.include_test || !is_test)
    }
}

/// Lookup table from pipeline name to implementation
#[derive(Debug, Default)]
pub struct PipelineRegistry {
    entries: IndexMap<String, PipelineEntry>,
}

impl PipelineRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register pipeline type `P` under `name`
    ///
    /// Registering a name again replaces the earlier entry.
    pub fn register<P: Pipeline + Default + 'static>(
        &mut self,
        name: &str,
        module: &str,
    ) -> ScaffoldResult<()> {
        validate_name(name)?;
        if module.trim().is_empty() {
            return Err(ScaffoldError::registration(name, "module reference is empty"));
        }

        let accessors = PipelineAccessors::of::<P>();
        validate_accessors(name, &accessors)?;

        let entry = PipelineEntry {
            metadata: PipelineMetadata {
                name: name.to_string(),
                module: module.to_string(),
            },
            factory: construct::<P>,
            accessors: PipelineAccessors::of::<P>,
        };

        if let Some(previous) = self.entries.insert(name.to_string(), entry) {
            tracing::debug!(
                name,
                previous = %previous.metadata.module,
                module,
                "replacing registered pipeline"
            );
        } else {
            tracing::debug!(name, module, "registered pipeline");
        }

        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&PipelineEntry> {
        self.entries.get(name)
    }

    pub fn metadata(&self, name: &str) -> Option<&PipelineMetadata> {
        self.entries.get(name).map(|e| &e.metadata)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Registered entries, in registration order
    pub fn entries(&self) -> impl Iterator<Item = &PipelineEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries inside a search scope
    pub fn visible<'a, 's>(
        &'a self,
        scope: &'s SearchScope,
    ) -> impl Iterator<Item = &'a PipelineEntry> + 's
    where
        'a: 's,
    {
        self.entries.values().filter(move |e| scope.contains(&e.metadata))
    }

    /// Resolve a user-supplied name to a registered pipeline
    ///
    /// An exact name wins. Otherwise names are compared ignoring case,
    /// separators and a trailing `Pipeline`, so `flutter-build` finds
    /// `FlutterBuildPipeline`. Two loose matches are an error rather than
    /// a guess.
    pub fn resolve(&self, name: &str, scope: &SearchScope) -> ScaffoldResult<&PipelineEntry> {
        if let Some(entry) = self.visible(scope).find(|e| e.name() == name) {
            return Ok(entry);
        }

        let wanted = loose_name(name);
        let matches: Vec<&PipelineEntry> = self
            .visible(scope)
            .filter(|e| loose_name(e.name()) == wanted)
            .collect();

        match matches.as_slice() {
            [entry] => {
                tracing::debug!(requested = name, resolved = entry.name(), "resolved pipeline");
                Ok(*entry)
            }
            [] => Err(ScaffoldError::not_found(
                name,
                self.visible(scope).map(PipelineEntry::name),
            )),
            many => Err(ScaffoldError::AmbiguousPipeline {
                name: name.to_string(),
                candidates: many
                    .iter()
                    .map(|e| format!("{} ({})", e.name(), e.module()))
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }
}

/// Lower-cased name without separators or a trailing `pipeline`
fn loose_name(name: &str) -> String {
    let squashed: String = name
        .chars()
        .filter(|c| !matches!(c, '-' | '_' | ' ' | '.'))
        .collect::<String>()
        .to_lowercase();
    match squashed.strip_suffix("pipeline") {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => squashed,
    }
}

fn validate_name(name: &str) -> ScaffoldResult<()> {
    let mut chars = name.chars();
    let starts_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    if !starts_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ScaffoldError::registration(
            name,
            "name must start with a letter and contain only letters, digits and '_'",
        ));
    }
    Ok(())
}

fn validate_accessors(name: &str, accessors: &PipelineAccessors) -> ScaffoldResult<()> {
    if let Some(key) = accessors.inputs.keys().find(|k| !is_canonical_key(k)) {
        return Err(ScaffoldError::registration(
            name,
            format!("input '{}' is not kebab-case", key),
        ));
    }

    for (job, spec) in &accessors.jobs {
        if spec.pipeline.trim().is_empty() {
            return Err(ScaffoldError::registration(
                name,
                format!("job '{}' does not name a pipeline", job),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::WorkflowConfig;
    use crate::pipeline::{InputSpec, PipelineContext, PipelineResult};
    use async_trait::async_trait;

    #[derive(Default)]
    struct First;

    #[derive(Default)]
    struct Second;

    #[derive(Default)]
    struct BadInputs;

    #[async_trait]
    impl Pipeline for First {
        async fn execute(&self, _ctx: &PipelineContext) -> Result<PipelineResult, ScaffoldError> {
            Ok(PipelineResult::success("first"))
        }
    }

    #[async_trait]
    impl Pipeline for Second {
        async fn execute(&self, _ctx: &PipelineContext) -> Result<PipelineResult, ScaffoldError> {
            Ok(PipelineResult::success("second"))
        }

        fn workflow_config() -> WorkflowConfig {
            WorkflowConfig::new().set_runs_on("macos-latest")
        }
    }

    #[async_trait]
    impl Pipeline for BadInputs {
        async fn execute(&self, _ctx: &PipelineContext) -> Result<PipelineResult, ScaffoldError> {
            Ok(PipelineResult::success("bad"))
        }

        fn workflow_inputs() -> InputMap {
            let mut inputs = InputMap::new();
            inputs.insert("Build_Command".into(), InputSpec::new("x", false, None));
            inputs
        }
    }

    #[tokio::test]
    async fn test_reregistration_overwrites() {
        let mut registry = PipelineRegistry::new();
        registry.register::<First>("X", "app::first").unwrap();
        registry.register::<Second>("X", "app::second").unwrap();

        assert_eq!(registry.len(), 1);
        let entry = registry.get("X").unwrap();
        assert_eq!(entry.module(), "app::second");
        assert_eq!(entry.accessors().runs_on, "macos-latest");

        let ctx = PipelineContext::new(Default::default(), ".");
        let result = entry.instantiate().execute(&ctx).await.unwrap();
        assert_eq!(result.message, "second");
    }

    #[test]
    fn test_metadata_and_listing() {
        let mut registry = PipelineRegistry::new();
        registry.register::<First>("BuildPipeline", "app::pipelines::build").unwrap();
        registry.register::<Second>("ReleasePipeline", "app::pipelines::release").unwrap();

        assert_eq!(registry.names(), vec!["BuildPipeline", "ReleasePipeline"]);
        assert_eq!(
            registry.metadata("ReleasePipeline").unwrap().module,
            "app::pipelines::release"
        );
        assert!(registry.get("Missing").is_none());
        assert_eq!(registry.entries().count(), 2);
    }

    #[test]
    fn test_clear() {
        let mut registry = PipelineRegistry::new();
        registry.register::<First>("A", "app").unwrap();
        registry.clear();
        assert!(registry.is_empty());
        assert!(!registry.contains("A"));
    }

    #[test]
    fn test_registration_rejects_bad_names() {
        let mut registry = PipelineRegistry::new();
        assert!(matches!(
            registry.register::<First>("", "app"),
            Err(ScaffoldError::Registration { .. })
        ));
        assert!(registry.register::<First>("my-pipeline", "app").is_err());
        assert!(registry.register::<First>("1st", "app").is_err());
        assert!(registry.register::<First>("Ok", " ").is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_registration_rejects_non_canonical_inputs() {
        let mut registry = PipelineRegistry::new();
        let err = registry
            .register::<BadInputs>("BadInputs", "app")
            .unwrap_err();
        assert!(err.to_string().contains("Build_Command"));
    }

    #[test]
    fn test_resolve_exact_and_loose() {
        let mut registry = PipelineRegistry::new();
        registry.register::<First>("FlutterBuildPipeline", "app::build").unwrap();

        let scope = SearchScope::all();
        assert_eq!(
            registry.resolve("FlutterBuildPipeline", &scope).unwrap().name(),
            "FlutterBuildPipeline"
        );
        assert_eq!(
            registry.resolve("flutter-build", &scope).unwrap().name(),
            "FlutterBuildPipeline"
        );
    }

    #[test]
    fn test_resolve_missing() {
        let mut registry = PipelineRegistry::new();
        registry.register::<First>("BuildPipeline", "app").unwrap();
        let err = registry.resolve("Deploy", &SearchScope::all()).unwrap_err();
        assert!(matches!(err, ScaffoldError::Discovery { ref available, .. } if available == "BuildPipeline"));
    }

    #[test]
    fn test_resolve_ambiguous_is_an_error() {
        let mut registry = PipelineRegistry::new();
        registry.register::<First>("Build", "app::a").unwrap();
        registry.register::<Second>("BuildPipeline", "app::b").unwrap();

        let err = registry.resolve("build_pipeline", &SearchScope::all()).unwrap_err();
        assert!(matches!(err, ScaffoldError::AmbiguousPipeline { .. }));

        // an exact name is never ambiguous
        assert_eq!(
            registry.resolve("Build", &SearchScope::all()).unwrap().module(),
            "app::a"
        );
    }

    #[test]
    fn test_scope_hides_test_pipelines() {
        let mut registry = PipelineRegistry::new();
        registry
            .register::<First>("ReleasePipeline", "app::pipelines::test::release")
            .unwrap();

        let scope = SearchScope::default();
        assert!(registry.resolve("ReleasePipeline", &scope).is_err());

        let scope = SearchScope {
            include_test: true,
            ..SearchScope::default()
        };
        assert!(registry.resolve("ReleasePipeline", &scope).is_ok());
    }

    #[test]
    fn test_scope_prefixes() {
        let metadata = PipelineMetadata {
            name: "A".into(),
            module: "app::pipelines::build".into(),
        };
        let scope = SearchScope {
            prefixes: vec!["app::pipelines".into()],
            include_test: false,
        };
        assert!(scope.contains(&metadata));

        let scope = SearchScope {
            prefixes: vec!["other".into()],
            include_test: false,
        };
        assert!(!scope.contains(&metadata));
    }

    #[test]
    fn test_loose_name() {
        assert_eq!(loose_name("FlutterBuildPipeline"), "flutterbuild");
        assert_eq!(loose_name("flutter-build"), "flutterbuild");
        assert_eq!(loose_name("Pipeline"), "pipeline");
    }
}
