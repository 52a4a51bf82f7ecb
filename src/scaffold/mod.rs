// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipescaffold contributors

//! Workflow scaffolding
//!
//! Generates a GitHub Actions workflow for a registered pipeline:
//!
//! 1. discover the pipeline in the registry
//! 2. analyze it into a descriptor
//! 3. merge a sidecar file and a `--trigger` override into the descriptor
//! 4. synthesize the steps and assemble the jobs
//! 5. refuse to overwrite an existing file unless updating
//! 6. write the YAML atomically

mod document;
mod naming;
mod overrides;
mod project;
mod steps;

pub use document::{Job, Step, WorkflowDocument};
pub use naming::{file_stem, job_id, workflow_title};
pub use overrides::{apply_overrides, find_sidecar, load_sidecar, parse_trigger_override};
pub use project::{
    detect_project_root, BootstrapStep, DiscoverySettings, ProjectConfig, ScaffoldSettings,
    CONFIG_FILE_NAMES,
};
pub use steps::{input_bindings, CACHE_ACTION, PIPELINE_STEP_ID};

use indexmap::IndexMap;
use std::path::{Path, PathBuf};

use crate::builder::{Branches, TriggerBuilder};
use crate::errors::{ScaffoldError, ScaffoldResult};
use crate::pipeline::{
    analyze, JobGraph, PipelineDescriptor, PipelineEntry, PipelineRegistry, SearchScope,
    TriggerMap,
};
use steps::RunTarget;

/// Options of one generation run
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Pipeline name, exact or loose (`flutter-build`)
    pub pipeline: String,

    /// Output file; defaults to `<workflows_dir>/<stem>.yml`
    pub output: Option<PathBuf>,

    /// Sidecar file overriding descriptor keys
    pub config: Option<PathBuf>,

    /// Replace an existing workflow file
    pub update: bool,

    /// JSON object replacing the triggers
    pub trigger: Option<String>,
}

impl GenerateOptions {
    pub fn new(pipeline: impl Into<String>) -> Self {
        Self {
            pipeline: pipeline.into(),
            ..Self::default()
        }
    }
}

/// Generates workflow files for the pipelines of one registry
pub struct ScaffoldGenerator<'r> {
    registry: &'r PipelineRegistry,
    project_root: PathBuf,
    config: ProjectConfig,
}

impl<'r> ScaffoldGenerator<'r> {
    /// Generator for a project, reading its project config
    pub fn new(registry: &'r PipelineRegistry, project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let config = ProjectConfig::load_from_project(&project_root);
        Self::with_config(registry, project_root, config)
    }

    /// Generator with an explicit project config
    pub fn with_config(
        registry: &'r PipelineRegistry,
        project_root: impl Into<PathBuf>,
        config: ProjectConfig,
    ) -> Self {
        Self {
            registry,
            project_root: project_root.into(),
            config,
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Scope discovery searches in
    pub fn scope(&self) -> SearchScope {
        self.config.search_scope()
    }

    /// Find a pipeline by exact or loose name
    pub fn discover(&self, name: &str) -> ScaffoldResult<&'r PipelineEntry> {
        let entry = self.registry.resolve(name, &self.scope())?;
        tracing::debug!(name = entry.name(), module = entry.module(), "discovered pipeline");
        Ok(entry)
    }

    /// Descriptor of a pipeline as declared in code
    pub fn describe(&self, name: &str) -> ScaffoldResult<PipelineDescriptor> {
        let entry = self.discover(name)?;
        Ok(analyze(entry, self.config.scaffold.module_prefix.as_deref()))
    }

    /// Descriptor after the sidecar file and the trigger override are applied
    ///
    /// A sidecar that cannot be read or merged is reported and skipped. An
    /// invalid trigger override is an error.
    pub fn effective_descriptor(
        &self,
        options: &GenerateOptions,
    ) -> ScaffoldResult<PipelineDescriptor> {
        let mut descriptor = self.describe(&options.pipeline)?;

        if let Some(path) = self.sidecar_path(&descriptor, options) {
            match load_sidecar(&path).and_then(|o| apply_overrides(&descriptor.config, &o, &path)) {
                Ok(config) => {
                    tracing::debug!(path = %path.display(), "applied sidecar overrides");
                    descriptor.config = config;
                }
                Err(e) if e.is_recoverable() => {
                    tracing::warn!("{}; ignoring overrides", e);
                }
                Err(e) => return Err(e),
            }
        }

        if let Some(json) = &options.trigger {
            descriptor.config.triggers = parse_trigger_override(json)?;
        }

        Ok(descriptor)
    }

    fn sidecar_path(
        &self,
        descriptor: &PipelineDescriptor,
        options: &GenerateOptions,
    ) -> Option<PathBuf> {
        match &options.config {
            Some(path) => {
                let path = self.project_root.join(path);
                if path.is_file() {
                    Some(path)
                } else {
                    tracing::warn!(path = %path.display(), "config file not found; ignoring");
                    None
                }
            }
            None => find_sidecar(
                &self.project_root.join(&self.config.scaffold.sidecar_dir),
                &file_stem(&descriptor.name),
            ),
        }
    }

    /// Build the workflow document without writing it
    pub fn render(&self, options: &GenerateOptions) -> ScaffoldResult<WorkflowDocument> {
        let descriptor = self.effective_descriptor(options)?;
        self.assemble(&descriptor)
    }

    /// Workflow document of a descriptor
    pub fn assemble(&self, descriptor: &PipelineDescriptor) -> ScaffoldResult<WorkflowDocument> {
        let triggers = effective_triggers(descriptor);
        let dispatch_keys = dispatch_keys(&triggers);

        let jobs = if descriptor.config.jobs.is_empty() {
            let mut jobs = IndexMap::new();
            jobs.insert(
                job_id(&descriptor.name),
                self.single_job(descriptor, &dispatch_keys),
            );
            jobs
        } else {
            self.composite_jobs(descriptor, &dispatch_keys)?
        };

        Ok(WorkflowDocument {
            name: workflow_title(&descriptor.name),
            on: triggers,
            jobs,
        })
    }

    fn single_job(&self, descriptor: &PipelineDescriptor, dispatch_keys: &[String]) -> Job {
        let target = RunTarget {
            name: &descriptor.name,
            module: &descriptor.module,
            inputs: &descriptor.config.inputs,
            env: &descriptor.config.env,
        };

        Job {
            runs_on: descriptor.runs_on().to_string(),
            needs: descriptor.config.dependencies.clone(),
            condition: None,
            steps: steps::job_steps(
                &self.config.scaffold,
                &descriptor.config.setup,
                &target,
                dispatch_keys,
                &IndexMap::new(),
            ),
        }
    }

    /// One job per declared job, each running its own pipeline
    fn composite_jobs(
        &self,
        descriptor: &PipelineDescriptor,
        dispatch_keys: &[String],
    ) -> ScaffoldResult<IndexMap<String, Job>> {
        JobGraph::build(&descriptor.config.jobs)?;

        let mut jobs = IndexMap::new();
        for (name, spec) in &descriptor.config.jobs {
            let entry = self.registry.resolve(&spec.pipeline, &SearchScope::all())?;
            let inner = analyze(entry, self.config.scaffold.module_prefix.as_deref());

            let mut env = descriptor.config.env.clone();
            for (key, value) in &inner.config.env {
                env.insert(key.clone(), value.clone());
            }

            let target = RunTarget {
                name: &inner.name,
                module: &inner.module,
                inputs: &inner.config.inputs,
                env: &env,
            };

            let job = Job {
                runs_on: spec
                    .runs_on
                    .clone()
                    .unwrap_or_else(|| inner.runs_on().to_string()),
                needs: spec.needs.clone(),
                condition: spec.condition.clone(),
                steps: steps::job_steps(
                    &self.config.scaffold,
                    &inner.config.setup,
                    &target,
                    dispatch_keys,
                    &spec.inputs,
                ),
            };
            jobs.insert(name.clone(), job);
        }

        Ok(jobs)
    }

    /// Where a descriptor's workflow is written
    pub fn output_path(&self, descriptor: &PipelineDescriptor, options: &GenerateOptions) -> PathBuf {
        match &options.output {
            Some(path) => self.project_root.join(path),
            None => self
                .project_root
                .join(&self.config.scaffold.workflows_dir)
                .join(format!("{}.yml", file_stem(&descriptor.name))),
        }
    }

    /// Generate and write a workflow file, returning its path
    pub fn generate(&self, options: &GenerateOptions) -> ScaffoldResult<PathBuf> {
        let descriptor = self.effective_descriptor(options)?;
        let document = self.assemble(&descriptor)?;
        let yaml = document.to_yaml()?;

        let path = self.output_path(&descriptor, options);
        if path.exists() && !options.update {
            return Err(ScaffoldError::Exists { path });
        }

        write_atomically(&path, &yaml)?;
        tracing::info!(pipeline = %descriptor.name, path = %path.display(), "wrote workflow");
        Ok(path)
    }
}

/// Declared triggers, or push and pull request on the main branches
///
/// Default triggers also offer manual dispatch with the declared inputs.
fn effective_triggers(descriptor: &PipelineDescriptor) -> TriggerMap {
    if !descriptor.config.triggers.is_empty() {
        return descriptor.config.triggers.clone();
    }

    let mut triggers = TriggerBuilder::new()
        .on_push(Branches::default())
        .on_pull_request(Branches::default());
    if !descriptor.config.inputs.is_empty() {
        triggers = triggers.on_workflow_dispatch(descriptor.config.inputs.clone());
    }
    triggers.build()
}

fn dispatch_keys(triggers: &TriggerMap) -> Vec<String> {
    crate::pipeline::DescriptorConfig {
        triggers: triggers.clone(),
        ..Default::default()
    }
    .dispatch_input_keys()
}

/// Write through a sibling temp file so a failed write leaves nothing behind
fn write_atomically(path: &Path, content: &str) -> ScaffoldResult<()> {
    let write_error = |e: std::io::Error| ScaffoldError::FileWriteError {
        path: path.to_path_buf(),
        error: e.to_string(),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_error)?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workflow.yml".to_string());
    let temp = path.with_file_name(format!(".{}.tmp", file_name));

    std::fs::write(&temp, content).map_err(write_error)?;
    if let Err(e) = std::fs::rename(&temp, path) {
        let _ = std::fs::remove_file(&temp);
        return Err(write_error(e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::WorkflowConfig;
    use crate::pipeline::{JobSpec, Pipeline, PipelineContext, PipelineResult};
    use async_trait::async_trait;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Build;

    #[derive(Default)]
    struct Release;

    #[derive(Default)]
    struct Ci;

    #[async_trait]
    impl Pipeline for Build {
        async fn execute(&self, _ctx: &PipelineContext) -> Result<PipelineResult, ScaffoldError> {
            Ok(PipelineResult::success("built"))
        }

        fn workflow_config() -> WorkflowConfig {
            WorkflowConfig::new()
                .add_input("build-command", "Build command", false, Some("cargo build".into()))
                .cache_cargo("**/Cargo.lock")
        }
    }

    #[async_trait]
    impl Pipeline for Release {
        async fn execute(&self, _ctx: &PipelineContext) -> Result<PipelineResult, ScaffoldError> {
            Ok(PipelineResult::success("released"))
        }

        fn workflow_config() -> WorkflowConfig {
            WorkflowConfig::new()
                .add_input("version", "Version to release", true, None)
                .depends_on(["Build"])
        }
    }

    #[async_trait]
    impl Pipeline for Ci {
        async fn execute(&self, _ctx: &PipelineContext) -> Result<PipelineResult, ScaffoldError> {
            Ok(PipelineResult::success("ci"))
        }

        fn workflow_config() -> WorkflowConfig {
            WorkflowConfig::new()
                .on_push("main")
                .add_job("build", JobSpec::new("BuildPipeline"))
                .add_job(
                    "release",
                    JobSpec::new("ReleasePipeline")
                        .input("version", "0.1.0")
                        .needs(["build"])
                        .condition("github.ref == 'refs/heads/main'"),
                )
        }
    }

    fn registry() -> PipelineRegistry {
        let mut registry = PipelineRegistry::new();
        registry
            .register::<Build>("BuildPipeline", "app::pipelines::build")
            .unwrap();
        registry
            .register::<Release>("ReleasePipeline", "app::pipelines::release")
            .unwrap();
        registry.register::<Ci>("CiPipeline", "app::pipelines::ci").unwrap();
        registry
    }

    fn generator<'r>(registry: &'r PipelineRegistry, dir: &TempDir) -> ScaffoldGenerator<'r> {
        ScaffoldGenerator::with_config(registry, dir.path(), ProjectConfig::default())
    }

    #[test]
    fn test_release_scenario() {
        let registry = registry();
        let dir = TempDir::new().unwrap();
        let generator = generator(&registry, &dir);

        let document = generator.render(&GenerateOptions::new("ReleasePipeline")).unwrap();
        assert_eq!(document.name, "Release");
        assert_eq!(
            document.on.keys().collect::<Vec<_>>(),
            vec!["push", "pull_request", "workflow_dispatch"]
        );

        assert_eq!(document.jobs.len(), 1);
        let job = &document.jobs["release"];
        assert_eq!(job.needs, vec!["Build"]);
        assert_eq!(job.runs_on, "ubuntu-latest");

        let run = job.steps.last().unwrap();
        assert_eq!(run.id.as_deref(), Some(PIPELINE_STEP_ID));
        assert_eq!(run.env["INPUT_VERSION"], "${{ inputs.version }}");
        assert_eq!(
            run.run.as_deref(),
            Some("cargo run --quiet -- run release::ReleasePipeline")
        );
    }

    #[test]
    fn test_generate_writes_file_with_bare_on_key() {
        let registry = registry();
        let dir = TempDir::new().unwrap();
        let generator = generator(&registry, &dir);

        let path = generator.generate(&GenerateOptions::new("BuildPipeline")).unwrap();
        assert_eq!(path, dir.path().join(".github/workflows/build.yml"));

        let yaml = std::fs::read_to_string(&path).unwrap();
        assert!(yaml.lines().any(|l| l == "on:"));
        assert!(yaml.contains("actions/cache@v4"));
        assert!(!dir.path().join(".github/workflows/.build.yml.tmp").exists());
    }

    #[test]
    fn test_existing_file_is_left_untouched() {
        let registry = registry();
        let dir = TempDir::new().unwrap();
        let generator = generator(&registry, &dir);
        let path = dir.path().join(".github/workflows/build.yml");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "hand written\n").unwrap();

        let err = generator
            .generate(&GenerateOptions::new("BuildPipeline"))
            .unwrap_err();
        assert!(matches!(err, ScaffoldError::Exists { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hand written\n");
    }

    #[test]
    fn test_regeneration_is_byte_identical() {
        let registry = registry();
        let dir = TempDir::new().unwrap();
        let generator = generator(&registry, &dir);

        let path = generator.generate(&GenerateOptions::new("ReleasePipeline")).unwrap();
        let first = std::fs::read(&path).unwrap();

        let options = GenerateOptions {
            update: true,
            ..GenerateOptions::new("ReleasePipeline")
        };
        generator.generate(&options).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), first);
    }

    #[test]
    fn test_sidecar_replaces_triggers() {
        let registry = registry();
        let dir = TempDir::new().unwrap();
        let sidecars = dir.path().join(".github/pipelines");
        std::fs::create_dir_all(&sidecars).unwrap();
        std::fs::write(
            sidecars.join("release.yml"),
            "triggers:\n  release:\n    types: [published]\n",
        )
        .unwrap();

        let generator = generator(&registry, &dir);
        let document = generator.render(&GenerateOptions::new("ReleasePipeline")).unwrap();
        assert_eq!(document.on.keys().collect::<Vec<_>>(), vec!["release"]);

        // without a dispatch input the literal default is bound
        let run = document.jobs["release"].steps.last().unwrap();
        assert_eq!(run.env["INPUT_VERSION"], "");
    }

    #[test]
    fn test_sidecar_input_keys_bind_to_dispatch_inputs() {
        let registry = registry();
        let dir = TempDir::new().unwrap();
        let sidecars = dir.path().join(".github/pipelines");
        std::fs::create_dir_all(&sidecars).unwrap();
        std::fs::write(
            sidecars.join("release.yml"),
            "inputs:\n  Artifact_Path:\n    description: Where artifacts go\n",
        )
        .unwrap();

        let generator = generator(&registry, &dir);
        let descriptor = generator
            .effective_descriptor(&GenerateOptions::new("ReleasePipeline"))
            .unwrap();
        assert_eq!(
            descriptor.config.inputs.keys().collect::<Vec<_>>(),
            vec!["artifact-path"]
        );

        let document = generator.assemble(&descriptor).unwrap();
        assert!(document.on["workflow_dispatch"]["inputs"]
            .get("artifact-path")
            .is_some());
        let run = document.jobs["release"].steps.last().unwrap();
        assert_eq!(run.env["INPUT_ARTIFACT_PATH"], "${{ inputs.artifact-path }}");
    }

    #[test]
    fn test_malformed_sidecar_is_ignored() {
        let registry = registry();
        let dir = TempDir::new().unwrap();
        let sidecar = dir.path().join("release-overrides.yml");
        std::fs::write(&sidecar, "triggers: [oops").unwrap();

        let generator = generator(&registry, &dir);
        let options = GenerateOptions {
            config: Some(sidecar),
            ..GenerateOptions::new("ReleasePipeline")
        };
        let document = generator.render(&options).unwrap();
        assert!(document.on.contains_key("push"));
    }

    #[test]
    fn test_trigger_override() {
        let registry = registry();
        let dir = TempDir::new().unwrap();
        let generator = generator(&registry, &dir);

        let options = GenerateOptions {
            trigger: Some(r#"{"schedule": [{"cron": "0 4 * * 1"}]}"#.into()),
            ..GenerateOptions::new("BuildPipeline")
        };
        let document = generator.render(&options).unwrap();
        assert_eq!(document.on.keys().collect::<Vec<_>>(), vec!["schedule"]);

        let options = GenerateOptions {
            trigger: Some("nope".into()),
            ..GenerateOptions::new("BuildPipeline")
        };
        assert!(matches!(
            generator.render(&options),
            Err(ScaffoldError::InvalidTrigger { .. })
        ));
    }

    #[test]
    fn test_loose_name_and_custom_output() {
        let registry = registry();
        let dir = TempDir::new().unwrap();
        let generator = generator(&registry, &dir);

        let options = GenerateOptions {
            output: Some("ci/release.yaml".into()),
            ..GenerateOptions::new("release")
        };
        let path = generator.generate(&options).unwrap();
        assert_eq!(path, dir.path().join("ci/release.yaml"));
    }

    #[test]
    fn test_unknown_pipeline() {
        let registry = registry();
        let dir = TempDir::new().unwrap();
        let err = generator(&registry, &dir)
            .generate(&GenerateOptions::new("Deploy"))
            .unwrap_err();
        assert!(matches!(err, ScaffoldError::Discovery { .. }));
        assert!(!dir.path().join(".github").exists());
    }

    #[test]
    fn test_composite_jobs() {
        let registry = registry();
        let dir = TempDir::new().unwrap();
        let document = generator(&registry, &dir)
            .render(&GenerateOptions::new("CiPipeline"))
            .unwrap();

        assert_eq!(document.jobs.keys().collect::<Vec<_>>(), vec!["build", "release"]);
        let release = &document.jobs["release"];
        assert_eq!(release.needs, vec!["build"]);
        assert!(release.condition.is_some());

        let run = release.steps.last().unwrap();
        assert_eq!(run.env["INPUT_VERSION"], "0.1.0");
        assert!(run.run.as_deref().unwrap().ends_with("release::ReleasePipeline"));

        let build_run = document.jobs["build"].steps.last().unwrap();
        assert_eq!(build_run.env["INPUT_BUILD_COMMAND"], "cargo build");
    }

    #[test]
    fn test_project_config_is_honored() {
        let registry = registry();
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("pipescaffold.yaml"),
            "scaffold:\n  workflows_dir: ci\n  run_command: ./target/release/app\n",
        )
        .unwrap();

        let generator = ScaffoldGenerator::new(&registry, dir.path());
        let path = generator.generate(&GenerateOptions::new("BuildPipeline")).unwrap();
        assert_eq!(path, dir.path().join("ci/build.yml"));

        let yaml = std::fs::read_to_string(path).unwrap();
        assert!(yaml.contains("./target/release/app run build::BuildPipeline"));
    }
}
