//! # Layerkit Compiler
//!
//! Generates the full CRUD artifact set of a schema-defined collection inside
//! a layered Nuxt application, and keeps the project's shared registries in
//! step with what was generated.
//!
//! ## Architecture
//!
//! ```text
//! (layer, collection) + fields file
//!        │
//!        ▼
//! ┌──────────────┐
//! │    Naming    │  Every case/number variant, derived once
//! └──────┬───────┘
//!        ▼
//! ┌──────────────┐
//! │    Schema    │  Typed fields + injected id/scope/audit/tree fields
//! └──────┬───────┘
//!        ▼
//! ┌──────────────┐
//! │   Codegen    │  Vue surfaces, handlers, Drizzle schema, queries, types
//! └──────┬───────┘
//!        ▼
//! ┌──────────────┐
//! │ Orchestrator │  Plan → write (skip existing) → registry upsert
//! └──────┬───────┘
//!        ▼
//! ┌──────────────┐
//! │   Registry   │  nuxt.config.ts extends, schema index, app.config.ts
//! └──────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use layerkit_compiler::{FieldsSource, Generator, GeneratorConfig, Target};
//!
//! let mut generator = Generator::new(GeneratorConfig::with_root("."));
//! let target = Target::new("blog", "posts", FieldsSource::File("schemas/posts.json".into()));
//! let report = generator.generate(&[target]).into_result()?;
//! ```

pub mod codegen;
pub mod config;
pub mod diagnostic;
pub mod layout;
pub mod naming;
pub mod orchestrator;
pub mod packages;
pub mod registry;
pub mod rollback;
pub mod schema;
pub mod types;

use std::path::Path;

pub use config::{CollectionOptions, Dialect, GenerationFlags, GeneratorConfig, ProjectConfig};
pub use diagnostic::{GeneratorError, Warning};
pub use orchestrator::{FieldsSource, Orchestrator, Plan, RunReport, State, Target, TargetReport};
pub use rollback::RollbackReport;

/// Entry point tying configuration to the orchestrator and rollback engine.
pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Plans a target without writing anything.
    pub fn plan(&self, target: &Target) -> Result<Plan, GeneratorError> {
        orchestrator::plan(target, &self.config)
    }

    /// Generates the given targets in order.
    pub fn generate(&mut self, targets: &[Target]) -> RunReport {
        Orchestrator::new(self.config.clone()).run(targets)
    }

    /// Generates every target of a configuration file.
    ///
    /// Ownership, registry locations and packages from the file replace the
    /// current ones. Fields files are relative to the configuration file.
    pub fn generate_config(
        &mut self,
        config_path: &Path,
        flags: GenerationFlags,
        only: Option<&str>,
    ) -> Result<RunReport, GeneratorError> {
        let project = ProjectConfig::load(config_path)?;
        project.apply_to(&mut self.config);

        let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
        Orchestrator::new(self.config.clone()).run_config(&project, base_dir, flags, only)
    }

    /// Removes everything generation of `layer`/`collection` produced.
    pub fn rollback(
        &self,
        layer: &str,
        collection: &str,
        dry_run: bool,
    ) -> Result<RollbackReport, GeneratorError> {
        rollback::rollback(layer, collection, &self.config, dry_run)
    }
}
