//! Target orchestration.
//!
//! A target moves through `Validating → Planning → Writing → RegistryUpdating
//! → Done`, or to `Aborted` from any of them. Planning produces every
//! artifact before the first write, so a schema error never leaves files
//! behind and a dry run stops with the complete plan in hand. Targets of one
//! run are processed in order and share a single [`RegistrySet`].

mod writer;

use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::codegen::{self, GenContext, GeneratedArtifact};
use crate::config::{CollectionOptions, Dialect, GenerationFlags, GeneratorConfig, ProjectConfig};
use crate::diagnostic::{GeneratorError, Warning};
use crate::layout::{ArtifactKind, RegistryEntry};
use crate::naming::{self, NamingSet};
use crate::packages::PackageCatalog;
use crate::registry::{RegistryChange, RegistrySet};
use crate::schema::{self, CollectionSchema, ParsedSchema};

pub use writer::Writer;

/// Where a target's field definitions come from.
#[derive(Debug, Clone)]
pub enum FieldsSource {
    File(PathBuf),
    Inline(Value),
}

/// One (layer, collection) pair to generate.
#[derive(Debug, Clone)]
pub struct Target {
    pub layer: String,
    pub collection: String,
    pub dialect: Dialect,
    pub flags: GenerationFlags,
    pub fields: FieldsSource,
    pub options: CollectionOptions,
}

impl Target {
    pub fn new(layer: impl Into<String>, collection: impl Into<String>, fields: FieldsSource) -> Self {
        Self {
            layer: layer.into(),
            collection: collection.into(),
            dialect: Dialect::default(),
            flags: GenerationFlags::default(),
            fields,
            options: CollectionOptions::default(),
        }
    }

    /// `layer/collection`, used in logs and reports.
    pub fn name(&self) -> String {
        format!("{}/{}", self.layer, self.collection)
    }

    /// Expands a configuration file into targets, in declaration order.
    ///
    /// `flags` are combined with the file's own flags. Fields files are
    /// resolved against `base_dir`. With `only`, targets for other
    /// collections are dropped.
    pub fn from_config(
        project: &ProjectConfig,
        base_dir: &Path,
        flags: GenerationFlags,
        only: Option<&str>,
    ) -> Result<Vec<Target>, GeneratorError> {
        let file_flags = GenerationFlags::from(&project.flags);
        let flags = GenerationFlags {
            force: flags.force || file_flags.force,
            dry_run: flags.dry_run || file_flags.dry_run,
            no_translations: flags.no_translations || file_flags.no_translations,
        };

        let mut targets = Vec::new();
        for entry in &project.targets {
            for name in &entry.collections {
                if only.is_some_and(|only| only != name) {
                    continue;
                }
                let collection = project.collection(name).ok_or_else(|| {
                    GeneratorError::UndeclaredCollection {
                        collection: name.clone(),
                    }
                })?;
                targets.push(Target {
                    layer: entry.layer.clone(),
                    collection: name.clone(),
                    dialect: project.dialect,
                    flags,
                    fields: FieldsSource::File(base_dir.join(&collection.fields_file)),
                    options: collection.options.clone(),
                });
            }
        }

        if let Some(only) = only {
            if targets.is_empty() {
                return Err(GeneratorError::UndeclaredCollection {
                    collection: only.to_string(),
                });
            }
        }
        Ok(targets)
    }
}

/// Stage of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Validating,
    Planning,
    Writing,
    RegistryUpdating,
    Done,
    Aborted,
}

impl State {
    pub fn as_str(&self) -> &'static str {
        match self {
            State::Validating => "validating",
            State::Planning => "planning",
            State::Writing => "writing",
            State::RegistryUpdating => "registry-updating",
            State::Done => "done",
            State::Aborted => "aborted",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a target would produce.
#[derive(Debug, Clone)]
pub struct Plan {
    pub naming: NamingSet,
    pub schema: CollectionSchema,
    pub warnings: Vec<Warning>,
    pub artifacts: Vec<GeneratedArtifact>,
    pub registry_entries: Vec<RegistryEntry>,
}

/// Validating: names and schema.
fn validate(target: &Target) -> Result<(NamingSet, ParsedSchema), GeneratorError> {
    let naming = naming::derive(&target.layer, &target.collection)?;
    let options = target.options.schema_options(&target.flags);
    let parsed = match &target.fields {
        FieldsSource::File(path) => schema::parse_schema_file(path, &target.collection, &options)?,
        FieldsSource::Inline(raw) => schema::parse_schema(raw, &target.collection, &options)?,
    };
    Ok((naming, parsed))
}

/// Planning: every artifact and registry entry, in memory.
fn build_plan(
    target: &Target,
    config: &GeneratorConfig,
    naming: NamingSet,
    parsed: ParsedSchema,
) -> Result<Plan, GeneratorError> {
    let ctx = GenContext::new(
        &naming,
        &parsed.schema,
        &target.options,
        &config.ownership,
        target.dialect,
    );
    let artifacts = codegen::generate(&ctx)?;

    let mut seen: Vec<&Path> = Vec::with_capacity(artifacts.len());
    for artifact in &artifacts {
        let path = artifact.relative_path.as_path();
        if seen.contains(&path) {
            return Err(GeneratorError::DuplicateArtifact {
                target: target.name(),
                path: artifact.relative_path.clone(),
            });
        }
        seen.push(path);
    }

    let registry_entries = ctx.layout.registry_entries(&naming, &config.registries);

    Ok(Plan {
        naming,
        schema: parsed.schema,
        warnings: parsed.warnings,
        artifacts,
        registry_entries,
    })
}

/// Validates and plans a target without touching the filesystem beyond
/// reading its fields file.
pub fn plan(target: &Target, config: &GeneratorConfig) -> Result<Plan, GeneratorError> {
    let (naming, parsed) = validate(target)?;
    build_plan(target, config, naming, parsed)
}

/// Outcome of one target.
#[derive(Debug)]
pub struct TargetReport {
    pub target: String,
    pub state: State,
    /// Stage the target was in when it aborted.
    pub failed_in: Option<State>,
    pub error: Option<GeneratorError>,
    pub warnings: Vec<Warning>,
    /// Planned artifacts; the full plan of a dry run.
    pub planned: Vec<(ArtifactKind, PathBuf)>,
    pub planned_entries: Vec<RegistryEntry>,
    pub written: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub registry_changes: Vec<RegistryChange>,
    /// Dependent fields and the collection each one reads from.
    dependencies: Vec<(String, String)>,
}

impl TargetReport {
    fn new(target: &Target) -> Self {
        Self {
            target: target.name(),
            state: State::Validating,
            failed_in: None,
            error: None,
            warnings: Vec::new(),
            planned: Vec::new(),
            planned_entries: Vec::new(),
            written: Vec::new(),
            skipped: Vec::new(),
            registry_changes: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    fn enter(&mut self, next: State) {
        debug!(target_name = %self.target, from = %self.state, to = %next, "state transition");
        self.state = next;
    }

    pub fn is_failed(&self) -> bool {
        self.state == State::Aborted
    }
}

/// Outcome of a run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub targets: Vec<TargetReport>,
    /// Extension list changes made for configured packages.
    pub packages: Vec<RegistryChange>,
    /// Warnings not tied to a single target.
    pub warnings: Vec<Warning>,
    /// Nothing was written.
    pub dry_run: bool,
}

impl RunReport {
    pub fn failed(&self) -> impl Iterator<Item = &TargetReport> {
        self.targets.iter().filter(|t| t.is_failed())
    }

    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }

    /// Fails when any target failed. A single failed target surfaces its own
    /// error; several surface as [`GeneratorError::PartialRun`].
    pub fn into_result(mut self) -> Result<Self, GeneratorError> {
        let failed: Vec<String> = self.failed().map(|t| t.target.clone()).collect();
        if failed.is_empty() {
            return Ok(self);
        }
        if self.targets.len() == 1 {
            if let Some(error) = self.targets[0].error.take() {
                return Err(error);
            }
        }
        Err(GeneratorError::PartialRun {
            total: self.targets.len(),
            failed,
        })
    }
}

/// Runs targets against one project root.
pub struct Orchestrator {
    config: GeneratorConfig,
    registries: Option<RegistrySet>,
}

impl Orchestrator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            registries: None,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Runs targets sequentially. A failed target never stops the others.
    pub fn run(&mut self, targets: &[Target]) -> RunReport {
        let mut report = RunReport {
            dry_run: targets.first().is_some_and(|t| t.flags.dry_run),
            ..Default::default()
        };
        for target in targets {
            report.targets.push(self.run_target(target));
        }
        report
    }

    /// Runs every target of a configuration file, then registers its packages.
    pub fn run_config(
        &mut self,
        project: &ProjectConfig,
        base_dir: &Path,
        flags: GenerationFlags,
        only: Option<&str>,
    ) -> Result<RunReport, GeneratorError> {
        let targets = Target::from_config(project, base_dir, flags, only)?;
        let mut report = self.run(&targets);

        let generated: Vec<&str> = targets.iter().map(|t| t.collection.as_str()).collect();
        for target in &mut report.targets {
            for (field, collection) in &target.dependencies {
                if !generated.contains(&collection.as_str()) {
                    target.warnings.push(Warning::UnresolvedDependency {
                        field: field.clone(),
                        collection: collection.clone(),
                    });
                }
            }
        }

        let dry_run = report.dry_run || flags.dry_run || project.flags.dry_run;
        report.dry_run = dry_run;
        if !project.packages.is_empty() {
            let (changes, warnings) =
                self.register_packages(&project.packages, &PackageCatalog::builtin(), dry_run)?;
            report.packages = changes;
            report.warnings.extend(warnings);
        }
        Ok(report)
    }

    /// Adds each resolvable package to the extension list.
    pub fn register_packages(
        &mut self,
        ids: &[String],
        catalog: &PackageCatalog,
        dry_run: bool,
    ) -> Result<(Vec<RegistryChange>, Vec<Warning>), GeneratorError> {
        let mut entries = Vec::new();
        let mut warnings = Vec::new();
        for id in ids {
            match catalog.resolve(id) {
                Some(manifest) => entries.push(manifest.registry_entry()),
                None => {
                    warn!(package = %id, "unknown package");
                    warnings.push(Warning::UnknownPackage { id: id.clone() });
                }
            }
        }

        if dry_run || entries.is_empty() {
            return Ok((Vec::new(), warnings));
        }

        let registries = self.registries()?;
        let changes = registries.apply(&entries)?;
        registries.flush(false)?;
        Ok((changes, warnings))
    }

    fn registries(&mut self) -> Result<&mut RegistrySet, GeneratorError> {
        let set = match self.registries.take() {
            Some(set) => set,
            None => RegistrySet::load(&self.config.root, &self.config.registries)?,
        };
        Ok(self.registries.insert(set))
    }

    fn run_target(&mut self, target: &Target) -> TargetReport {
        let mut report = TargetReport::new(target);
        match self.drive(target, &mut report) {
            Ok(()) => {
                report.enter(State::Done);
                info!(
                    target_name = %report.target,
                    written = report.written.len(),
                    skipped = report.skipped.len(),
                    registry_changes = report.registry_changes.len(),
                    "target done"
                );
            }
            Err(error) => {
                warn!(target_name = %report.target, state = %report.state, error = %error, "target aborted");
                report.failed_in = Some(report.state);
                report.error = Some(error);
                report.enter(State::Aborted);
            }
        }
        report
    }

    fn drive(&mut self, target: &Target, report: &mut TargetReport) -> Result<(), GeneratorError> {
        let (naming, parsed) = validate(target)?;

        report.enter(State::Planning);
        let plan = build_plan(target, &self.config, naming, parsed)?;
        for warning in &plan.warnings {
            warn!(target_name = %report.target, "{}", warning);
        }
        report.warnings.extend(plan.warnings.iter().cloned());
        report.planned = plan
            .artifacts
            .iter()
            .map(|a| (a.kind.clone(), a.relative_path.clone()))
            .collect();
        report.planned_entries = plan.registry_entries.clone();
        report.dependencies = plan
            .schema
            .dependent_fields()
            .filter_map(|f| {
                let dep = f.dependent_on.as_ref()?;
                Some((f.name.clone(), dep.collection.clone()))
            })
            .collect();

        if target.flags.dry_run {
            return Ok(());
        }

        report.enter(State::Writing);
        let writer = Writer::new(&self.config.root, target.flags.force);
        for artifact in &plan.artifacts {
            match writer.write(artifact) {
                Ok(()) => report.written.push(artifact.relative_path.clone()),
                Err(GeneratorError::FileExists { path }) => {
                    warn!(path = %path.display(), "skipped existing file");
                    report.skipped.push(path.clone());
                    report.warnings.push(Warning::FileSkipped { path });
                }
                Err(error) => return Err(error),
            }
        }

        report.enter(State::RegistryUpdating);
        let registries = self.registries()?;
        report.registry_changes = registries.apply(&plan.registry_entries)?;
        registries.flush(false)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CollectionEntry, ProjectFlags, TargetEntry};
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn posts() -> Target {
        Target::new(
            "blog",
            "posts",
            FieldsSource::Inline(json!({
                "id": { "type": "uuid", "meta": { "primaryKey": true } },
                "title": { "type": "string", "meta": { "required": true, "maxLength": 200 } }
            })),
        )
    }

    fn files_under(root: &Path) -> usize {
        walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .count()
    }

    #[test]
    fn test_plan_orders_artifacts_and_entries() {
        let plan = plan(&posts(), &GeneratorConfig::default()).unwrap();
        assert_eq!(plan.artifacts[0].kind, ArtifactKind::Manifest);
        assert_eq!(plan.artifacts.last().unwrap().kind, ArtifactKind::Types);
        assert_eq!(plan.registry_entries.len(), 3);
        assert_eq!(plan.naming.prefixed_plural_pascal, "BlogPosts");
    }

    #[test]
    fn test_dry_run_has_no_side_effects() {
        let temp = TempDir::new().unwrap();
        let mut target = posts();
        target.flags.dry_run = true;

        let report = Orchestrator::new(GeneratorConfig::with_root(temp.path())).run(&[target]);
        assert!(report.is_success());
        assert_eq!(report.targets[0].state, State::Done);
        assert!(!report.targets[0].planned.is_empty());
        assert_eq!(files_under(temp.path()), 0);
    }

    #[test]
    fn test_dry_run_with_invalid_schema_still_reports() {
        let temp = TempDir::new().unwrap();
        let mut target = Target::new("blog", "posts", FieldsSource::Inline(json!({})));
        target.flags.dry_run = true;

        let report = Orchestrator::new(GeneratorConfig::with_root(temp.path())).run(&[target]);
        assert_eq!(report.targets[0].failed_in, Some(State::Validating));
        assert!(matches!(
            report.into_result().unwrap_err(),
            GeneratorError::EmptySchema { .. }
        ));
        assert_eq!(files_under(temp.path()), 0);
    }

    #[test]
    fn test_rerun_skips_files_and_changes_no_registry() {
        let temp = TempDir::new().unwrap();
        let config = GeneratorConfig::with_root(temp.path());

        let first = Orchestrator::new(config.clone()).run(&[posts()]);
        let first = &first.targets[0];
        assert!(first.skipped.is_empty());
        assert_eq!(first.registry_changes.len(), 3);

        let second = Orchestrator::new(config).run(&[posts()]);
        let second = &second.targets[0];
        assert_eq!(second.state, State::Done);
        assert!(second.written.is_empty());
        assert_eq!(second.skipped.len(), first.written.len());
        assert!(second.registry_changes.is_empty());
        assert!(second
            .warnings
            .iter()
            .all(|w| matches!(w, Warning::FileSkipped { .. })));
    }

    #[test]
    fn test_write_failure_skips_registry_stage() {
        let temp = TempDir::new().unwrap();
        // A directory where types.ts should go makes the write fail.
        fs::create_dir_all(temp.path().join("layers/blog/collections/posts/types.ts")).unwrap();
        let mut target = posts();
        target.flags.force = true;

        let report = Orchestrator::new(GeneratorConfig::with_root(temp.path())).run(&[target]);
        assert_eq!(report.targets[0].failed_in, Some(State::Writing));
        assert!(!temp.path().join("nuxt.config.ts").exists());
        assert!(temp
            .path()
            .join("layers/blog/collections/posts/server/database/schema.ts")
            .exists());
    }

    #[test]
    fn test_failed_target_does_not_stop_siblings() {
        let temp = TempDir::new().unwrap();
        let broken = Target::new("blog", "drafts", FieldsSource::Inline(json!({ "x": { "type": "blob" } })));

        let report = Orchestrator::new(GeneratorConfig::with_root(temp.path())).run(&[broken, posts()]);
        assert!(report.targets[0].is_failed());
        assert_eq!(report.targets[1].state, State::Done);
        match report.into_result().unwrap_err() {
            GeneratorError::PartialRun { total, failed } => {
                assert_eq!(total, 2);
                assert_eq!(failed, vec!["blog/drafts".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    fn project() -> ProjectConfig {
        ProjectConfig {
            dialect: Dialect::Postgres,
            collections: vec![
                CollectionEntry {
                    name: "posts".to_string(),
                    fields_file: PathBuf::from("posts.json"),
                    options: CollectionOptions::default(),
                },
                CollectionEntry {
                    name: "reservations".to_string(),
                    fields_file: PathBuf::from("reservations.json"),
                    options: CollectionOptions::default(),
                },
            ],
            targets: vec![
                TargetEntry {
                    layer: "blog".to_string(),
                    collections: vec!["posts".to_string()],
                },
                TargetEntry {
                    layer: "bookings".to_string(),
                    collections: vec!["reservations".to_string()],
                },
            ],
            flags: ProjectFlags {
                dry_run: true,
                ..Default::default()
            },
            packages: vec!["bookings".to_string(), "crm".to_string()],
            ownership: None,
            registries: None,
        }
    }

    #[test]
    fn test_targets_from_config_keep_order_and_filter() {
        let base = Path::new("/project");
        let targets = Target::from_config(&project(), base, GenerationFlags::default(), None).unwrap();
        let names: Vec<String> = targets.iter().map(Target::name).collect();
        assert_eq!(names, vec!["blog/posts", "bookings/reservations"]);
        assert!(targets[0].flags.dry_run);
        assert_eq!(targets[0].dialect, Dialect::Postgres);

        let only = Target::from_config(&project(), base, GenerationFlags::default(), Some("reservations")).unwrap();
        assert_eq!(only.len(), 1);

        let err = Target::from_config(&project(), base, GenerationFlags::default(), Some("pages")).unwrap_err();
        assert!(matches!(err, GeneratorError::UndeclaredCollection { .. }));
    }

    #[test]
    fn test_config_run_warns_about_packages_and_dependencies() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("posts.json"),
            r#"{ "title": { "type": "string" } }"#,
        )
        .unwrap();
        fs::write(
            temp.path().join("reservations.json"),
            r#"{
                "location": { "type": "reference", "meta": { "refTarget": "locations" } },
                "slot": { "type": "string", "meta": { "dependsOn": "location", "dependsOnCollection": "locations", "dependsOnField": "slots" } }
            }"#,
        )
        .unwrap();

        let mut orchestrator = Orchestrator::new(GeneratorConfig::with_root(temp.path()));
        let report = orchestrator
            .run_config(&project(), temp.path(), GenerationFlags::default(), None)
            .unwrap();

        assert!(report.is_success());
        assert!(report.packages.is_empty());
        assert_eq!(report.warnings, vec![Warning::UnknownPackage { id: "crm".to_string() }]);
        assert!(report.targets[1].warnings.contains(&Warning::UnresolvedDependency {
            field: "slot".to_string(),
            collection: "locations".to_string(),
        }));
        assert!(!temp.path().join("nuxt.config.ts").exists());
    }

    #[test]
    fn test_packages_are_added_to_extension_list() {
        let temp = TempDir::new().unwrap();
        let mut orchestrator = Orchestrator::new(GeneratorConfig::with_root(temp.path()));
        let (changes, warnings) = orchestrator
            .register_packages(&["pages".to_string()], &PackageCatalog::builtin(), false)
            .unwrap();
        assert_eq!(changes.len(), 1);
        assert!(warnings.is_empty());
        let config = fs::read_to_string(temp.path().join("nuxt.config.ts")).unwrap();
        assert!(config.contains("extends: ['@layerkit/pages'],"));
    }
}
