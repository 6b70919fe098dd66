//! layerkit command line.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use layerkit_compiler::config::{CONFIG_FILE_NAME, DEFAULT_SEED_COUNT};
use layerkit_compiler::packages::PackageCatalog;
use layerkit_compiler::registry::{ChangeAction, RegistryChange};
use layerkit_compiler::{
    CollectionOptions, Dialect, FieldsSource, GenerationFlags, Generator, GeneratorConfig,
    ProjectConfig, RollbackReport, RunReport, Target,
};

mod ui;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "LAYERKIT_LOG";

#[derive(Parser)]
#[command(name = "layerkit")]
#[command(about = "Generate schema-driven collections for layered Nuxt apps", version)]
struct Cli {
    /// Log every stage transition and file operation
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one collection, or every target of a configuration file
    Generate(GenerateCmd),

    /// Print the artifact plan of one collection without writing anything
    Plan {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Remove a generated collection and its registry entries
    Rollback {
        layer: String,
        collection: String,

        /// List what would be removed
        #[arg(long)]
        dry_run: bool,

        /// Project root
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },

    /// List the feature packages a configuration can extend
    Packages,

    /// Write an example configuration file
    InitConfig {
        #[arg(default_value = CONFIG_FILE_NAME)]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
#[command(args_conflicts_with_subcommands = true)]
struct GenerateCmd {
    #[command(subcommand)]
    from: Option<GenerateFrom>,

    #[command(flatten)]
    target: TargetArgs,

    /// Overwrite existing files
    #[arg(long)]
    force: bool,

    /// Print the plan and exit without writing
    #[arg(long)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum GenerateFrom {
    /// Generate every target listed in a configuration file
    Config {
        #[arg(default_value = CONFIG_FILE_NAME)]
        path: PathBuf,

        /// Only generate this collection
        #[arg(long)]
        only: Option<String>,

        #[arg(long)]
        force: bool,

        #[arg(long)]
        dry_run: bool,

        #[arg(long)]
        no_translations: bool,

        /// Project root
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
}

#[derive(Args)]
struct TargetArgs {
    /// Layer name, e.g. `blog`
    layer: Option<String>,

    /// Collection name, plural, e.g. `posts`
    collection: Option<String>,

    /// JSON fields file [default: <root>/schemas/<collection>.json]
    #[arg(short, long)]
    fields_file: Option<PathBuf>,

    /// Persistence dialect: sqlite or pg
    #[arg(short, long, default_value = "sqlite")]
    dialect: String,

    /// Tree-shaped collection with parent, path, depth and order
    #[arg(long)]
    hierarchy: bool,

    /// Manually ordered collection
    #[arg(long)]
    sortable: bool,

    /// Emit a seed module with this many rows
    #[arg(long, num_args = 0..=1, default_missing_value = "25")]
    seed: Option<usize>,

    /// Extra translatable fields (comma separated)
    #[arg(long, value_delimiter = ',')]
    translatable: Vec<String>,

    /// Use this component instead of generating the form
    #[arg(long)]
    form_component: Option<String>,

    /// Treat translatable fields as plain columns
    #[arg(long)]
    no_translations: bool,

    /// Project root
    #[arg(long, default_value = ".")]
    root: PathBuf,
}

impl TargetArgs {
    fn target(&self, flags: GenerationFlags) -> miette::Result<Target> {
        let (Some(layer), Some(collection)) = (&self.layer, &self.collection) else {
            return Err(miette::miette!(
                help = "layerkit generate <layer> <collection>, or layerkit generate config",
                "missing layer or collection"
            ));
        };
        let fields = self
            .fields_file
            .clone()
            .unwrap_or_else(|| self.root.join("schemas").join(format!("{}.json", collection)));

        let mut target = Target::new(layer.clone(), collection.clone(), FieldsSource::File(fields));
        target.dialect = self.dialect.parse::<Dialect>()?;
        target.flags = GenerationFlags {
            no_translations: self.no_translations,
            ..flags
        };
        target.options = CollectionOptions {
            hierarchy: self.hierarchy,
            sortable: self.sortable,
            seed: self.seed.filter(|n| *n > 0),
            translatable: self.translatable.clone(),
            form_component: self.form_component.clone(),
            ..Default::default()
        };
        Ok(target)
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Generate(cmd) => match cmd.from {
            Some(GenerateFrom::Config {
                path,
                only,
                force,
                dry_run,
                no_translations,
                root,
            }) => {
                let flags = GenerationFlags {
                    force,
                    dry_run,
                    no_translations,
                };
                generate_config(&path, &root, flags, only.as_deref())?;
            }
            None => {
                let flags = GenerationFlags {
                    force: cmd.force,
                    dry_run: cmd.dry_run,
                    no_translations: false,
                };
                let target = cmd.target.target(flags)?;
                generate(target, &cmd.target.root)?;
            }
        },

        Commands::Plan { target } => {
            let flags = GenerationFlags {
                dry_run: true,
                ..Default::default()
            };
            let planned = target.target(flags)?;
            plan(&planned, &target.root)?;
        }

        Commands::Rollback {
            layer,
            collection,
            dry_run,
            root,
        } => {
            rollback(&layer, &collection, dry_run, &root)?;
        }

        Commands::Packages => list_packages(),

        Commands::InitConfig { path, force } => init_config(&path, force)?,
    }

    Ok(())
}

fn generate(target: Target, root: &Path) -> miette::Result<()> {
    let start = Instant::now();
    let spinner = ui::spinner(&format!("Generating {}...", target.name()));

    debug!(root = %root.display(), target_name = %target.name(), "generating");
    let mut generator = Generator::new(GeneratorConfig::with_root(root));
    let report = generator.generate(std::slice::from_ref(&target));
    spinner.finish_and_clear();

    let dry_run = report.dry_run;
    finish(report, dry_run, start)
}

fn generate_config(
    path: &Path,
    root: &Path,
    flags: GenerationFlags,
    only: Option<&str>,
) -> miette::Result<()> {
    let start = Instant::now();
    let spinner = ui::spinner(&format!("Generating from {}...", path.display()));

    debug!(root = %root.display(), config = %path.display(), "generating from configuration");
    let mut generator = Generator::new(GeneratorConfig::with_root(root));
    let result = generator.generate_config(path, flags, only);
    spinner.finish_and_clear();
    let report = result?;

    let dry_run = report.dry_run;
    finish(report, dry_run, start)
}

/// Prints a run report and turns failures into the exit status.
fn finish(report: RunReport, dry_run: bool, start: Instant) -> miette::Result<()> {
    print_report(&report, dry_run);

    let failed = report.failed().count();
    if failed > 0 {
        ui::error_header();
        if report.targets.len() > 1 {
            for target in report.failed() {
                if let Some(error) = &target.error {
                    ui::error(&format!("{}: {}", target.target, error));
                }
            }
            println!();
        }
        report.into_result()?;
        return Ok(());
    }

    let label = if dry_run { "Planned" } else { "Generated" };
    ui::timing(
        &format!("{} {}", label, ui::count(report.targets.len(), "collection")),
        start.elapsed().as_millis(),
    );
    Ok(())
}

fn print_report(report: &RunReport, dry_run: bool) {
    for target in &report.targets {
        let detail = match (target.is_failed(), target.failed_in) {
            (true, Some(state)) => format!("failed while {}", state),
            _ if dry_run => ui::count(target.planned.len(), "planned file"),
            _ => format!(
                "{} written, {} skipped",
                target.written.len(),
                target.skipped.len()
            ),
        };
        ui::target_header(&target.target, &detail);

        if dry_run {
            for (kind, path) in &target.planned {
                let kind = kind.to_string();
                ui::file_line(ui::FileStatus::Planned, path, Some(kind.as_str()));
            }
            for entry in &target.planned_entries {
                ui::registry_line(true, entry.kind.as_str(), &entry.key);
            }
        } else {
            for path in &target.written {
                ui::file_line(ui::FileStatus::Written, path, None);
            }
            for path in &target.skipped {
                ui::file_line(ui::FileStatus::Skipped, path, Some("exists, use --force"));
            }
            print_changes(&target.registry_changes);
        }

        for warning in &target.warnings {
            if !matches!(warning, layerkit_compiler::Warning::FileSkipped { .. }) {
                ui::warning(&warning.to_string());
            }
        }
        println!();
    }

    if !report.packages.is_empty() {
        ui::info("Packages");
        print_changes(&report.packages);
        println!();
    }
    for warning in &report.warnings {
        ui::warning(&warning.to_string());
    }
}

fn print_changes(changes: &[RegistryChange]) {
    for change in changes {
        ui::registry_line(change.action == ChangeAction::Added, change.kind.as_str(), &change.key);
    }
}

fn plan(target: &Target, root: &Path) -> miette::Result<()> {
    let generator = Generator::new(GeneratorConfig::with_root(root));
    let plan = generator.plan(target)?;

    ui::target_header(&target.name(), &ui::count(plan.artifacts.len(), "file"));
    for artifact in &plan.artifacts {
        let note = format!("{} {} {} bytes", artifact.kind, ui::symbols::DOT, artifact.content.len());
        ui::file_line(ui::FileStatus::Planned, &artifact.relative_path, Some(note.as_str()));
    }
    for entry in &plan.registry_entries {
        ui::registry_line(true, entry.kind.as_str(), &entry.key);
    }
    for warning in &plan.warnings {
        ui::warning(&warning.to_string());
    }
    Ok(())
}

fn rollback(layer: &str, collection: &str, dry_run: bool, root: &Path) -> miette::Result<()> {
    let generator = Generator::new(GeneratorConfig::with_root(root));
    let report: RollbackReport = generator.rollback(layer, collection, dry_run)?;

    let detail = if dry_run { "dry run" } else { "rolled back" };
    ui::target_header(&format!("{}/{}", layer, collection), detail);
    for path in &report.removed {
        ui::file_line(ui::FileStatus::Removed, path, None);
    }
    if report.removed.is_empty() {
        ui::dim("No generated files found.");
    }
    print_changes(&report.registry_changes);
    println!();

    if dry_run {
        ui::info(&format!(
            "Would remove {} and {}",
            ui::count(report.removed.len(), "file"),
            ui::count(report.registry_changes.len(), "registry entry"),
        ));
    } else {
        ui::success(&format!(
            "Removed {} and {}",
            ui::count(report.removed.len(), "file"),
            ui::count(report.registry_changes.len(), "registry entry"),
        ));
    }
    Ok(())
}

fn list_packages() {
    for manifest in PackageCatalog::builtin().manifests() {
        ui::target_header(manifest.id, manifest.description);
        ui::dim(&format!("    extends {}", manifest.extends));
        if !manifest.collections.is_empty() {
            ui::dim(&format!("    collections {}", manifest.collections.join(", ")));
        }
    }
}

fn init_config(path: &Path, force: bool) -> miette::Result<()> {
    if path.exists() && !force {
        return Err(miette::miette!(
            help = "Pass --force to overwrite it",
            "{} already exists",
            path.display()
        ));
    }

    let example = ProjectConfig::example();
    let json = serde_json::to_string_pretty(&example)
        .map_err(|e| miette::miette!("Failed to serialize configuration: {}", e))?;
    std::fs::write(path, format!("{}\n", json))
        .map_err(|e| miette::miette!("Failed to write {}: {}", path.display(), e))?;

    ui::success(&format!("Wrote {}", path.display()));
    ui::dim(&format!(
        "Seeded collections default to {} rows. Run `layerkit generate config` next.",
        DEFAULT_SEED_COUNT
    ));
    Ok(())
}
