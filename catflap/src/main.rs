mod logging;
mod output;

use anyhow::{Context, Result};
use catflap_core::sanity::{self, Reporter, StderrReporter};
use catflap_core::{Algorithm, Manifest, Reconciler, SyncEntry, SyncFlags};
use clap::{Parser, Subcommand};
use output::{
    CheckOutput, ObjectState, ObjectStatus, OutputWriter, ShowOutput, StatusOutput, UpdateOutput,
    UpdatedObject,
};
use std::path::{Path, PathBuf};

/// Catflap - keeps the sync manifest of a distribution tree up to date
#[derive(Parser)]
#[command(name = "catflap")]
#[command(about = "Reconcile sync manifest entries with files on disk", long_about = None)]
#[command(version)]
struct Cli {
    /// Manifest file (defaults to CATFLAP_MANIFEST env var or ./catflap.json)
    #[arg(short, long, global = true)]
    manifest: Option<PathBuf>,

    /// Directory that object names are relative to (defaults to CATFLAP_BASE env var or .)
    #[arg(short, long, global = true)]
    base: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// More log output (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile objects with the manifest and save it
    Update {
        /// Object names, relative to the base directory
        #[arg(required = true)]
        names: Vec<String>,

        /// Transfer flags: i=ignore existing, r=replace, P=purge, f=fuzzy
        #[arg(long)]
        flags: Option<String>,

        /// Record per-file content hashes
        #[arg(long)]
        hashes: bool,

        /// Hash algorithm to use
        #[arg(long, default_value = "md5")]
        algo: String,

        /// Skip objects that do not exist instead of failing
        #[arg(long)]
        skip_missing: bool,
    },

    /// Warn about directories and .exe files that are not executable
    Check {
        /// Object names (all manifest entries if omitted)
        names: Vec<String>,
    },

    /// Show which manifest entries no longer match the files on disk
    Status,

    /// Print a manifest entry
    Show {
        /// Object name
        name: String,
    },
}

/// Resolved paths: CLI arg > env var > default.
struct Paths {
    manifest: PathBuf,
    base: PathBuf,
}

impl Paths {
    fn resolve(manifest: Option<PathBuf>, base: Option<PathBuf>) -> Self {
        Self {
            manifest: manifest
                .or_else(|| std::env::var("CATFLAP_MANIFEST").ok().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("./catflap.json")),
            base: base
                .or_else(|| std::env::var("CATFLAP_BASE").ok().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(logging::level(cli.verbose, cli.quiet));

    let output = OutputWriter::new(cli.json);
    let paths = Paths::resolve(cli.manifest, cli.base);

    let result = match cli.command {
        Commands::Update {
            names,
            flags,
            hashes,
            algo,
            skip_missing,
        } => cmd_update(
            &output,
            &paths,
            names,
            flags.as_deref(),
            hashes,
            &algo,
            skip_missing,
        ),
        Commands::Check { names } => cmd_check(&output, &paths, names),
        Commands::Status => cmd_status(&output, &paths),
        Commands::Show { name } => cmd_show(&output, &paths, &name),
    };

    if let Err(e) = result {
        output.write_error(&e, 1);
        std::process::exit(1);
    }
}

fn load_manifest(path: &Path) -> Result<Manifest> {
    Manifest::load(path).with_context(|| format!("Failed to load manifest {}", path.display()))
}

fn cmd_update(
    output: &OutputWriter,
    paths: &Paths,
    names: Vec<String>,
    flags: Option<&str>,
    hashes: bool,
    algo: &str,
    skip_missing: bool,
) -> Result<()> {
    let algorithm = Algorithm::parse(algo).with_context(|| format!("Invalid --algo {}", algo))?;
    let flags = flags.map(SyncFlags::parse);
    let reconciler = Reconciler::new(&paths.base).with_algorithm(algorithm);
    let mut manifest = load_manifest(&paths.manifest)?;

    let mut objects = Vec::new();
    let mut skipped = Vec::new();

    for name in names {
        let prior_revision = manifest.get(&name).map(|e| e.revision);
        let entry = match reconciler.update(&manifest, &name, flags.as_ref(), hashes) {
            Ok(entry) => entry,
            Err(e) if skip_missing && e.is_not_found() => {
                tracing::warn!(object = %name, "skipping missing object");
                skipped.push(name);
                continue;
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to update {}", name)),
        };

        let changed = prior_revision != Some(entry.revision);
        objects.push(UpdatedObject::new(&entry, changed));
        manifest.upsert(entry);
    }

    manifest
        .save(&paths.manifest)
        .with_context(|| format!("Failed to save manifest {}", paths.manifest.display()))?;

    let data = UpdateOutput {
        success: true,
        result_code: 0,
        manifest: paths.manifest.display().to_string(),
        objects,
        skipped,
    };

    output.write(&data, || {
        let mut text = String::new();
        for obj in &data.objects {
            let marker = if obj.changed { "updated" } else { "unchanged" };
            if obj.flags.is_empty() {
                text.push_str(&format!("{} r{} {}\n", marker, obj.revision, obj.name));
            } else {
                text.push_str(&format!(
                    "{} r{} {} [{}]\n",
                    marker, obj.revision, obj.name, obj.flags
                ));
            }
        }
        for name in &data.skipped {
            text.push_str(&format!("skipped {} (missing)\n", name));
        }
        text
    })
}

/// Collects warnings for JSON output instead of printing them.
struct CollectingReporter(Vec<String>);

impl Reporter for CollectingReporter {
    fn warn(&mut self, warning: &sanity::PermissionWarning) {
        self.0.push(warning.to_string());
    }
}

fn cmd_check(output: &OutputWriter, paths: &Paths, names: Vec<String>) -> Result<()> {
    let names = if names.is_empty() {
        let manifest = load_manifest(&paths.manifest)?;
        manifest.names().map(str::to_string).collect()
    } else {
        names
    };

    let mut collected = CollectingReporter(Vec::new());
    let mut stderr = StderrReporter;
    let reporter: &mut dyn Reporter = if output.is_json() {
        &mut collected
    } else {
        &mut stderr
    };

    for name in &names {
        let path = paths.base.join(name);
        sanity::check_and_report(&path, reporter)
            .with_context(|| format!("Failed to check {}", path.display()))?;
    }

    let data = CheckOutput {
        success: true,
        result_code: 0,
        checked: names.len(),
        warnings: collected.0,
    };

    output.write(&data, String::new)
}

fn object_state(reconciler: &Reconciler, entry: &SyncEntry) -> Result<ObjectState> {
    match reconciler.is_current(entry) {
        Ok(true) => Ok(ObjectState::Current),
        Ok(false) => Ok(ObjectState::Modified),
        Err(e) if e.is_not_found() => Ok(ObjectState::Missing),
        Err(e) => Err(e).with_context(|| format!("Failed to inspect {}", entry.name)),
    }
}

fn cmd_status(output: &OutputWriter, paths: &Paths) -> Result<()> {
    let manifest = load_manifest(&paths.manifest)?;
    let reconciler = Reconciler::new(&paths.base);

    let mut objects = Vec::with_capacity(manifest.len());
    for entry in &manifest.sync {
        objects.push(ObjectStatus {
            name: entry.name.clone(),
            revision: entry.revision,
            state: object_state(&reconciler, entry)?,
        });
    }

    let data = StatusOutput {
        success: true,
        result_code: 0,
        objects,
    };

    output.write(&data, || {
        if data.objects.is_empty() {
            return "No objects in manifest (use 'catflap update' to add some)\n".to_string();
        }
        let mut text = String::new();
        for obj in &data.objects {
            text.push_str(&format!(
                "{:<8} r{} {}\n",
                obj.state.as_str(),
                obj.revision,
                obj.name
            ));
        }
        text
    })
}

fn cmd_show(output: &OutputWriter, paths: &Paths, name: &str) -> Result<()> {
    let manifest = load_manifest(&paths.manifest)?;
    let entry = manifest
        .get(name)
        .cloned()
        .with_context(|| format!("No manifest entry for {}", name))?;

    let data = ShowOutput {
        success: true,
        result_code: 0,
        entry,
    };

    let text = serde_json::to_string_pretty(&data.entry)?;
    output.write(&data, || format!("{}\n", text))
}
