use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use version_machine::cli::{run_version_workflow, WorkflowArgs, WorkflowResult};
use version_machine::config::{self, Config};
use version_machine::git::Git2Repository;
use version_machine::pipeline::{Pipeline, SemanticTravel};
use version_machine::target::{FileStore, Target};
use version_machine::version::{self, IncrementKind, Version};
use version_machine::{ui, VersionMachineError};

/// Environment variable holding a tracing filter directive.
const LOG_ENV: &str = "VERSION_MACHINE_LOG";

/// Name of the target described by `--path`.
const CLI_TARGET_NAME: &str = "cli";

#[derive(clap::Parser)]
#[command(
    name = "version-machine",
    version,
    about = "Move version numbers in __version__ declarations"
)]
struct Args {
    #[arg(long, help = "Path of file to change version in")]
    path: Option<PathBuf>,

    #[arg(
        short,
        long,
        default_value = "patch",
        value_parser = parse_increment,
        help = "Version part to be incremented (major, minor, patch, phase)"
    )]
    increment: IncrementKind,

    #[arg(
        long = "override",
        requires = "path",
        value_parser = parse_version,
        help = "Write exactly this version to --path instead of incrementing"
    )]
    override_version: Option<Version>,

    #[arg(
        long,
        requires = "path",
        allow_hyphen_values = true,
        value_parser = parse_phase,
        help = "Phase suffix to set on --path (e.g. -rc1); empty clears it"
    )]
    phase: Option<String>,

    #[arg(short, long, help = "Ignore a dirty working tree and move the version anyway")]
    force: bool,

    #[arg(
        short = 'L',
        long,
        help = "Lock the current git HEAD commit to the new version"
    )]
    lock: bool,

    #[arg(long, help = "Lock file location")]
    lock_path: Option<PathBuf>,

    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(long, default_value = ".", help = "Git repository to inspect")]
    repo: PathBuf,

    #[arg(long, help = "Preview what would happen without making changes")]
    dry_run: bool,

    #[arg(short, long, help = "Print debug logging to stderr")]
    verbose: bool,
}

fn parse_increment(value: &str) -> std::result::Result<IncrementKind, String> {
    value
        .parse()
        .map_err(|e: VersionMachineError| e.to_string())
}

fn parse_version(value: &str) -> std::result::Result<Version, String> {
    value
        .parse()
        .map_err(|e: VersionMachineError| e.to_string())
}

fn parse_phase(value: &str) -> std::result::Result<String, String> {
    version::parse_phase(value).map_err(|e| e.to_string())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Merges discovered configuration with the command line.
///
/// Configuration files are optional only when `--path` names a target.
fn resolve_config(args: &Args) -> Result<Config> {
    let cwd = std::env::current_dir().context("cannot determine working directory")?;

    let mut config = match config::load_config(args.config.as_deref(), &cwd) {
        Ok(config) => config,
        Err(VersionMachineError::MissingConfiguration(_)) if args.path.is_some() => {
            Config::default()
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(path) = &args.path {
        let mut target = Target::new(CLI_TARGET_NAME, path, args.increment);
        if let Some(version) = &args.override_version {
            target = target.with_override(version.clone());
        }
        if let Some(phase) = &args.phase {
            target = target.with_phase(phase.clone());
        }
        config.targets.push(target);
    }

    config.lock |= args.lock;
    config.force |= args.force;
    if let Some(lock_path) = &args.lock_path {
        config.lock_path = lock_path.clone();
    }

    Ok(config)
}

fn run(args: Args) -> Result<()> {
    let config = resolve_config(&args)?;

    let repo = Git2Repository::open(&args.repo)
        .with_context(|| format!("cannot open git repository at {}", args.repo.display()))?;

    let store = FileStore;
    let pipeline = Pipeline::new(&store, &SemanticTravel, &store);
    let workflow_args = WorkflowArgs {
        force: config.force,
        lock: config.lock,
        lock_path: config.lock_path,
        dry_run: args.dry_run,
    };

    ui::display_status(&format!(
        "Moving versions in {} target(s)",
        config.targets.len()
    ));
    let result = run_version_workflow(&workflow_args, config.targets, &repo, &pipeline)?;

    for warning in result.warnings() {
        ui::display_warning(warning);
    }

    if let WorkflowResult::Bumped {
        changes, locked, ..
    } = &result
    {
        ui::display_version_changes(changes, args.dry_run);
        if let Some(entry) = locked {
            if args.dry_run {
                ui::display_status(&format!(
                    "Would lock {} to version {}",
                    entry.commit, entry.version
                ));
            } else {
                ui::display_success(&format!(
                    "Locked {} to version {}",
                    entry.commit, entry.version
                ));
            }
        }
    }

    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args) {
        ui::display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
