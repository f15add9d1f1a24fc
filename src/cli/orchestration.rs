//! Main workflow orchestration logic
//!
//! Ties the dirty-tree gate, the lock gate and the target pipeline together.
//! Kept apart from main.rs so the workflow can be driven programmatically
//! without depending on clap.

use std::path::PathBuf;

use tracing::{info, instrument, warn};

use crate::dirty::{self, TreeStatus};
use crate::error::{Result, VersionMachineError};
use crate::git::VersionControl;
use crate::lock::{self, LockDecision, LockStore, DEFAULT_LOCK_PATH};
use crate::pipeline::{Pipeline, TargetChange};
use crate::target::Target;
use crate::warning::RunWarning;

/// Arguments for the version workflow
///
/// Mirrors the CLI switches in a form suitable for orchestration logic.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowArgs {
    /// Continue with a warning when the working tree is dirty
    pub force: bool,

    /// Refuse to bump a commit that already has a version, and record new ones
    pub lock: bool,

    /// Where the lock map is persisted
    pub lock_path: PathBuf,

    /// Compute versions without writing targets or the lock file
    pub dry_run: bool,
}

impl Default for WorkflowArgs {
    fn default() -> Self {
        WorkflowArgs {
            force: false,
            lock: false,
            lock_path: PathBuf::from(DEFAULT_LOCK_PATH),
            dry_run: false,
        }
    }
}

/// A lock entry written by a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockEntry {
    pub commit: String,
    pub version: String,
}

/// Result of a completed workflow
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowResult {
    /// Targets were visited (and saved unless this was a dry run)
    Bumped {
        changes: Vec<TargetChange>,
        locked: Option<LockEntry>,
        warnings: Vec<RunWarning>,
    },

    /// HEAD is already locked to a version; no target was touched
    Locked {
        commit: String,
        existing_version: String,
        warnings: Vec<RunWarning>,
    },
}

impl WorkflowResult {
    pub fn warnings(&self) -> &[RunWarning] {
        match self {
            WorkflowResult::Bumped { warnings, .. } | WorkflowResult::Locked { warnings, .. } => {
                warnings
            }
        }
    }
}

/// Main version workflow
///
/// Orchestrates a single release bump:
/// 1. Check the working tree (fails on a dirty tree unless forced)
/// 2. In lock mode, load the lock map and stop if HEAD is already locked
/// 3. Load, recompute, rewrite and save each target in order
/// 4. In lock mode, pin HEAD to the last computed version and persist the map
///
/// # Arguments
///
/// * `args` - Workflow switches (force, lock, lock path, dry run)
/// * `targets` - Targets in configuration order
/// * `vcs` - Version-control collaborator
/// * `pipeline` - Wired load/travel/save stages
///
/// # Returns
///
/// The changes made, or the existing version when HEAD is locked
#[instrument(skip_all, fields(lock = args.lock, force = args.force, dry_run = args.dry_run))]
pub fn run_version_workflow(
    args: &WorkflowArgs,
    targets: Vec<Target>,
    vcs: &dyn VersionControl,
    pipeline: &Pipeline<'_>,
) -> Result<WorkflowResult> {
    if targets.is_empty() {
        return Err(VersionMachineError::missing_configuration(
            "no targets configured",
        ));
    }

    let mut warnings = Vec::new();

    let status = vcs.diff_status()?;
    if dirty::evaluate(&status, !args.force)? == TreeStatus::Dirty {
        warn!("continuing with a dirty working tree");
        warnings.push(RunWarning::DirtyTree);
    }

    let mut lock_state = None;
    if args.lock {
        let commit = vcs.current_commit_id()?;
        let store = LockStore::load(&args.lock_path)?;

        if let LockDecision::Refuse { existing_version } =
            lock::decide(true, Some(commit.as_str()), store.map())
        {
            info!(%commit, %existing_version, "HEAD already locked");
            warnings.push(RunWarning::LockedCommit {
                commit: commit.clone(),
                version: existing_version.clone(),
            });
            return Ok(WorkflowResult::Locked {
                commit,
                existing_version,
                warnings,
            });
        }
        lock_state = Some((commit, store));
    }

    let changes = pipeline.run(targets, args.dry_run)?;
    warnings.extend(
        changes
            .iter()
            .filter(|change| !change.declared)
            .map(|change| RunWarning::UndeclaredVersion {
                target: change.target.clone(),
            }),
    );

    let mut locked = None;
    if let (Some((commit, mut store)), Some(last)) = (lock_state, changes.last()) {
        let version = last.next.to_string();
        if !args.dry_run {
            store.record(&commit, &version);
            store.save()?;
            info!(%commit, %version, path = %store.path().display(), "locked HEAD");
        }
        locked = Some(LockEntry { commit, version });
    }

    Ok(WorkflowResult::Bumped {
        changes,
        locked,
        warnings,
    })
}
