//! Commit-to-version locking.
//!
//! A lock pins a commit to the version that was issued from it, so running the
//! tool twice on the same commit cannot bump the version twice. Locks are
//! persisted as JSON:
//!
//! ```json
//! {"versions": {"a1b2c3d": "1.4.0"}}
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{Result, VersionMachineError};

/// Default lock file name, relative to the working directory.
pub const DEFAULT_LOCK_PATH: &str = ".version_machine.lock";

/// Bidirectional association between commit identifiers and issued versions.
///
/// Lookups are explicit about direction; the reverse index is derived from the
/// forward map and kept in step on every insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockMap {
    by_commit: BTreeMap<String, String>,
    by_version: HashMap<String, String>,
}

impl LockMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version_for_commit(&self, commit_id: &str) -> Option<&str> {
        self.by_commit.get(commit_id).map(String::as_str)
    }

    pub fn commit_for_version(&self, version: &str) -> Option<&str> {
        self.by_version.get(version).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_commit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_commit.is_empty()
    }

    /// Iterates `(commit, version)` pairs ordered by commit identifier.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.by_commit
            .iter()
            .map(|(commit, version)| (commit.as_str(), version.as_str()))
    }

    /// Adds or overwrites the entry for `commit_id`.
    pub fn insert(&mut self, commit_id: impl Into<String>, version: impl Into<String>) {
        let commit_id = commit_id.into();
        let version = version.into();
        if let Some(previous) = self.by_commit.insert(commit_id.clone(), version.clone()) {
            self.by_version.remove(&previous);
        }
        self.by_version.insert(version, commit_id);
    }
}

impl FromIterator<(String, String)> for LockMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut map = LockMap::new();
        for (commit_id, version) in iter {
            map.insert(commit_id, version);
        }
        map
    }
}

/// Outcome of consulting the lock before a bump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockDecision {
    Proceed,
    /// The commit already has a version; no mutation should happen this run.
    Refuse { existing_version: String },
}

/// Decides whether a bump may proceed for `commit_id`.
///
/// Refuses only when locking is enabled and the commit is already recorded.
pub fn decide(lock_enabled: bool, commit_id: Option<&str>, lock_map: &LockMap) -> LockDecision {
    if !lock_enabled {
        return LockDecision::Proceed;
    }

    match commit_id.and_then(|commit| lock_map.version_for_commit(commit)) {
        Some(existing) => LockDecision::Refuse {
            existing_version: existing.to_string(),
        },
        None => LockDecision::Proceed,
    }
}

/// Returns a copy of `lock_map` with `commit_id` pinned to `version`.
pub fn record(lock_map: &LockMap, commit_id: &str, version: &str) -> LockMap {
    let mut updated = lock_map.clone();
    updated.insert(commit_id, version);
    updated
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LockDocument {
    #[serde(default)]
    versions: BTreeMap<String, String>,
}

/// A lock map together with the file it was loaded from.
#[derive(Debug, Clone)]
pub struct LockStore {
    path: PathBuf,
    map: LockMap,
}

impl LockStore {
    /// Loads the lock file at `path`; a missing file yields an empty map.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let map = match fs::read_to_string(&path) {
            Ok(text) => {
                let document: LockDocument = serde_json::from_str(&text)?;
                document.versions.into_iter().collect()
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no lock file yet, starting empty");
                LockMap::new()
            }
            Err(e) => {
                return Err(VersionMachineError::lock(format!(
                    "cannot read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        debug!(entries = map.len(), "lock loaded");
        Ok(LockStore { path, map })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn map(&self) -> &LockMap {
        &self.map
    }

    /// Pins `commit_id` to `version` in memory; call [`LockStore::save`] to persist.
    pub fn record(&mut self, commit_id: &str, version: &str) {
        self.map = record(&self.map, commit_id, version);
    }

    /// Writes the whole map back to disk.
    pub fn save(&self) -> Result<()> {
        let document = LockDocument {
            versions: self
                .map
                .iter()
                .map(|(commit, version)| (commit.to_string(), version.to_string()))
                .collect(),
        };
        let text = serde_json::to_string_pretty(&document)?;
        fs::write(&self.path, text + "\n").map_err(|e| {
            VersionMachineError::lock(format!("cannot write {}: {}", self.path.display(), e))
        })?;
        debug!(path = %self.path.display(), entries = self.map.len(), "lock saved");
        Ok(())
    }
}
