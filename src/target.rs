//! Targets: the places a version lives.
//!
//! A [`Target`] is built from configuration, has its content loaded before the
//! version is computed, gets its content replaced, and is saved at the end of
//! the run. Loading and saving are separate capabilities so a store can be
//! swapped without touching the version arithmetic.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::error::{Result, VersionMachineError};
use crate::version::{IncrementDirective, IncrementKind, Version};

/// One addressable text blob whose embedded version is subject to rewriting.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    /// Name of the target in configuration (`main` for a flat table).
    pub id: String,
    pub path: PathBuf,
    pub directive: IncrementDirective,
    /// Exact version to write instead of computing one.
    pub override_version: Option<Version>,
    /// Populated by a [`TargetLoad`] implementation.
    pub content: Option<String>,
}

impl Target {
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>, kind: IncrementKind) -> Self {
        Target {
            id: id.into(),
            path: path.into(),
            directive: IncrementDirective::new(kind),
            override_version: None,
            content: None,
        }
    }

    pub fn with_override(mut self, version: Version) -> Self {
        self.override_version = Some(version);
        self
    }

    pub fn with_phase(mut self, phase: impl Into<String>) -> Self {
        self.directive = self.directive.with_phase(phase);
        self
    }

    /// Returns the loaded content, failing if the target was never loaded.
    pub fn loaded_content(&self) -> Result<&str> {
        self.content.as_deref().ok_or_else(|| {
            VersionMachineError::target_io(
                self.id.clone(),
                self.path.clone(),
                std::io::Error::new(std::io::ErrorKind::Other, "content was not loaded"),
            )
        })
    }
}

/// Populates a target's content.
pub trait TargetLoad {
    fn load(&self, target: &mut Target) -> Result<()>;
}

/// Persists a target's content.
pub trait TargetSave {
    fn save(&self, target: &Target) -> Result<()>;
}

/// Reads and writes targets as UTF-8 files.
#[derive(Debug, Clone, Default)]
pub struct FileStore;

impl TargetLoad for FileStore {
    fn load(&self, target: &mut Target) -> Result<()> {
        let content = fs::read_to_string(&target.path)
            .map_err(|e| VersionMachineError::target_io(target.id.clone(), target.path.clone(), e))?;
        debug!(target_name = %target.id, bytes = content.len(), "loaded target");
        target.content = Some(content);
        Ok(())
    }
}

impl TargetSave for FileStore {
    fn save(&self, target: &Target) -> Result<()> {
        let content = target.loaded_content()?;
        fs::write(&target.path, content)
            .map_err(|e| VersionMachineError::target_io(target.id.clone(), target.path.clone(), e))?;
        debug!(target_name = %target.id, path = %target.path.display(), "saved target");
        Ok(())
    }
}

/// Keeps target contents in memory, keyed by path.
///
/// Useful for tests and for previewing a run without touching the filesystem.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: RefCell<HashMap<PathBuf, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.borrow_mut().insert(path.into(), content.into());
    }

    pub fn get(&self, path: impl Into<PathBuf>) -> Option<String> {
        self.files.borrow().get(&path.into()).cloned()
    }
}

impl TargetLoad for MemoryStore {
    fn load(&self, target: &mut Target) -> Result<()> {
        let content = self.get(target.path.clone()).ok_or_else(|| {
            VersionMachineError::target_io(
                target.id.clone(),
                target.path.clone(),
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such entry"),
            )
        })?;
        target.content = Some(content);
        Ok(())
    }
}

impl TargetSave for MemoryStore {
    fn save(&self, target: &Target) -> Result<()> {
        let content = target.loaded_content()?;
        self.insert(target.path.clone(), content);
        Ok(())
    }
}
