//! Working-tree cleanliness gate.

use tracing::debug;

use crate::error::{Result, VersionMachineError};

/// State of the working tree as reported by the version-control collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeStatus {
    Clean,
    Dirty,
}

/// Evaluates the output of a diff against HEAD.
///
/// Any non-empty `status_text` means the tree is dirty. A dirty tree fails with
/// [`VersionMachineError::DirtyTree`] when `strict`, and is reported as
/// [`TreeStatus::Dirty`] otherwise so the caller can warn and continue.
pub fn evaluate(status_text: &str, strict: bool) -> Result<TreeStatus> {
    if status_text.is_empty() {
        debug!("working tree is clean");
        return Ok(TreeStatus::Clean);
    }

    debug!(strict, changed_bytes = status_text.len(), "working tree is dirty");
    if strict {
        Err(VersionMachineError::DirtyTree)
    } else {
        Ok(TreeStatus::Dirty)
    }
}
