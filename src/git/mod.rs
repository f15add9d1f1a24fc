//! Version-control collaborator
//!
//! The bump workflow needs exactly two facts from version control: whether the
//! working tree differs from HEAD, and a short identifier for HEAD. This module
//! provides a trait for those queries so the workflow can run against a real
//! repository or a scripted one.
//!
//! - [repository::Git2Repository]: A real implementation using the `git2` crate
//! - [mock::MockRepository]: A scripted implementation for tests and dry runs
//!
//! ```rust
//! # use version_machine::git::{MockRepository, VersionControl};
//! let repo = MockRepository::new("a1b2c3d");
//! assert_eq!(repo.current_commit_id().unwrap(), "a1b2c3d");
//! assert!(repo.diff_status().unwrap().is_empty());
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::error::Result;

/// Queries the workflow makes against version control.
///
/// Both calls are synchronous and are not retried; an error aborts the run.
pub trait VersionControl {
    /// Returns the diff of the working tree and index against HEAD.
    ///
    /// An empty string means the tree is clean. Untracked files are not
    /// considered, matching `git diff HEAD`.
    fn diff_status(&self) -> Result<String>;

    /// Returns the abbreviated object id of HEAD, as `git rev-parse --short HEAD` would.
    fn current_commit_id(&self) -> Result<String>;
}
