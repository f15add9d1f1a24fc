use std::path::Path;

use git2::{DiffFormat, DiffOptions, Repository as Git2Repo};
use tracing::{debug, instrument};

use crate::error::{Result, VersionMachineError};

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }
}

impl super::VersionControl for Git2Repository {
    #[instrument(skip(self))]
    fn diff_status(&self) -> Result<String> {
        let head_tree = self.repo.head()?.peel_to_tree()?;

        let mut options = DiffOptions::new();
        let diff = self
            .repo
            .diff_tree_to_workdir_with_index(Some(&head_tree), Some(&mut options))?;

        let mut patch = String::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            if matches!(line.origin(), '+' | '-' | ' ') {
                patch.push(line.origin());
            }
            patch.push_str(&String::from_utf8_lossy(line.content()));
            true
        })?;

        debug!(files = diff.deltas().len(), "diff against HEAD");
        Ok(patch.trim().to_string())
    }

    #[instrument(skip(self))]
    fn current_commit_id(&self) -> Result<String> {
        let commit = self.repo.head()?.peel_to_commit()?;
        let short = commit.as_object().short_id()?;

        let id = short.as_str().map(str::to_string).ok_or_else(|| {
            VersionMachineError::Git(git2::Error::from_str(
                "abbreviated commit id is not valid UTF-8",
            ))
        })?;

        debug!(commit = %id, "resolved HEAD");
        Ok(id)
    }
}
