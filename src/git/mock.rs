use crate::error::Result;
use crate::git::VersionControl;

/// Scripted repository for testing without actual git operations
#[derive(Debug, Clone)]
pub struct MockRepository {
    commit_id: String,
    status: String,
}

impl MockRepository {
    /// Create a clean mock repository whose HEAD is `commit_id`
    pub fn new(commit_id: impl Into<String>) -> Self {
        MockRepository {
            commit_id: commit_id.into(),
            status: String::new(),
        }
    }

    /// Make the working tree report `status` as its diff against HEAD
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new("0000000")
    }
}

impl VersionControl for MockRepository {
    fn diff_status(&self) -> Result<String> {
        Ok(self.status.clone())
    }

    fn current_commit_id(&self) -> Result<String> {
        Ok(self.commit_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_repository_basic() {
        let repo = MockRepository::new("abc1234");
        assert_eq!(repo.current_commit_id().unwrap(), "abc1234");
        assert_eq!(repo.diff_status().unwrap(), "");
    }

    #[test]
    fn test_mock_repository_dirty() {
        let repo = MockRepository::new("abc1234").with_status("M version.py");
        assert_eq!(repo.diff_status().unwrap(), "M version.py");
    }
}
