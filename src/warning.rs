use std::fmt;

/// Non-fatal conditions raised during a run.
/// These are reported to the user; none of them changes the exit status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunWarning {
    /// The working tree has uncommitted changes and the check was forced
    DirtyTree,
    /// HEAD already has a recorded version; nothing was changed
    LockedCommit { commit: String, version: String },
    /// A target declares no `__version__`, so its content was left untouched
    UndeclaredVersion { target: String },
}

impl fmt::Display for RunWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunWarning::DirtyTree => write!(f, "Git status is not clean."),
            RunWarning::LockedCommit { commit, version } => write!(
                f,
                "HEAD ({}) is locked to version {}. No actions taken.",
                commit, version
            ),
            RunWarning::UndeclaredVersion { target } => write!(
                f,
                "Target '{}' has no __version__ declaration; content left unchanged",
                target
            ),
        }
    }
}
