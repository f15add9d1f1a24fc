//! Programmatic entry points behind the command line.

pub mod orchestration;

pub use orchestration::{run_version_workflow, LockEntry, WorkflowArgs, WorkflowResult};
