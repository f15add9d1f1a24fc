pub mod cli;
pub mod config;
pub mod dirty;
pub mod error;
pub mod git;
pub mod lock;
pub mod pipeline;
pub mod target;
pub mod ui;
pub mod version;
pub mod warning;

pub use error::{Result, VersionMachineError};
