//! Terminal formatting for run output.
//!
//! Status and success lines go to stdout; warnings and errors go to stderr.

use crate::pipeline::TargetChange;
use crate::warning::RunWarning;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("\x1b[31mERROR:\x1b[0m {}", message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("\x1b[32m✓\x1b[0m {}", message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("\x1b[33m→\x1b[0m {}", message);
}

/// Display a run warning with a yellow warning icon.
pub fn display_warning(warning: &RunWarning) {
    eprintln!("\x1b[33m⚠ WARNING:\x1b[0m {}", warning);
}

/// Format a target's version change as a single line.
///
/// Targets without a declaration show only the version that was computed.
pub fn format_version_change(change: &TargetChange) -> String {
    if change.declared {
        format!(
            "{}: \x1b[31m{}\x1b[0m -> \x1b[32m{}\x1b[0m",
            change.target, change.previous, change.next
        )
    } else {
        format!("{}: (undeclared) -> {}", change.target, change.next)
    }
}

/// Display every target's version change.
///
/// # Arguments
/// * `changes` - Changes in the order the targets were visited
/// * `dry_run` - Whether the changes were only computed
pub fn display_version_changes(changes: &[TargetChange], dry_run: bool) {
    if dry_run {
        println!("\n\x1b[1mDry run, nothing written:\x1b[0m");
    } else {
        println!("\n\x1b[1mUpdated versions:\x1b[0m");
    }
    for change in changes {
        println!("  {}", format_version_change(change));
    }
}
