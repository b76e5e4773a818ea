//! Pure formatting functions for UI output.
//!
//! Everything here returns a `String`; printing happens in the parent module.
//! All of it is destined for stderr, so styling follows stderr's terminal.

use console::style;

use crate::cli::UpdateOutcome;
use crate::error::TagBumpError;

/// `ERROR: [stage] message` line for a failed run.
pub fn format_error(err: &TagBumpError) -> String {
    format!(
        "{} [{}] {}",
        style("ERROR:").for_stderr().red().bold(),
        err.stage(),
        err
    )
}

pub fn format_success(message: &str) -> String {
    format!("{} {}", style("✓").for_stderr().green(), message)
}

pub fn format_status(message: &str) -> String {
    format!("{} {}", style("→").for_stderr().yellow(), message)
}

/// One-line summary of a finished run.
pub fn format_outcome(outcome: &UpdateOutcome, file: &str, desired: &str) -> String {
    match outcome {
        UpdateOutcome::UpToDate { tag } => {
            format!("{} already at {}, nothing to do", file, style(tag).for_stderr().green())
        }
        UpdateOutcome::Pushed {
            previous_tag,
            commit,
        } => format!(
            "{}: {} -> {} (commit {} pushed)",
            file,
            style(previous_tag).for_stderr().red(),
            style(desired).for_stderr().green(),
            commit.short_id()
        ),
        UpdateOutcome::DryRun {
            previous_tag,
            commit,
            ..
        } => format!(
            "dry run: {}: {} -> {} (local commit {} not pushed)",
            file,
            style(previous_tag).for_stderr().red(),
            style(desired).for_stderr().green(),
            commit.short_id()
        ),
    }
}
