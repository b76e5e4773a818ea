//! User-facing output.
//!
//! Separates concerns:
//! - `formatter` - Pure formatting functions
//! - This module - Writing to stdout/stderr
//!
//! Status and error lines go to stderr next to the log output. Stdout only
//! carries the dry-run preview so it can be piped.

pub mod formatter;

pub use formatter::{format_error, format_outcome, format_status, format_success};

use crate::cli::UpdateOutcome;
use crate::error::TagBumpError;

pub fn display_error(err: &TagBumpError) {
    eprintln!("{}", format_error(err));
}

pub fn display_success(message: &str) {
    eprintln!("{}", format_success(message));
}

pub fn display_status(message: &str) {
    eprintln!("{}", format_status(message));
}

/// Report a finished run; a dry run also prints the would-be file content
/// to stdout.
pub fn display_outcome(outcome: &UpdateOutcome, file: &str, desired: &str) {
    display_success(&format_outcome(outcome, file, desired));

    if let UpdateOutcome::DryRun { content, .. } = outcome {
        print!("{}", content);
    }
}
