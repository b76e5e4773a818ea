use std::fmt;

use thiserror::Error;

/// The step of an update run at which a failure originated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Config,
    Checkout,
    Read,
    Detect,
    Write,
    Stage,
    Commit,
    Push,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Config => "config",
            Stage::Checkout => "checkout",
            Stage::Read => "read",
            Stage::Detect => "detect",
            Stage::Write => "write",
            Stage::Stage => "stage",
            Stage::Commit => "commit",
            Stage::Push => "push",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unified error type for tagbump operations
#[derive(Error, Debug)]
pub enum TagBumpError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Checkout failed: {0}")]
    Checkout(String),

    #[error("File not found in working copy: {0}")]
    FileNotFound(String),

    #[error("Pattern '{pattern}' did not match anything in {path}")]
    PatternNotFound { path: String, pattern: String },

    #[error("Write failed: {0}")]
    Write(String),

    #[error("Staging failed: {0}")]
    Stage(String),

    #[error("Commit failed: {0}")]
    Commit(String),

    #[error("Push failed: {0}")]
    Push(String),

    #[error("Run cancelled during {0}")]
    Cancelled(Stage),
}

/// Convenience type alias for Results in tagbump
pub type Result<T> = std::result::Result<T, TagBumpError>;

impl TagBumpError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        TagBumpError::Config(msg.into())
    }

    pub fn checkout(msg: impl Into<String>) -> Self {
        TagBumpError::Checkout(msg.into())
    }

    pub fn write(msg: impl Into<String>) -> Self {
        TagBumpError::Write(msg.into())
    }

    pub fn stage_failed(msg: impl Into<String>) -> Self {
        TagBumpError::Stage(msg.into())
    }

    pub fn commit(msg: impl Into<String>) -> Self {
        TagBumpError::Commit(msg.into())
    }

    pub fn push(msg: impl Into<String>) -> Self {
        TagBumpError::Push(msg.into())
    }

    /// The run stage this error originated from
    pub fn stage(&self) -> Stage {
        match self {
            TagBumpError::Config(_) => Stage::Config,
            TagBumpError::Checkout(_) => Stage::Checkout,
            TagBumpError::FileNotFound(_) => Stage::Read,
            TagBumpError::PatternNotFound { .. } => Stage::Detect,
            TagBumpError::Write(_) => Stage::Write,
            TagBumpError::Stage(_) => Stage::Stage,
            TagBumpError::Commit(_) => Stage::Commit,
            TagBumpError::Push(_) => Stage::Push,
            TagBumpError::Cancelled(stage) => *stage,
        }
    }

    /// Process exit code for this failure.
    ///
    /// Configuration problems are the caller's to fix and exit with 2; every
    /// other aborted run exits with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            TagBumpError::Config(_) => 2,
            _ => 1,
        }
    }
}
