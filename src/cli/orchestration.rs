//! Update run orchestration
//!
//! Sequences a single run: checkout, read, decide, write, stage, commit and
//! push. Each step must finish before the next starts and the first failure
//! ends the run. Nothing is rolled back; the working copy is simply dropped.
//! Re-running after a failure is safe because a run that finds the desired
//! tag already in place does nothing.

use chrono::Utc;
use tracing::info;

use crate::cancel::CancelToken;
use crate::config::Config;
use crate::domain::{commit_message, plan_update, CommitAuthor, CommitInfo, FileContent, TagDecision, UpdateRequest};
use crate::error::{Result, Stage, TagBumpError};
use crate::git::{Repository, WorkingCopy};

/// Push policy and commit identity for a run
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// Remote to push to
    pub remote: String,

    /// Overwrite the remote branch even when the update is not a fast-forward
    pub force: bool,

    pub author: CommitAuthor,

    /// Commit message template; `{tag}` is replaced by the desired tag
    pub message_template: String,
}

impl RunOptions {
    pub fn from_config(config: &Config) -> Self {
        RunOptions {
            remote: config.git.remote.clone(),
            force: config.git.force,
            author: config.commit.author(),
            message_template: config.commit.message.clone(),
        }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions::from_config(&Config::default())
    }
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The file already carries the desired tag; nothing was written
    UpToDate { tag: String },

    /// A commit replacing `previous_tag` was pushed
    Pushed {
        previous_tag: String,
        commit: CommitInfo,
    },

    /// A commit was created locally and not pushed; `content` is the
    /// substituted file text
    DryRun {
        previous_tag: String,
        commit: CommitInfo,
        content: String,
    },
}

/// Run one update against `repo`.
///
/// # Errors
/// The first failing step's error, tagged with its stage. Cancellation is
/// checked before the checkout and again before the push, so a cancelled run
/// never pushes.
pub fn run_update<R: Repository>(
    repo: &R,
    request: &UpdateRequest,
    options: &RunOptions,
    cancel: &CancelToken,
) -> Result<UpdateOutcome> {
    let path = request.file_path();
    let desired = request.desired_tag();

    info!(repo = request.repository(), "cloning repository");
    let mut copy = repo.checkout(request.repository(), cancel)?;

    let file = FileContent::new(path, copy.read_file(path)?);
    info!(file = path, bytes = file.text.len(), "read target file");

    let (previous_tag, content) = match plan_update(&file, request.pattern(), desired)? {
        TagDecision::UpToDate { current } => {
            info!(tag = %current, "tag already up to date, nothing to do");
            return Ok(UpdateOutcome::UpToDate { tag: current });
        }
        TagDecision::Update { current, content } => (current, content),
    };

    info!(
        current = %previous_tag,
        desired,
        pattern = %request.pattern(),
        "replacing tag"
    );
    copy.write_file(path, &content)?;
    copy.stage(path)?;

    let message = commit_message(&options.message_template, desired);
    let commit = copy.commit(&message, &options.author, Utc::now())?;
    info!(commit = %commit.id, parent = %commit.parent, message = %commit.message, "created commit");

    if request.dry_run() {
        info!("dry run complete, remote left untouched");
        return Ok(UpdateOutcome::DryRun {
            previous_tag,
            commit,
            content,
        });
    }

    if cancel.is_cancelled() {
        return Err(TagBumpError::Cancelled(Stage::Push));
    }

    info!(remote = %options.remote, force = options.force, "pushing commit to remote");
    copy.push(&options.remote, options.force, cancel)?;
    info!(commit = %commit.id, "remote repository updated");

    Ok(UpdateOutcome::Pushed {
        previous_tag,
        commit,
    })
}
