use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::cancel::CancelToken;
use crate::domain::{CommitAuthor, CommitInfo};
use crate::error::{Result, Stage, TagBumpError};
use crate::git::{Repository, WorkingCopy};

const ROOT_COMMIT: &str = "0000000000000000000000000000000000000001";

#[derive(Debug)]
struct RemoteState {
    files: HashMap<String, String>,
    head: String,
    history: Vec<CommitInfo>,
    checkouts: usize,
    pushes: usize,
    next_id: u64,
}

impl RemoteState {
    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        format!("{:040x}", self.next_id)
    }
}

/// In-memory remote for testing without actual git operations.
///
/// Clones share the remote state, so the effect of a push is visible to the
/// next checkout. A failure can be injected at any stage.
#[derive(Debug, Clone)]
pub struct MockRepository {
    remote: Arc<Mutex<RemoteState>>,
    fail_at: Option<Stage>,
}

impl MockRepository {
    /// Create a new empty mock remote
    pub fn new() -> Self {
        MockRepository {
            remote: Arc::new(Mutex::new(RemoteState {
                files: HashMap::new(),
                head: ROOT_COMMIT.to_string(),
                history: Vec::new(),
                checkouts: 0,
                pushes: 0,
                next_id: 1,
            })),
            fail_at: None,
        }
    }

    /// Add a file to the remote's branch head
    pub fn with_file(self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.lock().files.insert(path.into(), content.into());
        self
    }

    /// Make the given stage fail on every run
    pub fn failing_at(mut self, stage: Stage) -> Self {
        self.fail_at = Some(stage);
        self
    }

    /// Simulate another writer moving the remote branch forward
    pub fn advance_remote(&self) -> String {
        let mut remote = self.lock();
        let id = remote.allocate_id();
        remote.head = id.clone();
        id
    }

    pub fn remote_file(&self, path: &str) -> Option<String> {
        self.lock().files.get(path).cloned()
    }

    pub fn remote_head(&self) -> String {
        self.lock().head.clone()
    }

    /// Commits that reached the remote, oldest first
    pub fn pushed_commits(&self) -> Vec<CommitInfo> {
        self.lock().history.clone()
    }

    pub fn push_count(&self) -> usize {
        self.lock().pushes
    }

    pub fn checkout_count(&self) -> usize {
        self.lock().checkouts
    }

    fn lock(&self) -> MutexGuard<'_, RemoteState> {
        self.remote.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MockRepository {
    type WorkingCopy = MockWorkingCopy;

    fn checkout(&self, location: &str, cancel: &CancelToken) -> Result<MockWorkingCopy> {
        if cancel.is_cancelled() {
            return Err(TagBumpError::Cancelled(Stage::Checkout));
        }
        if self.fail_at == Some(Stage::Checkout) {
            return Err(TagBumpError::checkout(format!("Cannot clone '{}': injected failure", location)));
        }

        let mut remote = self.lock();
        remote.checkouts += 1;

        Ok(MockWorkingCopy {
            files: remote.files.clone(),
            staged: HashSet::new(),
            base: remote.head.clone(),
            head: remote.head.clone(),
            commits: Vec::new(),
            remote: Arc::clone(&self.remote),
            fail_at: self.fail_at,
        })
    }
}

/// Working copy handed out by [MockRepository]
#[derive(Debug)]
pub struct MockWorkingCopy {
    files: HashMap<String, String>,
    staged: HashSet<String>,
    base: String,
    head: String,
    commits: Vec<CommitInfo>,
    remote: Arc<Mutex<RemoteState>>,
    fail_at: Option<Stage>,
}

impl MockWorkingCopy {
    /// Local content of a file, including unpushed writes
    pub fn file(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    /// Commits created locally and not yet pushed
    pub fn local_commits(&self) -> &[CommitInfo] {
        &self.commits
    }

    fn injected(&self, stage: Stage) -> bool {
        self.fail_at == Some(stage)
    }
}

impl WorkingCopy for MockWorkingCopy {
    fn read_file(&self, path: &str) -> Result<String> {
        if self.injected(Stage::Read) {
            return Err(TagBumpError::FileNotFound(format!("{} (injected failure)", path)));
        }
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| TagBumpError::FileNotFound(path.to_string()))
    }

    fn write_file(&mut self, path: &str, content: &str) -> Result<()> {
        if self.injected(Stage::Write) {
            return Err(TagBumpError::write(format!("Cannot write {}: injected failure", path)));
        }
        self.files.insert(path.to_string(), content.to_string());
        Ok(())
    }

    fn stage(&mut self, path: &str) -> Result<()> {
        if self.injected(Stage::Stage) {
            return Err(TagBumpError::stage_failed(format!("Cannot add {}: injected failure", path)));
        }
        if !self.files.contains_key(path) {
            return Err(TagBumpError::stage_failed(format!("Cannot add {}: unknown file", path)));
        }
        self.staged.insert(path.to_string());
        Ok(())
    }

    fn commit(
        &mut self,
        message: &str,
        author: &CommitAuthor,
        timestamp: DateTime<Utc>,
    ) -> Result<CommitInfo> {
        if self.injected(Stage::Commit) {
            return Err(TagBumpError::commit("injected failure"));
        }
        if self.staged.is_empty() {
            return Err(TagBumpError::commit("nothing staged"));
        }

        let id = self
            .remote
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .allocate_id();

        let info = CommitInfo {
            id: id.clone(),
            message: message.to_string(),
            author: author.clone(),
            timestamp,
            parent: self.head.clone(),
        };

        self.staged.clear();
        self.head = id;
        self.commits.push(info.clone());
        Ok(info)
    }

    fn push(&mut self, remote_name: &str, force: bool, cancel: &CancelToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(TagBumpError::Cancelled(Stage::Push));
        }
        if self.injected(Stage::Push) {
            return Err(TagBumpError::push(format!("{}: injected failure", remote_name)));
        }
        if remote_name != "origin" {
            return Err(TagBumpError::push(format!("No remote named '{}' found", remote_name)));
        }

        let mut remote = self.remote.lock().unwrap_or_else(PoisonError::into_inner);
        if remote.head != self.base && !force {
            return Err(TagBumpError::push(
                "remote rejected a non-fast-forward update (use --force to overwrite)",
            ));
        }

        remote.files = self.files.clone();
        remote.head = self.head.clone();
        remote.history.extend(self.commits.drain(..));
        remote.pushes += 1;
        self.base = self.head.clone();
        Ok(())
    }
}
