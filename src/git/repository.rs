use std::cell::RefCell;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use git2::build::RepoBuilder;
use git2::{
    CredentialType, ErrorClass, ErrorCode, FetchOptions, PushOptions, RemoteCallbacks,
    Repository as Git2Repo, Signature,
};
use tempfile::TempDir;
use tracing::debug;

use crate::cancel::CancelToken;
use crate::config::Credentials;
use crate::domain::{CommitAuthor, CommitInfo};
use crate::error::{Result, Stage, TagBumpError};
use crate::git::{Repository, WorkingCopy};

/// Clones remotes over HTTPS with a user/token pair.
pub struct Git2Repository {
    credentials: Credentials,
}

impl Git2Repository {
    pub fn new(credentials: Credentials) -> Self {
        Git2Repository { credentials }
    }
}

/// A clone living in a temporary directory that is removed on drop.
pub struct Git2WorkingCopy {
    // declared before `dir` so the repository is closed before the directory goes
    repo: Git2Repo,
    credentials: Credentials,
    dir: TempDir,
}

impl Git2WorkingCopy {
    /// Root of the working tree.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// The underlying git2 repository.
    pub fn git2(&self) -> &Git2Repo {
        &self.repo
    }

    /// Resolve `path` to a regular file inside the working tree.
    ///
    /// Symlinks are refused, as is anything whose real location is outside
    /// the checkout (a symlinked parent directory, for instance).
    fn confined(&self, path: &str) -> io::Result<PathBuf> {
        let full = self.dir.path().join(path);

        let meta = fs::symlink_metadata(&full)?;
        if meta.file_type().is_symlink() {
            return Err(io::Error::new(ErrorKind::Other, "is a symbolic link"));
        }
        if !meta.is_file() {
            return Err(io::Error::new(ErrorKind::Other, "not a regular file"));
        }

        let root = self.dir.path().canonicalize()?;
        if !full.canonicalize()?.starts_with(&root) {
            return Err(io::Error::new(
                ErrorKind::Other,
                "resolves outside the working tree",
            ));
        }

        Ok(full)
    }
}

impl Repository for Git2Repository {
    type WorkingCopy = Git2WorkingCopy;

    fn checkout(&self, location: &str, cancel: &CancelToken) -> Result<Git2WorkingCopy> {
        if cancel.is_cancelled() {
            return Err(TagBumpError::Cancelled(Stage::Checkout));
        }

        let dir = tempfile::Builder::new()
            .prefix("tagbump-")
            .tempdir()
            .map_err(|e| {
                TagBumpError::checkout(format!("Cannot create working copy directory: {}", e))
            })?;

        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(remote_callbacks(&self.credentials, cancel));

        debug!(path = %dir.path().display(), "cloning into temporary working copy");

        let repo = RepoBuilder::new()
            .fetch_options(fetch_options)
            .clone(location, dir.path())
            .map_err(|e| {
                if cancel.is_cancelled() {
                    TagBumpError::Cancelled(Stage::Checkout)
                } else {
                    TagBumpError::checkout(format!("Cannot clone '{}': {}", location, describe(&e)))
                }
            })?;

        // An empty remote clones fine but has no branch to commit on
        if let Err(e) = repo.head() {
            return Err(TagBumpError::checkout(format!(
                "Repository '{}' has no checked out branch: {}",
                location,
                e.message()
            )));
        }

        Ok(Git2WorkingCopy {
            repo,
            credentials: self.credentials.clone(),
            dir,
        })
    }
}

impl WorkingCopy for Git2WorkingCopy {
    fn read_file(&self, path: &str) -> Result<String> {
        match self.confined(path).and_then(fs::read_to_string) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(TagBumpError::FileNotFound(path.to_string()))
            }
            Err(e) => Err(TagBumpError::FileNotFound(format!("{} ({})", path, e))),
        }
    }

    fn write_file(&mut self, path: &str, content: &str) -> Result<()> {
        self.confined(path)
            .and_then(|full| fs::write(full, content))
            .map_err(|e| TagBumpError::write(format!("Cannot write {}: {}", path, e)))
    }

    fn stage(&mut self, path: &str) -> Result<()> {
        let mut index = self
            .repo
            .index()
            .map_err(|e| TagBumpError::stage_failed(format!("Cannot open index: {}", e)))?;

        index
            .add_path(Path::new(path))
            .map_err(|e| TagBumpError::stage_failed(format!("Cannot add {}: {}", path, e)))?;

        index
            .write()
            .map_err(|e| TagBumpError::stage_failed(format!("Cannot write index: {}", e)))?;

        Ok(())
    }

    fn commit(
        &mut self,
        message: &str,
        author: &CommitAuthor,
        timestamp: DateTime<Utc>,
    ) -> Result<CommitInfo> {
        let commit_err = |e: git2::Error| TagBumpError::commit(e.message().to_string());

        let parent = self
            .repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .map_err(|e| TagBumpError::commit(format!("Cannot resolve branch head: {}", e)))?;

        let tree_id = self.repo.index().and_then(|mut i| i.write_tree()).map_err(commit_err)?;
        let tree = self.repo.find_tree(tree_id).map_err(commit_err)?;

        let when = git2::Time::new(timestamp.timestamp(), 0);
        let signature = Signature::new(&author.name, &author.email, &when).map_err(commit_err)?;

        let oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &[&parent])
            .map_err(commit_err)?;

        Ok(CommitInfo {
            id: oid.to_string(),
            message: message.to_string(),
            author: author.clone(),
            timestamp,
            parent: parent.id().to_string(),
        })
    }

    fn push(&mut self, remote_name: &str, force: bool, cancel: &CancelToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(TagBumpError::Cancelled(Stage::Push));
        }

        let head = self
            .repo
            .head()
            .map_err(|e| TagBumpError::push(format!("Cannot resolve branch head: {}", e)))?;
        let branch_ref = head
            .name()
            .ok_or_else(|| TagBumpError::push("Branch name is not valid UTF-8"))?
            .to_string();

        let refspec = if force {
            format!("+{}:{}", branch_ref, branch_ref)
        } else {
            format!("{}:{}", branch_ref, branch_ref)
        };

        let mut remote = self.repo.find_remote(remote_name).map_err(|_| {
            TagBumpError::push(format!("No remote named '{}' found", remote_name))
        })?;

        let rejection: RefCell<Option<String>> = RefCell::new(None);

        let mut callbacks = remote_callbacks(&self.credentials, cancel);
        callbacks.push_negotiation(|_updates| {
            if cancel.is_cancelled() {
                Err(git2::Error::from_str("push cancelled"))
            } else {
                Ok(())
            }
        });
        callbacks.push_update_reference(|refname, status| {
            if let Some(status) = status {
                *rejection.borrow_mut() = Some(format!("{} rejected by remote: {}", refname, status));
            }
            Ok(())
        });

        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(callbacks);

        debug!(refspec = %refspec, remote = remote_name, "pushing");

        remote
            .push(&[refspec.as_str()], Some(&mut push_options))
            .map_err(|e| {
                if cancel.is_cancelled() {
                    TagBumpError::Cancelled(Stage::Push)
                } else {
                    TagBumpError::push(describe(&e))
                }
            })?;

        let rejected = rejection.borrow().clone();
        match rejected {
            Some(reason) => Err(TagBumpError::push(reason)),
            None => Ok(()),
        }
    }
}

/// Callbacks shared by clone and push: basic auth with the configured pair,
/// and transfer aborts once the token fires.
fn remote_callbacks<'a>(credentials: &'a Credentials, cancel: &'a CancelToken) -> RemoteCallbacks<'a> {
    let mut callbacks = RemoteCallbacks::new();

    // libgit2 asks again after a rejected credential; fail instead of looping
    let mut attempts = 0;
    callbacks.credentials(move |_url, _username_from_url, allowed_types| {
        attempts += 1;
        if attempts > 1 {
            return Err(git2::Error::new(
                ErrorCode::Auth,
                ErrorClass::Http,
                "credentials were rejected by the remote",
            ));
        }

        if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) {
            git2::Cred::userpass_plaintext(&credentials.user, &credentials.token)
        } else {
            Err(git2::Error::new(
                ErrorCode::Auth,
                ErrorClass::Http,
                "remote does not accept user/token authentication",
            ))
        }
    });

    callbacks.transfer_progress(move |_progress| !cancel.is_cancelled());

    callbacks
}

fn describe(e: &git2::Error) -> String {
    match (e.code(), e.class()) {
        (ErrorCode::Auth, _) => format!("authentication failed: {}", e.message()),
        (ErrorCode::NotFastForward, _) => format!(
            "remote rejected a non-fast-forward update (use --force to overwrite): {}",
            e.message()
        ),
        (ErrorCode::NotFound, _) => format!("not found: {}", e.message()),
        (_, ErrorClass::Net) | (_, ErrorClass::Http) | (_, ErrorClass::Ssl) => {
            format!("network error: {}", e.message())
        }
        _ => e.message().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_auth() {
        let e = git2::Error::new(ErrorCode::Auth, ErrorClass::Http, "401");
        assert_eq!(describe(&e), "authentication failed: 401");
    }

    #[test]
    fn test_describe_network() {
        let e = git2::Error::new(ErrorCode::GenericError, ErrorClass::Net, "connection reset");
        assert_eq!(describe(&e), "network error: connection reset");
    }

    #[test]
    fn test_describe_non_fast_forward_suggests_force() {
        let e = git2::Error::new(ErrorCode::NotFastForward, ErrorClass::Reference, "stale");
        assert!(describe(&e).contains("--force"));
    }

    #[test]
    fn test_checkout_honours_cancelled_token() {
        let repo = Git2Repository::new(Credentials::new("u", "t"));
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = repo.checkout("https://invalid.example/none.git", &cancel).err().unwrap();
        assert!(matches!(err, TagBumpError::Cancelled(Stage::Checkout)));
    }

    #[test]
    fn test_checkout_missing_repository() {
        let repo = Git2Repository::new(Credentials::new("u", "t"));
        let missing = tempfile::tempdir().unwrap();
        let location = missing.path().join("nope");

        let err = repo
            .checkout(location.to_str().unwrap(), &CancelToken::new())
            .err()
            .unwrap();
        assert!(matches!(err, TagBumpError::Checkout(_)));
    }
}
