use chrono::{DateTime, Utc};

pub const DEFAULT_AUTHOR_NAME: &str = "tagbump";
pub const DEFAULT_AUTHOR_EMAIL: &str = "tagbump@users.noreply.github.com";
pub const DEFAULT_MESSAGE_TEMPLATE: &str = "auto bump: {tag}";

/// Identity recorded as both author and committer of bump commits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitAuthor {
    pub name: String,
    pub email: String,
}

impl CommitAuthor {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        CommitAuthor {
            name: name.into(),
            email: email.into(),
        }
    }
}

impl Default for CommitAuthor {
    fn default() -> Self {
        CommitAuthor::new(DEFAULT_AUTHOR_NAME, DEFAULT_AUTHOR_EMAIL)
    }
}

/// A commit created in the working copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// Full commit hash
    pub id: String,
    pub message: String,
    pub author: CommitAuthor,
    pub timestamp: DateTime<Utc>,
    /// Hash of the branch head the commit was created on
    pub parent: String,
}

impl CommitInfo {
    pub fn short_id(&self) -> &str {
        self.id.get(..7).unwrap_or(&self.id)
    }
}

/// Render a commit message template; `{tag}` is replaced by the tag.
pub fn commit_message(template: &str, tag: &str) -> String {
    template.replace("{tag}", tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_message() {
        assert_eq!(commit_message(DEFAULT_MESSAGE_TEMPLATE, "v1.2.3"), "auto bump: v1.2.3");
    }

    #[test]
    fn test_template_without_placeholder() {
        assert_eq!(commit_message("bump", "v1"), "bump");
    }

    #[test]
    fn test_short_id() {
        let info = CommitInfo {
            id: "0123456789abcdef".to_string(),
            message: "m".to_string(),
            author: CommitAuthor::default(),
            timestamp: Utc::now(),
            parent: "fedcba".to_string(),
        };
        assert_eq!(info.short_id(), "0123456");
    }
}
