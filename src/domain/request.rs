use std::path::{Component, Path};

use crate::domain::MatchPattern;
use crate::error::{Result, TagBumpError};

/// Parameters of a single update run.
///
/// Validated once on construction and read-only afterwards.
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    repository: String,
    file_path: String,
    pattern: MatchPattern,
    desired_tag: String,
    dry_run: bool,
}

impl UpdateRequest {
    /// Build a request, rejecting empty values and file paths that would
    /// leave the working copy.
    pub fn new(
        repository: impl Into<String>,
        file_path: impl Into<String>,
        pattern: MatchPattern,
        desired_tag: impl Into<String>,
    ) -> Result<Self> {
        let repository = repository.into();
        let file_path = file_path.into();
        let desired_tag = desired_tag.into();

        require_non_empty("repository", &repository)?;
        require_non_empty("file", &file_path)?;
        require_non_empty("tag", &desired_tag)?;
        validate_relative_path(&file_path)?;

        Ok(UpdateRequest {
            repository,
            file_path,
            pattern,
            desired_tag,
            dry_run: false,
        })
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn pattern(&self) -> &MatchPattern {
        &self.pattern
    }

    pub fn desired_tag(&self) -> &str {
        &self.desired_tag
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }
}

fn require_non_empty(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(TagBumpError::config(format!("Invalid {}: value is empty", name)));
    }
    Ok(())
}

fn validate_relative_path(path: &str) -> Result<()> {
    let escapes = Path::new(path).components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });

    if escapes {
        return Err(TagBumpError::config(format!(
            "Invalid file: '{}' must be a path inside the repository",
            path
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern() -> MatchPattern {
        MatchPattern::new(r"(tag: )(\S+)()").unwrap()
    }

    #[test]
    fn test_request_defaults_to_real_run() {
        let req = UpdateRequest::new("https://example.com/r.git", "a.yaml", pattern(), "v1").unwrap();
        assert!(!req.dry_run());
        assert_eq!(req.desired_tag(), "v1");
        assert_eq!(req.file_path(), "a.yaml");
    }

    #[test]
    fn test_request_dry_run() {
        let req = UpdateRequest::new("r", "a.yaml", pattern(), "v1")
            .unwrap()
            .with_dry_run(true);
        assert!(req.dry_run());
    }

    #[test]
    fn test_request_rejects_empty_fields() {
        assert!(UpdateRequest::new("", "a.yaml", pattern(), "v1").is_err());
        assert!(UpdateRequest::new("r", "", pattern(), "v1").is_err());
        assert!(UpdateRequest::new("r", "a.yaml", pattern(), "  ").is_err());
    }

    #[test]
    fn test_request_rejects_escaping_paths() {
        for path in ["../secrets.yaml", "/etc/passwd", "deploy/../../x"] {
            let err = UpdateRequest::new("r", path, pattern(), "v1").unwrap_err();
            assert!(matches!(err, TagBumpError::Config(_)), "{} accepted", path);
        }
    }

    #[test]
    fn test_request_accepts_nested_paths() {
        assert!(UpdateRequest::new("r", "deploy/overlays/prod/kustomization.yaml", pattern(), "v1").is_ok());
    }
}
