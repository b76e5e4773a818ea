use std::fmt;
use std::str::FromStr;

use regex::Regex;

use crate::error::{Result, TagBumpError};

/// Number of capture groups a match pattern must declare: prefix, tag, suffix.
pub const REQUIRED_GROUPS: usize = 3;

/// A compiled match pattern with exactly three capture groups.
///
/// Group 1 is the text before the tag, group 2 is the tag value itself and
/// group 3 is the text after it. Groups 1 and 3 are written back verbatim when
/// the tag is replaced.
#[derive(Debug, Clone)]
pub struct MatchPattern {
    regex: Regex,
}

impl MatchPattern {
    /// Compile a pattern, rejecting anything that does not have exactly
    /// three capture groups.
    pub fn new(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(TagBumpError::config("Match pattern must not be empty"));
        }

        let regex = Regex::new(pattern).map_err(|e| {
            TagBumpError::config(format!("Invalid match pattern '{}': {}", pattern, e))
        })?;

        // captures_len counts the implicit whole-match group as well
        let groups = regex.captures_len() - 1;
        if groups != REQUIRED_GROUPS {
            return Err(TagBumpError::config(format!(
                "Match pattern '{}' must contain exactly {} capture groups (prefix, tag, suffix), found {}",
                pattern, REQUIRED_GROUPS, groups
            )));
        }

        Ok(MatchPattern { regex })
    }

    /// Pattern selecting the `newTag` of one image in a kustomization
    /// `images:` list.
    ///
    /// Other keys of the same list entry (`newName`, `digest`, ...) may come
    /// before `name` or between `name` and `newTag`, and lines may end in a
    /// `# comment`. `newTag` itself has to follow `name`: an entry listing
    /// `newTag` first is not matched. Quotes around the tag are kept in the
    /// prefix and suffix groups.
    pub fn kustomize_image(image: &str) -> Result<Self> {
        if image.trim().is_empty() {
            return Err(TagBumpError::config("Kustomize image name must not be empty"));
        }

        let pattern = format!(
            concat!(
                r"(?m)(^[ \t]*-[ \t]+(?:[A-Za-z]+:.*\r?\n[ \t]+)*?",
                r#"name:[ \t]*["']?{}["']?[ \t]*(?:#.*)?\r?\n"#,
                r"(?:[ \t]+(?:[A-Za-z]+:|#).*\r?\n)*?",
                r#"[ \t]+newTag:[ \t]*["']?)([^"'\s]+)(["']?)"#,
            ),
            regex::escape(image.trim())
        );
        Self::new(&pattern)
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

impl FromStr for MatchPattern {
    type Err = TagBumpError;

    fn from_str(s: &str) -> Result<Self> {
        MatchPattern::new(s)
    }
}

impl fmt::Display for MatchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_groups_accepted() {
        let pattern = MatchPattern::new(r"(tag: )(\S+)(  # pinned)").unwrap();
        assert_eq!(pattern.as_str(), r"(tag: )(\S+)(  # pinned)");
    }

    #[test]
    fn test_wrong_group_count_rejected() {
        for bad in [r"tag: \S+", r"(tag: )(\S+)", r"(a)(b)(c)(d)"] {
            let err = MatchPattern::new(bad).unwrap_err();
            assert!(
                matches!(err, TagBumpError::Config(_)),
                "expected config error for {}",
                bad
            );
        }
    }

    #[test]
    fn test_non_capturing_groups_do_not_count() {
        assert!(MatchPattern::new(r"(?:image|tag)(: )(\S+)()").is_ok());
    }

    #[test]
    fn test_named_groups_count() {
        assert!(MatchPattern::new(r"(?P<pre>tag: )(?P<tag>\S+)(?P<post>$)").is_ok());
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let err = MatchPattern::new(r"(tag: )(\S+(").unwrap_err();
        assert!(err.to_string().contains("Invalid match pattern"));
    }

    #[test]
    fn test_empty_pattern_rejected() {
        assert!(MatchPattern::new("").is_err());
    }

    #[test]
    fn test_kustomize_image_selects_named_entry() {
        let content = "images:\n- name: nginx\n  newTag: 1.0.0\n- name: redis\n  newName: my/redis\n  newTag: \"6.0\"\n";
        let pattern = MatchPattern::kustomize_image("redis").unwrap();

        let caps = pattern.regex().captures(content).unwrap();
        assert_eq!(&caps[2], "6.0");
        assert_eq!(&caps[3], "\"");
    }

    #[test]
    fn test_kustomize_image_allows_keys_before_name_and_comments() {
        let content = "images:\n- name: nginx\n  newTag: 1.0.0\n- newName: my/redis # mirror\n  name: redis # cache\n  # pinned by ops\n  newTag: \"6.0\"\n";
        let pattern = MatchPattern::kustomize_image("redis").unwrap();

        let caps = pattern.regex().captures(content).unwrap();
        assert_eq!(&caps[2], "6.0");
        assert!(caps[1].starts_with("- newName: my/redis"));
    }

    #[test]
    fn test_kustomize_image_needs_new_tag_after_name() {
        let content = "images:\n- newTag: 6.0\n  name: redis\n- name: nginx\n  newTag: 1.0.0\n";
        let pattern = MatchPattern::kustomize_image("redis").unwrap();
        assert!(pattern.regex().captures(content).is_none());
    }

    #[test]
    fn test_kustomize_image_does_not_match_prefix_names() {
        let content = "images:\n- name: redis-cache\n  newTag: 7.0\n";
        let pattern = MatchPattern::kustomize_image("redis").unwrap();
        assert!(pattern.regex().captures(content).is_none());
    }

    #[test]
    fn test_kustomize_image_escapes_name() {
        let content = "images:\n- name: ghcr.io/acme/api\n  newTag: v3\n";
        let pattern = MatchPattern::kustomize_image("ghcr.io/acme/api").unwrap();
        assert_eq!(&pattern.regex().captures(content).unwrap()[2], "v3");

        let other = "images:\n- name: ghcrXio/acme/api\n  newTag: v3\n";
        assert!(pattern.regex().captures(other).is_none());
    }

    #[test]
    fn test_kustomize_image_requires_name() {
        assert!(MatchPattern::kustomize_image("  ").is_err());
    }

    #[test]
    fn test_from_str() {
        let pattern: MatchPattern = r"(a)(b)(c)".parse().unwrap();
        assert_eq!(pattern.to_string(), "(a)(b)(c)");
    }
}
