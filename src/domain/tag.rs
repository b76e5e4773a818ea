//! Tag detection and substitution over file text.
//!
//! The decision to update is taken from the first match only, while the
//! substitution rewrites every match in the file. A file that pins the same
//! image twice with different tags is therefore left alone when the first
//! occurrence already carries the desired tag.

use regex::Captures;

use crate::domain::MatchPattern;
use crate::error::{Result, TagBumpError};

/// Text of one file in the working copy, keyed by its repository-relative path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    pub path: String,
    pub text: String,
}

impl FileContent {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        FileContent {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// What a run should do with a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagDecision {
    /// The first match already carries the desired tag
    UpToDate { current: String },
    /// The tag differs; `content` is the fully substituted file text
    Update { current: String, content: String },
}

/// Return the tag value (group 2) of the first match of `pattern`.
///
/// A first match whose tag group did not participate yields an empty tag.
pub fn detect_current_tag<'c>(file: &'c FileContent, pattern: &MatchPattern) -> Result<&'c str> {
    let caps = pattern
        .regex()
        .captures(&file.text)
        .ok_or_else(|| TagBumpError::PatternNotFound {
            path: file.path.clone(),
            pattern: pattern.as_str().to_string(),
        })?;

    Ok(group(&caps, 2))
}

/// Byte-for-byte tag comparison.
pub fn is_up_to_date(current: &str, desired: &str) -> bool {
    current == desired
}

/// Rewrite every match as `<group 1><desired><group 3>`.
///
/// The desired tag is inserted literally; `$` sequences in it are not
/// expanded as group references.
pub fn substitute(text: &str, pattern: &MatchPattern, desired: &str) -> String {
    pattern
        .regex()
        .replace_all(text, |caps: &Captures<'_>| {
            format!("{}{}{}", group(caps, 1), desired, group(caps, 3))
        })
        .into_owned()
}

/// Decide whether `file` needs updating and, if so, produce the new text.
pub fn plan_update(file: &FileContent, pattern: &MatchPattern, desired: &str) -> Result<TagDecision> {
    let current = detect_current_tag(file, pattern)?;

    if is_up_to_date(current, desired) {
        return Ok(TagDecision::UpToDate {
            current: current.to_string(),
        });
    }

    Ok(TagDecision::Update {
        current: current.to_string(),
        content: substitute(&file.text, pattern, desired),
    })
}

fn group<'t>(caps: &Captures<'t>, index: usize) -> &'t str {
    caps.get(index).map_or("", |m| m.as_str())
}
