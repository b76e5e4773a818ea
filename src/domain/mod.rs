//! Domain logic - pure update rules independent of git operations

pub mod commit;
pub mod pattern;
pub mod request;
pub mod tag;

pub use commit::{commit_message, CommitAuthor, CommitInfo};
pub use pattern::MatchPattern;
pub use request::UpdateRequest;
pub use tag::{detect_current_tag, is_up_to_date, plan_update, substitute, FileContent, TagDecision};
