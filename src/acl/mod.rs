//! Access Control List (ACL) module
//!
//! Provides subscription access control for MQTT topic filters.

mod evaluator;
mod matcher;
mod template;

pub use evaluator::{AclDecision, AclEvaluator};
pub use matcher::{match_acl, sub_topic_matches_acl, AclMatcher};
pub use template::{expand, has_placeholders, PatternTemplate};
