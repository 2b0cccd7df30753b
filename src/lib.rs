//! MQTT Subscription ACL Agent for Sentinel Proxy
//!
//! Decides whether a client's requested subscription topic filter is covered
//! by the ACL filters granted to it:
//!
//! - **Matching**: wildcard-aware comparison of an ACL filter with a request
//!   filter, with `$`-namespace isolation
//! - **Templates**: `%c` (client id) and `%u` (username) substitution in ACL
//!   patterns
//! - **Backends**: static or file-based sources of ACL patterns
//! - **Evaluation**: first-match decision with a configurable default
//!
//! # Example Configuration
//!
//! ```json
//! {
//!   "acl": {
//!     "enabled": true,
//!     "default-action": "deny",
//!     "backend": {
//!       "type": "static",
//!       "patterns": ["devices/%c/#"],
//!       "users": { "alice": ["user/alice/+"] }
//!     }
//!   }
//! }
//! ```
//!
//! # Example
//!
//! ```
//! use sentinel_agent_mqtt_acl::acl::{expand, sub_topic_matches_acl};
//!
//! let acl = expand(Some("dev1"), Some("alice"), "devices/%c/+").unwrap();
//! assert_eq!(sub_topic_matches_acl(&acl, "devices/dev1/temp"), Ok(true));
//! assert_eq!(sub_topic_matches_acl("#", "$SYS/broker/load"), Ok(false));
//! ```

pub mod acl;
pub mod backend;
pub mod config;
pub mod error;
pub mod mqtt;

// Re-export main types
pub use acl::{AclDecision, AclEvaluator};
pub use config::MqttAclConfig;
pub use error::AclError;
