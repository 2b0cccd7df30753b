//! MQTT topic filter syntax
//!
//! Validates subscription topic filters per the MQTT 3.1.1 and 5.0
//! specifications and classifies filter levels into literals and wildcards.

use crate::error::{AclError, Result};

/// Topic level separator
pub const LEVEL_SEPARATOR: char = '/';

/// Maximum topic filter length allowed by the MQTT wire format
pub const MAX_TOPIC_FILTER_LENGTH: usize = 65_535;

/// A single level of a topic filter
///
/// A level is a wildcard only when the whole delimited level is `+` or `#`.
/// Anything else, including `#extra` or `a+`, is a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level<'a> {
    Literal(&'a str),
    /// `+`, exactly one level
    SingleWildcard,
    /// `#`, the rest of the tree
    MultiWildcard,
}

impl<'a> Level<'a> {
    /// Classify one already-delimited level
    pub fn parse(level: &'a str) -> Self {
        match level {
            "+" => Level::SingleWildcard,
            "#" => Level::MultiWildcard,
            other => Level::Literal(other),
        }
    }
}

/// Check if a filter belongs to the reserved (`$`-prefixed) namespace
pub fn is_reserved(filter: &str) -> bool {
    filter.starts_with('$')
}

/// Syntax check applied to ACL and request filters before matching
pub trait TopicValidator: Send + Sync {
    /// Validate a subscription topic filter
    fn validate_sub_topic(&self, filter: &str) -> Result<()>;
}

/// Validator enforcing MQTT subscription filter rules
///
/// # Rules
/// * The filter must not be empty or longer than `max_length` bytes
/// * No embedded NUL characters
/// * `+` must occupy an entire level
/// * `#` must occupy an entire level and be the last character
///
/// Empty levels (`a//b`, `/a`, `a/`) are allowed.
#[derive(Debug, Clone)]
pub struct MqttTopicValidator {
    max_length: usize,
}

impl MqttTopicValidator {
    /// Create a validator with the MQTT wire-format length limit
    pub fn new() -> Self {
        Self {
            max_length: MAX_TOPIC_FILTER_LENGTH,
        }
    }

    /// Create a validator with a tighter length limit
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            max_length: max_length.min(MAX_TOPIC_FILTER_LENGTH),
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

impl Default for MqttTopicValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl TopicValidator for MqttTopicValidator {
    fn validate_sub_topic(&self, filter: &str) -> Result<()> {
        if filter.is_empty() {
            return Err(AclError::invalid("topic filter is empty"));
        }

        if filter.len() > self.max_length {
            return Err(AclError::invalid(format!(
                "topic filter is {} bytes, limit is {}",
                filter.len(),
                self.max_length
            )));
        }

        let bytes = filter.as_bytes();
        let last = bytes.len() - 1;

        for (i, &b) in bytes.iter().enumerate() {
            let starts_level = i == 0 || bytes[i - 1] == b'/';
            let ends_level = i == last || bytes[i + 1] == b'/';

            match b {
                0 => {
                    return Err(AclError::invalid(format!(
                        "topic filter contains NUL at byte {}",
                        i
                    )));
                }
                b'+' if !(starts_level && ends_level) => {
                    return Err(AclError::invalid(format!(
                        "'+' must occupy an entire level in '{}'",
                        filter
                    )));
                }
                b'#' if !starts_level || i != last => {
                    return Err(AclError::invalid(format!(
                        "'#' must be the last level in '{}'",
                        filter
                    )));
                }
                _ => {}
            }
        }

        Ok(())
    }
}
