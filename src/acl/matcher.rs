//! ACL topic filter matching for subscriptions
//!
//! Decides whether a requested subscription filter is fully covered by a
//! granted ACL filter. Unlike publish matching, both sides may carry
//! wildcards, and the rules are asymmetric:
//!
//! * `#` in the ACL covers everything from its position on
//! * `#` in the request is only covered by `#` in the ACL
//! * `+` in the request is only covered by `+` (or `#`) in the ACL
//! * `+` in the ACL covers any single concrete level of the request
//!
//! Filters in the reserved `$` namespace never match filters outside it.

use crate::error::{AclError, Result};
use crate::mqtt::{is_reserved, Level, MqttTopicValidator, TopicValidator, LEVEL_SEPARATOR};
use tracing::trace;

/// Check a subscription request against an ACL filter using the default
/// MQTT validator
///
/// # Examples
/// ```
/// use sentinel_agent_mqtt_acl::acl::sub_topic_matches_acl;
///
/// assert_eq!(sub_topic_matches_acl("a/+/c", "a/b/c"), Ok(true));
/// assert_eq!(sub_topic_matches_acl("a/b", "a/+"), Ok(false));
/// assert!(sub_topic_matches_acl("a/#/c", "a/b").is_err());
/// ```
pub fn sub_topic_matches_acl(acl_filter: &str, request_filter: &str) -> Result<bool> {
    AclMatcher::new().matches(acl_filter, request_filter)
}

/// Same as [`sub_topic_matches_acl`] for callers that may hold absent filters
///
/// An absent filter is an invalid argument. An empty string is passed on to
/// the validator, which rejects it.
pub fn match_acl(acl_filter: Option<&str>, request_filter: Option<&str>) -> Result<bool> {
    match (acl_filter, request_filter) {
        (Some(acl), Some(request)) => sub_topic_matches_acl(acl, request),
        (None, _) => Err(AclError::invalid("ACL topic filter is missing")),
        (_, None) => Err(AclError::invalid("request topic filter is missing")),
    }
}

/// Subscription ACL matcher with a pluggable syntax validator
#[derive(Debug, Clone, Default)]
pub struct AclMatcher<V = MqttTopicValidator> {
    validator: V,
}

impl AclMatcher<MqttTopicValidator> {
    /// Create a matcher using the MQTT filter rules
    pub fn new() -> Self {
        Self {
            validator: MqttTopicValidator::new(),
        }
    }
}

impl<V: TopicValidator> AclMatcher<V> {
    /// Create a matcher with a custom validator
    pub fn with_validator(validator: V) -> Self {
        Self { validator }
    }

    pub fn validator(&self) -> &V {
        &self.validator
    }

    /// Check if `request_filter` is covered by `acl_filter`
    ///
    /// Returns `Ok(false)` for a definitive "no" and
    /// `Err(AclError::InvalidArgument)` when either filter fails validation.
    pub fn matches(&self, acl_filter: &str, request_filter: &str) -> Result<bool> {
        self.validator.validate_sub_topic(request_filter)?;
        self.validator.validate_sub_topic(acl_filter)?;

        if is_reserved(acl_filter) != is_reserved(request_filter) {
            trace!(
                acl = %acl_filter,
                request = %request_filter,
                "Reserved namespace mismatch"
            );
            return Ok(false);
        }

        let matched = walk_levels(acl_filter, request_filter);
        trace!(
            acl = %acl_filter,
            request = %request_filter,
            matched,
            "Subscription ACL check"
        );
        Ok(matched)
    }
}

/// Position within a topic filter, always at the start of a level
struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(filter: &'a str) -> Self {
        Self { rest: filter }
    }

    fn at_end(&self) -> bool {
        self.rest.is_empty()
    }

    /// Text of the current level, up to the next separator or end of input
    fn level(&self) -> &'a str {
        match self.rest.find(LEVEL_SEPARATOR) {
            Some(end) => &self.rest[..end],
            None => self.rest,
        }
    }

    fn advance(&mut self, len: usize) {
        self.rest = &self.rest[len..];
    }

    fn skip_separator(&mut self) {
        self.rest = self.rest.strip_prefix(LEVEL_SEPARATOR).unwrap_or(self.rest);
    }
}

/// Walk both validated filters level by level
///
/// The walk stops as soon as either side runs out of input; the filters
/// then match only if both ran out together. A trailing empty level is
/// therefore indistinguishable from the end of input: `a/+` does not cover
/// `a/`, and `a/#` does not cover `a`.
fn walk_levels(acl_filter: &str, request_filter: &str) -> bool {
    let mut acl = Cursor::new(acl_filter);
    let mut request = Cursor::new(request_filter);

    while !acl.at_end() && !request.at_end() {
        let acl_level = acl.level();
        let request_level = request.level();

        match (Level::parse(acl_level), Level::parse(request_level)) {
            (Level::MultiWildcard, _) => return true,
            (_, Level::MultiWildcard) => return false,
            (Level::SingleWildcard, Level::SingleWildcard) => {}
            (_, Level::SingleWildcard) => return false,
            (Level::SingleWildcard, Level::Literal(_)) => {}
            (Level::Literal(a), Level::Literal(r)) => {
                if a.len() != r.len() || a.as_bytes() != r.as_bytes() {
                    return false;
                }
            }
        }

        acl.advance(acl_level.len());
        request.advance(request_level.len());

        // Keep both cursors level-aligned; if one side is done the loop
        // exits and the length check below decides.
        if !acl.at_end() && !request.at_end() {
            acl.skip_separator();
            request.skip_separator();
        }
    }

    acl.at_end() == request.at_end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn check(acl: &str, request: &str) -> bool {
        sub_topic_matches_acl(acl, request).unwrap()
    }

    #[test]
    fn test_exact_match() {
        assert!(check("sensors/temp", "sensors/temp"));
        assert!(check("a", "a"));
        assert!(check("/a", "/a"));
        assert!(check("a//b", "a//b"));
        assert!(!check("sensors/temp", "sensors/humidity"));
        assert!(!check("sensors/temp", "sensors/tem"));
        assert!(!check("a/b", "a/b/c"));
        assert!(!check("a/b/c", "a/b"));
    }

    #[test]
    fn test_multi_level_wildcard_in_acl() {
        assert!(check("#", "a"));
        assert!(check("#", "a/b/c"));
        assert!(check("#", "+/b"));
        assert!(check("#", "#"));
        assert!(check("sensors/#", "sensors/temp"));
        assert!(check("sensors/#", "sensors/+/living"));
        assert!(check("sensors/#", "sensors/#"));
        assert!(!check("sensors/#", "devices/temp"));
    }

    #[test]
    fn test_multi_level_wildcard_needs_a_level() {
        // The walk ends when the request runs out before reaching `#`
        assert!(!check("a/#", "a"));
        assert!(!check("a/b/#", "a/b"));
    }

    #[test]
    fn test_multi_level_wildcard_in_request() {
        assert!(!check("a/b", "a/#"));
        assert!(!check("a/+", "a/#"));
        assert!(!check("+", "#"));
        assert!(check("a/#", "a/#"));
    }

    #[test]
    fn test_single_level_wildcard_in_acl() {
        assert!(check("a/+/c", "a/b/c"));
        assert!(check("+", "anything"));
        assert!(check("+/+", "a/b"));
        assert!(check("a/+", "a/+"));
        assert!(!check("a/+/c", "a/b/d/c"));
        assert!(!check("a/+/c", "a/b/d"));
        assert!(!check("a/+", "a/b/c"));
        assert!(!check("a/+", "a"));
    }

    #[test]
    fn test_single_level_wildcard_in_request() {
        assert!(!check("a/b", "a/+"));
        assert!(!check("a/b/c", "a/+/c"));
        assert!(check("a/+/c", "a/+/c"));
        assert!(check("a/#", "a/+/c"));
    }

    #[test]
    fn test_empty_levels() {
        assert!(check("+/a", "/a"));
        assert!(check("a/", "a/"));
        assert!(!check("a/", "a"));
        assert!(!check("a", "a/"));
        // A trailing empty level ends the walk before `+` is compared
        assert!(!check("a/+", "a/"));
    }

    #[test]
    fn test_reserved_namespace() {
        assert!(!check("#", "$SYS/x"));
        assert!(!check("+/x", "$SYS/x"));
        assert!(!check("$SYS/stats", "stats"));
        assert!(!check("stats", "$SYS/stats"));
        assert!(check("$SYS/#", "$SYS/broker/load"));
        assert!(check("$SYS/+", "$SYS/stats"));
        assert!(!check("$SYS/+", "$SYS/+/x"));
    }

    #[test]
    fn test_invalid_arguments() {
        let invalid = |acl: &str, request: &str| {
            matches!(
                sub_topic_matches_acl(acl, request),
                Err(AclError::InvalidArgument(_))
            )
        };

        assert!(invalid("", "a"));
        assert!(invalid("a", ""));
        assert!(invalid("a/\0", "a"));
        assert!(invalid("a", "a\0b"));
        assert!(invalid("a#", "a"));
        assert!(invalid("#", "a/#/b"));
        assert!(invalid("+a", "x"));
        assert!(invalid("#extra", "a/b"));
    }

    #[test]
    fn test_missing_arguments() {
        assert!(matches!(
            match_acl(None, Some("a")),
            Err(AclError::InvalidArgument(_))
        ));
        assert!(matches!(
            match_acl(Some("a"), None),
            Err(AclError::InvalidArgument(_))
        ));
        assert!(match_acl(None, None).is_err());
        assert_eq!(match_acl(Some("a/+"), Some("a/b")), Ok(true));
    }

    #[test]
    fn test_custom_validator() {
        let matcher = AclMatcher::with_validator(MqttTopicValidator::with_max_length(4));

        assert_eq!(matcher.matches("a/+", "a/b"), Ok(true));
        assert!(matcher.matches("a/+", "a/bcd").is_err());
        assert_eq!(matcher.validator().max_length(), 4);
    }

    fn literal_filter() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-z0-9 _-]{0,4}", 1..6)
            .prop_map(|levels| levels.join("/"))
            .prop_filter("non-empty", |f| !f.is_empty())
    }

    fn wildcard_filter() -> impl Strategy<Value = String> {
        (
            prop::collection::vec(prop_oneof!["[a-z]{1,3}", Just("+".to_string())], 1..6),
            any::<bool>(),
        )
            .prop_map(|(mut levels, multi)| {
                if multi {
                    levels.push("#".to_string());
                }
                levels.join("/")
            })
    }

    proptest! {
        #[test]
        fn prop_identical_filters_match(filter in literal_filter()) {
            prop_assert_eq!(sub_topic_matches_acl(&filter, &filter), Ok(true));
        }

        #[test]
        fn prop_wildcard_filters_cover_themselves(filter in wildcard_filter()) {
            prop_assert_eq!(sub_topic_matches_acl(&filter, &filter), Ok(true));
        }

        #[test]
        fn prop_hash_covers_non_reserved(filter in wildcard_filter()) {
            prop_assert_eq!(sub_topic_matches_acl("#", &filter), Ok(true));
            let reserved = format!("$SYS/{}", filter);
            prop_assert_eq!(sub_topic_matches_acl("#", &reserved), Ok(false));
        }

        #[test]
        fn prop_matching_is_deterministic(acl in wildcard_filter(), request in wildcard_filter()) {
            let first = sub_topic_matches_acl(&acl, &request);
            let second = sub_topic_matches_acl(&acl, &request);
            prop_assert_eq!(first, second);
        }
    }
}
