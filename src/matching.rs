//! Regex-based route matching.
//!
//! Route patterns are plain regular expressions. A [`PathMatcher`] compiles
//! one and, given a context path, yields the positional [`RouteParams`]
//! captured by its groups.
//!
//! # Matching rules
//!
//! - Any `?query` suffix is stripped before matching. The hash fragment has
//!   already been removed when the [`NavigationContext`] was built.
//! - The pathname is percent-decoded before the regex runs, so patterns are
//!   written against readable paths (`/c/my/repo/+/42`).
//! - Each participating group is decoded again (`+` → space, then percent
//!   escapes) and stored positionally. Named groups are not supported.
//!
//! [`NavigationContext`]: crate::NavigationContext

use crate::error::RouterError;
use crate::params::{decode_component, decode_uri, RouteParams};
use regex::Regex;
use std::fmt;

/// A compiled route pattern.
#[derive(Clone)]
pub struct PathMatcher {
    source: String,
    regex: Regex,
}

impl PathMatcher {
    /// Compile `pattern` as a regular expression.
    pub fn new(pattern: &str) -> Result<Self, RouterError> {
        let regex = Regex::new(pattern).map_err(|err| RouterError::InvalidPattern {
            pattern: pattern.to_string(),
            message: err.to_string(),
        })?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// A matcher that accepts every path (`.*`).
    pub fn any() -> Self {
        Self {
            source: ".*".to_string(),
            regex: Regex::new(".*").expect("catch-all pattern compiles"),
        }
    }

    /// The pattern this matcher was compiled from.
    pub fn pattern(&self) -> &str {
        &self.source
    }

    /// Match `path` and extract its positional parameters.
    ///
    /// Returns `None` when the pattern does not match.
    pub fn matches(&self, path: &str) -> Option<RouteParams> {
        let pathname = strip_query(path);
        let decoded = decode_uri(pathname);
        let captures = self.regex.captures(&decoded)?;

        let mut params = RouteParams::new();
        for group in captures.iter().skip(1) {
            params.push_group(group.map(|m| decode_component(m.as_str())));
        }
        Some(params)
    }

    /// Check whether `path` matches without building parameters.
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(&decode_uri(strip_query(path)))
    }
}

impl fmt::Debug for PathMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PathMatcher").field(&self.source).finish()
    }
}

/// Drop everything from the first `?` on.
pub fn strip_query(path: &str) -> &str {
    path.split_once('?').map_or(path, |(pathname, _)| pathname)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_without_groups() {
        let matcher = PathMatcher::new(r"^/settings/?$").unwrap();
        let params = matcher.matches("/settings").unwrap();
        assert!(params.is_empty());
        assert!(matcher.matches("/settingsx").is_none());
    }

    #[test]
    fn test_positional_groups() {
        let matcher = PathMatcher::new(r"^/x/([\w-]+)/([\w-]+)/?").unwrap();
        let params = matcher.matches("/x/codemirror/editor").unwrap();
        assert_eq!(params.get(0), Some("codemirror"));
        assert_eq!(params.get(1), Some("editor"));
    }

    #[test]
    fn test_query_is_ignored() {
        let matcher = PathMatcher::new(r"^/q/([^,]+)(,(\d+))?$").unwrap();
        let params = matcher.matches("/q/status:open?usp=email").unwrap();
        assert_eq!(params.get(0), Some("status:open"));
        assert_eq!(params.get(1), None);
        assert_eq!(params.get(2), None);
        assert_eq!(params.group_count(), 3);
    }

    #[test]
    fn test_optional_group_present() {
        let matcher = PathMatcher::new(r"^/q/([^,]+)(,(\d+))?$").unwrap();
        let params = matcher.matches("/q/is:open,25").unwrap();
        assert_eq!(params.get(2), Some("25"));
    }

    #[test]
    fn test_plus_and_percent_decoding() {
        let matcher = PathMatcher::new(r"^/q/(.+)$").unwrap();
        let params = matcher.matches("/q/owner:self+status:open").unwrap();
        assert_eq!(params.get(0), Some("owner:self status:open"));

        let matcher = PathMatcher::new(r"^/admin/repos/(.+),access$").unwrap();
        let params = matcher.matches("/admin/repos/my%2Frepo,access").unwrap();
        assert_eq!(params.get(0), Some("my/repo"));
    }

    #[test]
    fn test_first_match_is_prefix_match() {
        let matcher = PathMatcher::new(r"^/(\d+)/?").unwrap();
        let params = matcher.matches("/42/anything").unwrap();
        assert_eq!(params.get_as::<u32>(0), Some(42));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = PathMatcher::new("(unclosed").unwrap_err();
        match err {
            RouterError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "(unclosed"),
            other => panic!("expected InvalidPattern, got {other:?}"),
        }
    }

    #[test]
    fn test_any_matches_everything() {
        let matcher = PathMatcher::any();
        assert!(matcher.is_match("/"));
        assert!(matcher.is_match("/whatever/else?x=1"));
    }
}
