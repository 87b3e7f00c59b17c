//! Per-navigation context.
//!
//! A [`NavigationContext`] describes one navigation attempt: where it points
//! (with and without the mount prefix), its query string and hash, and the
//! parameters the matching route extracted. Building one is pure; writing it
//! to the browser history is a separate, explicit step performed by the
//! router through the [`HistoryBridge`](crate::history::HistoryBridge).
//!
//! # Example
//!
//! ```
//! use review_router::NavigationContext;
//!
//! let ctx = NavigationContext::new("/c/repo/+/42?tab=checks#file.txt", None, "/gerrit");
//! assert_eq!(ctx.canonical_path, "/gerrit/c/repo/+/42?tab=checks#file.txt");
//! assert_eq!(ctx.path, "/c/repo/+/42?tab=checks");
//! assert_eq!(ctx.querystring, "tab=checks");
//! assert_eq!(ctx.hash, "file.txt");
//! ```

use crate::history::HistoryEntry;
use crate::matching::strip_query;
use crate::params::{decode_component, decode_uri, QueryParams, RouteParams};

/// Record describing a single navigation.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationContext {
    /// Full path including the base prefix, as written to history.
    pub canonical_path: String,
    /// Canonical path with the base prefix and hash removed. Keeps the query.
    pub path: String,
    /// Percent-decoded canonical path without query or hash.
    pub pathname: String,
    /// Decoded query string (between `?` and `#`).
    pub querystring: String,
    /// Decoded fragment between the first and second `#`.
    pub hash: String,
    /// Positional parameters, filled in by the matching middleware.
    pub params: RouteParams,
    /// History state persisted with this entry.
    pub state: HistoryEntry,
    /// Whether a middleware claimed this context.
    pub handled: bool,
}

impl NavigationContext {
    /// Build a context for `raw_path`.
    ///
    /// Absolute paths that don't already start with `base` are prefixed with
    /// it. The stored history state always records the canonical path.
    pub fn new(raw_path: &str, state: Option<HistoryEntry>, base: &str) -> Self {
        let under_base = base_relative(raw_path, base).is_some();
        let canonical_path = if raw_path.starts_with('/') && !under_base {
            format!("{}{}", base, raw_path)
        } else {
            raw_path.to_string()
        };

        let mut path = strip_base(&canonical_path, base).to_string();

        let before_hash = canonical_path
            .split_once('#')
            .map_or(canonical_path.as_str(), |(head, _)| head);
        let querystring = before_hash
            .split_once('?')
            .map(|(_, query)| decode_component(query))
            .unwrap_or_default();
        let pathname = decode_uri(strip_query(before_hash));

        let mut hash = String::new();
        if let Some((head, tail)) = path.split_once('#') {
            let fragment = tail.split('#').next().unwrap_or_default();
            hash = decode_component(fragment);
            path = head.to_string();
        }
        if path.is_empty() {
            path = "/".to_string();
        }

        let mut state = state.unwrap_or_default();
        state.path.clone_from(&canonical_path);

        Self {
            canonical_path,
            path,
            pathname,
            querystring,
            hash,
            params: RouteParams::new(),
            state,
            handled: false,
        }
    }

    /// Everything after the first `#` of the canonical path, inner hashes
    /// included (`"/a#b#c"` → `"b#c"`). Empty when there is no hash.
    pub fn full_hash(&self) -> &str {
        self.canonical_path
            .split_once('#')
            .map_or("", |(_, tail)| tail)
    }

    /// The undecoded query string of the canonical path.
    pub fn raw_query(&self) -> &str {
        let before_hash = self
            .canonical_path
            .split_once('#')
            .map_or(self.canonical_path.as_str(), |(head, _)| head);
        before_hash.split_once('?').map_or("", |(_, query)| query)
    }

    /// Parsed query parameters.
    pub fn query_params(&self) -> QueryParams {
        QueryParams::from_query_string(self.raw_query())
    }

    /// The context path without its query string.
    pub fn path_without_query(&self) -> &str {
        strip_query(&self.path)
    }
}

/// The part of `path` after `base`, when `path` lies under `base`.
///
/// The prefix must end on a segment boundary: with base `/r`, `/r/x` and
/// `/r?q` are under it but `/repos` is not.
pub fn base_relative<'a>(path: &'a str, base: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(base)?;
    match rest.chars().next() {
        None | Some('/' | '?' | '#') => Some(rest),
        Some(_) if base.is_empty() || base.ends_with('/') => Some(rest),
        Some(_) => None,
    }
}

/// Strip `base` from the start of `path`; an empty remainder becomes `/`.
pub fn strip_base<'a>(path: &'a str, base: &str) -> &'a str {
    let stripped = base_relative(path, base).unwrap_or(path);
    if stripped.is_empty() {
        "/"
    } else {
        stripped
    }
}
