//! Route parameter extraction and query string parsing.
//!
//! This module provides two complementary types for working with URL data:
//!
//! - [`RouteParams`]: positional parameters produced by a route pattern's
//!   capture groups. Group `n` is stored under the key `"n-1"`, so the first
//!   group is `"0"`. Handlers read them through typed accessors
//!   ([`get`](RouteParams::get), [`get_as`](RouteParams::get_as)) with the
//!   indices their pattern statically defines.
//! - [`QueryParams`]: the `?key=value&...` portion of a URL, kept in
//!   document order so it can be filtered and re-serialized without
//!   reshuffling the address bar.
//!
//! # Example
//!
//! ```
//! use review_router::{QueryParams, RouteParams};
//!
//! let mut params = RouteParams::new();
//! params.push_group(Some("myrepo".to_string()));
//! params.push_group(Some("42".to_string()));
//! assert_eq!(params.get(0), Some("myrepo"));
//! assert_eq!(params.get_as::<u32>(1), Some(42));
//!
//! let query = QueryParams::from_query_string("tab=checks&attempt=2");
//! assert_eq!(query.get("tab"), Some("checks"));
//! assert_eq!(query.get_as::<u32>("attempt"), Some(2));
//! ```

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::form_urlencoded;

/// Characters left untouched by `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Decode an `application/x-www-form-urlencoded` component: `+` becomes a
/// space, then percent escapes are decoded. Malformed UTF-8 is replaced
/// rather than rejected.
pub fn decode_component(s: &str) -> String {
    let plus_decoded = s.replace('+', " ");
    percent_decode_str(&plus_decoded)
        .decode_utf8_lossy()
        .into_owned()
}

/// Percent-decode without touching `+`.
pub fn decode_uri(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

/// Equivalent of `encodeURIComponent`.
pub fn encode_component(s: &str) -> String {
    utf8_percent_encode(s, URI_COMPONENT).to_string()
}

// ============================================================================
// RouteParams
// ============================================================================

/// Positional route parameters, keyed `"0"`, `"1"`, … in capture-group order.
///
/// Groups that did not participate in the match are absent, so
/// `get(2)` on `^/q/([^,]+)(,(\d+))?$` matching `/q/foo` is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
    entries: Vec<(String, String)>,
    groups: usize,
}

impl RouteParams {
    /// Create empty route parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the next capture group. `None` records a non-participating
    /// group so later indices stay aligned.
    pub fn push_group(&mut self, value: Option<String>) {
        let key = self.groups.to_string();
        self.groups += 1;
        if let Some(value) = value {
            self.entries.push((key, value));
        }
    }

    /// Get the parameter for capture group `index` (zero-based).
    pub fn get(&self, index: usize) -> Option<&str> {
        self.get_key(&index.to_string())
    }

    /// Get a parameter by its raw string key.
    pub fn get_key(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Get a parameter and parse it as a specific type.
    ///
    /// Returns `None` if the group is absent or cannot be parsed.
    pub fn get_as<T>(&self, index: usize) -> Option<T>
    where
        T: std::str::FromStr,
    {
        self.get(index)?.parse().ok()
    }

    /// Get a parameter, treating an empty capture like a missing one.
    pub fn non_empty(&self, index: usize) -> Option<&str> {
        self.get(index).filter(|v| !v.is_empty())
    }

    /// Iterate over `(key, value)` pairs in capture-group order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of capture groups recorded, participating or not.
    pub fn group_count(&self) -> usize {
        self.groups
    }

    /// Return `true` if no group produced a value.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of groups that produced a value.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

// ============================================================================
// QueryParams
// ============================================================================

/// Query parameters parsed from a URL query string, in document order.
///
/// Supports repeated keys.
///
/// # Example
///
/// ```
/// use review_router::QueryParams;
///
/// let query = QueryParams::from_query_string("?usp=email&tab=files&tab=checks");
/// assert_eq!(query.get("tab"), Some("files"));
/// assert_eq!(query.get_all("tab"), vec!["files", "checks"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Create empty query parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw (still encoded) query string. A leading `?` is ignored,
    /// as are pairs with an empty name.
    pub fn from_query_string(query: &str) -> Self {
        let query = query.trim_start_matches('?');
        let pairs = form_urlencoded::parse(query.as_bytes())
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();
        Self { pairs }
    }

    /// Get the first value for a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Get the first value for a key, comparing names case-insensitively.
    pub fn get_ignore_case(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Get all values for a key, in order.
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Get the first value for a key, parsed as type `T`.
    pub fn get_as<T>(&self, key: &str) -> Option<T>
    where
        T: std::str::FromStr,
    {
        self.get(key)?.parse().ok()
    }

    /// Append a value for the given key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Remove every value for `key`, returning the first one removed.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let first = self.get(key).map(str::to_string);
        self.pairs.retain(|(k, _)| k != key);
        first
    }

    /// Keep only the keys in `allowed`, preserving order.
    pub fn retain_keys(&mut self, allowed: &[&str]) {
        self.pairs.retain(|(k, _)| allowed.contains(&k.as_str()));
    }

    /// Return `true` if the given key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// Iterate over `(key, value)` pairs in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Serialize back into a query string (without the leading `?`).
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.pairs {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }

    /// Return `true` if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Return the number of pairs, counting repeated keys.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }
}

// ============================================================================
// Tests
// ============================================================================
