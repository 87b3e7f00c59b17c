//! Browser history synchronization.
//!
//! - [`HistoryEntry`]: the JSON state object stored with every entry.
//! - [`HistoryBridge`]: the only code path that writes to the history
//!   stack. Tracks how many entries this app pushed so [`back`] can tell
//!   "back within the app" from "back out of the app".
//! - [`MemoryHistory`]: an in-memory history stack with browser semantics,
//!   for hosts without a real one (tests, server-side rendering).
//!
//! [`back`]: HistoryBridge::back

use crate::context::NavigationContext;
use crate::platform::{path_of, Platform};
use crate::{debug_log, trace_log};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;

// ============================================================================
// HistoryEntry
// ============================================================================

/// State persisted with a history entry: `{ "path": <canonical path> }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Canonical path (base prefix included).
    pub path: String,
}

impl HistoryEntry {
    /// Create an entry for `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Serialize for `history.pushState`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "path": self.path })
    }

    /// Read back a state object delivered by `popstate`. Anything that is
    /// not an object with a string `path` is treated as no state.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

// ============================================================================
// HistoryBridge
// ============================================================================

/// What [`HistoryBridge::back`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackAction {
    /// Called the native `history.back()`.
    Native,
    /// No app-originated entries remain; the caller should show this path on
    /// a deferred task.
    Show(String),
}

/// What the router should do with a `popstate` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopAction {
    /// Replay the stored state with a replace.
    Replace(HistoryEntry),
    /// No state: dispatch the current location without pushing.
    Show(String),
}

/// Wrapper around the platform's history stack.
pub struct HistoryBridge {
    platform: Rc<dyn Platform>,
    len: Cell<usize>,
    loaded: Cell<bool>,
}

impl HistoryBridge {
    /// Create a bridge over `platform`'s history.
    pub fn new(platform: Rc<dyn Platform>) -> Self {
        Self {
            platform,
            len: Cell::new(0),
            loaded: Cell::new(false),
        }
    }

    /// Push a new entry for `ctx` and count it.
    pub fn push(&self, ctx: &NavigationContext) {
        self.len.set(self.len.get() + 1);
        trace_log!("pushState '{}' (len {})", ctx.canonical_path, self.len.get());
        self.platform.push_state(&ctx.state, &ctx.canonical_path);
    }

    /// Replace the current entry with `ctx`. The step counter is untouched.
    pub fn replace(&self, ctx: &NavigationContext) {
        trace_log!("replaceState '{}'", ctx.canonical_path);
        self.platform.replace_state(&ctx.state, &ctx.canonical_path);
    }

    /// Rewrite the address bar to `url` without dispatching.
    pub fn replace_url(&self, url: &str) {
        trace_log!("replaceState '{}' (no dispatch)", url);
        self.platform.replace_state(&HistoryEntry::new(url), url);
    }

    /// Go back one app entry, or report that there is none.
    pub fn back(&self, fallback: &str) -> BackAction {
        let len = self.len.get();
        if len > 0 {
            self.len.set(len - 1);
            debug_log!("history back (len {} -> {})", len, len - 1);
            self.platform.history_back();
            BackAction::Native
        } else {
            debug_log!("no app history to unwind, showing '{}'", fallback);
            BackAction::Show(fallback.to_string())
        }
    }

    /// Number of entries this app pushed that have not been popped.
    pub fn len(&self) -> usize {
        self.len.get()
    }

    /// Whether no app-originated entries remain.
    pub fn is_empty(&self) -> bool {
        self.len.get() == 0
    }

    /// Record that the page `load` event fired.
    pub fn mark_loaded(&self) {
        self.loaded.set(true);
    }

    /// Whether the page `load` event fired.
    pub fn is_loaded(&self) -> bool {
        self.loaded.get()
    }

    /// Decide how to handle a `popstate` event. Returns `None` before the
    /// page finished loading, when some browsers fire spurious events.
    pub fn on_popstate(&self, state: Option<HistoryEntry>) -> Option<PopAction> {
        if !self.loaded.get() {
            trace_log!("ignoring popstate before load");
            return None;
        }
        Some(match state {
            Some(entry) => PopAction::Replace(entry),
            None => PopAction::Show(path_of(&self.platform.location())),
        })
    }
}

// ============================================================================
// MemoryHistory
// ============================================================================

/// An in-memory history stack with browser semantics.
///
/// Pushing truncates any forward entries; `back`/`forward` move the cursor
/// without dropping entries.
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    entries: Vec<(Option<HistoryEntry>, String)>,
    current: usize,
}

impl MemoryHistory {
    /// Start with a single entry for `url` and no state.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            entries: vec![(None, url.into())],
            current: 0,
        }
    }

    /// URL of the current entry.
    pub fn current_url(&self) -> &str {
        &self.entries[self.current].1
    }

    /// State of the current entry.
    pub fn current_state(&self) -> Option<&HistoryEntry> {
        self.entries[self.current].0.as_ref()
    }

    /// Add an entry after the cursor, dropping forward history.
    pub fn push(&mut self, entry: HistoryEntry, url: impl Into<String>) {
        self.entries.truncate(self.current + 1);
        self.entries.push((Some(entry), url.into()));
        self.current += 1;
    }

    /// Overwrite the current entry.
    pub fn replace(&mut self, entry: HistoryEntry, url: impl Into<String>) {
        self.entries[self.current] = (Some(entry), url.into());
    }

    /// Move back one entry. Returns the state now current, or `None` at the
    /// start of the stack.
    pub fn back(&mut self) -> Option<Option<HistoryEntry>> {
        if self.current > 0 {
            self.current -= 1;
            Some(self.entries[self.current].0.clone())
        } else {
            None
        }
    }

    /// Move forward one entry.
    pub fn forward(&mut self) -> Option<Option<HistoryEntry>> {
        if self.current + 1 < self.entries.len() {
            self.current += 1;
            Some(self.entries[self.current].0.clone())
        } else {
            None
        }
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`: the stack holds at least the initial entry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_json_shape() {
        let entry = HistoryEntry::new("/r/q/is:open");
        assert_eq!(entry.to_json(), serde_json::json!({ "path": "/r/q/is:open" }));
        assert_eq!(HistoryEntry::from_json(&entry.to_json()), Some(entry));
        assert_eq!(HistoryEntry::from_json(&serde_json::Value::Null), None);
        assert_eq!(HistoryEntry::from_json(&serde_json::json!({ "x": 1 })), None);
    }

    #[test]
    fn test_memory_history_push_back_forward() {
        let mut history = MemoryHistory::new("/");
        history.push(HistoryEntry::new("/a"), "/a");
        history.push(HistoryEntry::new("/b"), "/b");
        assert_eq!(history.current_url(), "/b");

        assert_eq!(history.back(), Some(Some(HistoryEntry::new("/a"))));
        assert_eq!(history.current_url(), "/a");
        assert_eq!(history.forward(), Some(Some(HistoryEntry::new("/b"))));

        history.back();
        history.back();
        assert_eq!(history.back(), None);
        assert_eq!(history.current_state(), None);
    }

    #[test]
    fn test_memory_history_push_drops_forward() {
        let mut history = MemoryHistory::new("/");
        history.push(HistoryEntry::new("/a"), "/a");
        history.push(HistoryEntry::new("/b"), "/b");
        history.back();
        history.push(HistoryEntry::new("/c"), "/c");
        assert_eq!(history.len(), 3);
        assert_eq!(history.forward(), None);
    }

    #[test]
    fn test_memory_history_replace() {
        let mut history = MemoryHistory::new("/");
        history.push(HistoryEntry::new("/a"), "/a");
        history.replace(HistoryEntry::new("/z"), "/z");
        assert_eq!(history.current_url(), "/z");
        assert_eq!(history.len(), 2);
    }
}
