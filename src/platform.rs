//! Browser abstraction.
//!
//! The router never touches `window`, `document` or `history` directly.
//! Everything it needs from the host environment goes through [`Platform`],
//! so dispatch and state logic run unchanged in a wasm build and in native
//! unit tests with a scripted fake.
//!
//! Tasks and timers are part of the abstraction as well: the router is
//! single-threaded and cooperative, so futures it hands to
//! [`spawn`](Platform::spawn) are `!Send` and are expected to run on the
//! same event loop that delivers clicks and `popstate` events.

use crate::history::HistoryEntry;
use futures::future::LocalBoxFuture;
use std::time::Duration;
use url::Url;

/// Detail of the deferred `location-change` notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationChange {
    /// `location.pathname` at the time the notification fires.
    pub pathname: String,
    /// `location.hash` (with its leading `#`, or empty).
    pub hash: String,
}

/// Host environment the router runs in.
pub trait Platform {
    /// The current document URL.
    fn location(&self) -> Url;

    /// `history.pushState(entry, "", url)`.
    fn push_state(&self, entry: &HistoryEntry, url: &str);

    /// `history.replaceState(entry, "", url)`.
    fn replace_state(&self, entry: &HistoryEntry, url: &str);

    /// `history.back()`.
    fn history_back(&self);

    /// Reload the current document from the server.
    fn reload(&self);

    /// Full page load of `url`, leaving the single-page app.
    fn assign(&self, url: &str);

    /// Install (`Some`) or remove (`None`) the `beforeunload` warning.
    fn set_unload_warning(&self, warning: Option<String>);

    /// Scroll the document back to the top before a new view renders.
    fn scroll_to_top(&self) {}

    /// Deliver a `location-change` notification to the document.
    fn location_changed(&self, _change: LocationChange) {}

    /// Close the current window (used by the post-login popup flow).
    fn close_window(&self) {}

    /// Run `task` on the event loop.
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);

    /// A future that completes after `duration`.
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;
}

/// `pathname + search + hash` of `url`, the form the router dispatches.
pub fn path_of(url: &Url) -> String {
    let mut path = url.path().to_string();
    if let Some(query) = url.query() {
        path.push('?');
        path.push_str(query);
    }
    if let Some(fragment) = url.fragment() {
        path.push('#');
        path.push_str(fragment);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_of() {
        let url = Url::parse("https://review.example.com/c/r/+/1?tab=x#b12").unwrap();
        assert_eq!(path_of(&url), "/c/r/+/1?tab=x#b12");

        let url = Url::parse("https://review.example.com/").unwrap();
        assert_eq!(path_of(&url), "/");
    }
}
