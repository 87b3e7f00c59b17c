//! Document-level link interception.
//!
//! One listener on `document` sees every click (or `touchstart`, on
//! touch-only devices). [`ClickInterceptor::decide`] turns the event into a
//! [`ClickDecision`]: either leave it to the browser, or cancel it and route
//! the anchor's path in-app. The decision is a pure function of the event,
//! the current location and the base prefix.
//!
//! # Example
//!
//! ```
//! use review_router::click::{ClickDecision, ClickEvent, ClickInterceptor, EventNode};
//! use url::Url;
//!
//! let interceptor = ClickInterceptor::new("");
//! let location = Url::parse("https://review.example.com/q/is:open").unwrap();
//! let event = ClickEvent::click(vec![
//!     EventNode::new("span"),
//!     EventNode::new("a").attr("href", "/c/repo/+/42"),
//! ]);
//!
//! assert_eq!(
//!     interceptor.decide(&event, &location),
//!     ClickDecision::Navigate("/c/repo/+/42".to_string())
//! );
//! ```

use crate::context::base_relative;
use crate::trace_log;
use url::Url;

/// DOM event type the interceptor listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickEventKind {
    /// Mouse or pen click.
    Click,
    /// Touch start, used when the device has no mouse.
    TouchStart,
}

impl ClickEventKind {
    /// The event type to register for: `touchstart` when the document only
    /// supports touch, `click` otherwise.
    pub fn for_device(touch_only: bool) -> Self {
        if touch_only {
            ClickEventKind::TouchStart
        } else {
            ClickEventKind::Click
        }
    }

    /// DOM event name.
    pub fn event_name(self) -> &'static str {
        match self {
            ClickEventKind::Click => "click",
            ClickEventKind::TouchStart => "touchstart",
        }
    }
}

/// One element on the event's composed path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventNode {
    /// Tag name, compared case-insensitively.
    pub tag: String,
    /// Attributes as written in the markup.
    pub attributes: Vec<(String, String)>,
}

impl EventNode {
    /// Create an element with no attributes.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
        }
    }

    /// Add an attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Attribute value by name.
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether the attribute is present at all.
    pub fn has_attr(&self, name: &str) -> bool {
        self.get_attr(name).is_some()
    }

    fn is_link(&self) -> bool {
        self.tag.eq_ignore_ascii_case("a") && self.has_attr("href")
    }
}

/// The parts of a DOM click event the interceptor looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent {
    /// Which listener received the event.
    pub kind: ClickEventKind,
    /// Mouse button, `0` for the primary button.
    pub button: u16,
    /// Meta (command) key held.
    pub meta_key: bool,
    /// Control key held.
    pub ctrl_key: bool,
    /// Shift key held.
    pub shift_key: bool,
    /// `event.defaultPrevented`.
    pub default_prevented: bool,
    /// `event.composedPath()`, innermost target first.
    pub path: Vec<EventNode>,
}

impl ClickEvent {
    /// A plain primary-button click through `path`.
    pub fn click(path: Vec<EventNode>) -> Self {
        Self {
            kind: ClickEventKind::Click,
            button: 0,
            meta_key: false,
            ctrl_key: false,
            shift_key: false,
            default_prevented: false,
            path,
        }
    }

    /// A touch start through `path`.
    pub fn touch(path: Vec<EventNode>) -> Self {
        Self {
            kind: ClickEventKind::TouchStart,
            ..Self::click(path)
        }
    }

    fn is_primary(&self) -> bool {
        self.kind == ClickEventKind::TouchStart || self.button == 0
    }

    fn is_modified(&self) -> bool {
        self.meta_key || self.ctrl_key || self.shift_key
    }
}

/// Why a click was left to the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Not the primary button.
    NotPrimaryButton,
    /// Meta, ctrl or shift held.
    Modified,
    /// Someone already called `preventDefault()`.
    DefaultPrevented,
    /// No anchor with an `href` on the event path.
    NoLink,
    /// The anchor has a `download` attribute.
    Download,
    /// The anchor has `rel="external"`.
    External,
    /// Jump to an anchor on the current page.
    SamePageHash,
    /// A `mailto:` link.
    Mailto,
    /// The anchor opens in another browsing context.
    Target,
    /// The link leaves this origin, or could not be resolved.
    CrossOrigin,
    /// The link is same-origin but outside the app's base prefix.
    OutsideBase,
}

/// Outcome of inspecting a click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickDecision {
    /// Let the browser handle the click.
    Ignore(IgnoreReason),
    /// Cancel the click and show this path (relative to the base prefix).
    Navigate(String),
}

/// Decides which link clicks become in-app navigations.
#[derive(Debug, Clone, Default)]
pub struct ClickInterceptor {
    base: String,
}

impl ClickInterceptor {
    /// Create an interceptor for an app mounted at `base`.
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    /// Inspect `event` against the current `location`.
    pub fn decide(&self, event: &ClickEvent, location: &Url) -> ClickDecision {
        if !event.is_primary() {
            return ClickDecision::Ignore(IgnoreReason::NotPrimaryButton);
        }
        if event.is_modified() {
            return ClickDecision::Ignore(IgnoreReason::Modified);
        }
        if event.default_prevented {
            return ClickDecision::Ignore(IgnoreReason::DefaultPrevented);
        }

        let Some(anchor) = event.path.iter().find(|node| node.is_link()) else {
            return ClickDecision::Ignore(IgnoreReason::NoLink);
        };
        let href = anchor.get_attr("href").unwrap_or_default();

        if anchor.has_attr("download") {
            return ClickDecision::Ignore(IgnoreReason::Download);
        }
        if anchor.get_attr("rel") == Some("external") {
            return ClickDecision::Ignore(IgnoreReason::External);
        }

        let Ok(target) = location.join(href) else {
            return ClickDecision::Ignore(IgnoreReason::CrossOrigin);
        };

        let same_path = target.path() == location.path() && target.query() == location.query();
        let has_hash = target.fragment().is_some_and(|f| !f.is_empty());
        if same_path && (has_hash || href == "#") {
            return ClickDecision::Ignore(IgnoreReason::SamePageHash);
        }
        if href.contains("mailto:") {
            return ClickDecision::Ignore(IgnoreReason::Mailto);
        }
        if anchor.get_attr("target").is_some_and(|t| !t.is_empty()) {
            return ClickDecision::Ignore(IgnoreReason::Target);
        }
        if target.origin() != location.origin() {
            return ClickDecision::Ignore(IgnoreReason::CrossOrigin);
        }

        let mut path = target.path().to_string();
        if let Some(query) = target.query() {
            path.push('?');
            path.push_str(query);
        }
        if let Some(fragment) = target.fragment().filter(|f| !f.is_empty()) {
            path.push('#');
            path.push_str(fragment);
        }

        if self.base.is_empty() {
            trace_log!("intercepted click to '{}'", path);
            return ClickDecision::Navigate(path);
        }
        match base_relative(&path, &self.base) {
            Some(relative) => {
                let relative = if relative.is_empty() { "/" } else { relative };
                trace_log!("intercepted click to '{}'", relative);
                ClickDecision::Navigate(relative.to_string())
            }
            None => ClickDecision::Ignore(IgnoreReason::OutsideBase),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> Url {
        Url::parse("https://review.example.com/q/is:open").unwrap()
    }

    fn link(href: &str) -> EventNode {
        EventNode::new("A").attr("href", href)
    }

    fn decide(event: &ClickEvent) -> ClickDecision {
        ClickInterceptor::new("").decide(event, &location())
    }

    #[test]
    fn test_plain_same_origin_link_navigates() {
        let event =
            ClickEvent::click(vec![EventNode::new("span"), link("/c/r/+/1?tab=checks")]);
        assert_eq!(decide(&event), ClickDecision::Navigate("/c/r/+/1?tab=checks".into()));
    }

    #[test]
    fn test_relative_and_absolute_same_origin() {
        let href = "https://review.example.com/settings#Agreements";
        let event = ClickEvent::click(vec![link(href)]);
        assert_eq!(decide(&event), ClickDecision::Navigate("/settings#Agreements".into()));

        let event = ClickEvent::click(vec![link("dashboard/self")]);
        assert_eq!(decide(&event), ClickDecision::Navigate("/q/dashboard/self".into()));
    }

    #[test]
    fn test_buttons_and_modifiers() {
        let mut event = ClickEvent::click(vec![link("/a")]);
        event.button = 1;
        assert_eq!(decide(&event), ClickDecision::Ignore(IgnoreReason::NotPrimaryButton));

        let mut event = ClickEvent::click(vec![link("/a")]);
        event.ctrl_key = true;
        assert_eq!(decide(&event), ClickDecision::Ignore(IgnoreReason::Modified));

        let mut event = ClickEvent::click(vec![link("/a")]);
        event.default_prevented = true;
        assert_eq!(decide(&event), ClickDecision::Ignore(IgnoreReason::DefaultPrevented));
    }

    #[test]
    fn test_touch_is_primary() {
        let event = ClickEvent::touch(vec![link("/a")]);
        assert_eq!(decide(&event), ClickDecision::Navigate("/a".into()));
    }

    #[test]
    fn test_anchor_vetoes() {
        let cases = [
            (link("/a").attr("download", ""), IgnoreReason::Download),
            (link("/a").attr("rel", "external"), IgnoreReason::External),
            (link("mailto:someone@example.com"), IgnoreReason::Mailto),
            (link("/a").attr("target", "_blank"), IgnoreReason::Target),
            (link("https://elsewhere.example.com/a"), IgnoreReason::CrossOrigin),
            (EventNode::new("a"), IgnoreReason::NoLink),
        ];
        for (node, reason) in cases {
            let event = ClickEvent::click(vec![node]);
            assert_eq!(decide(&event), ClickDecision::Ignore(reason));
        }
    }

    #[test]
    fn test_empty_target_is_intercepted() {
        let event = ClickEvent::click(vec![link("/a").attr("target", "")]);
        assert_eq!(decide(&event), ClickDecision::Navigate("/a".into()));
    }

    #[test]
    fn test_same_page_hash() {
        let event = ClickEvent::click(vec![link("#section")]);
        assert_eq!(decide(&event), ClickDecision::Ignore(IgnoreReason::SamePageHash));

        let event = ClickEvent::click(vec![link("#")]);
        assert_eq!(decide(&event), ClickDecision::Ignore(IgnoreReason::SamePageHash));

        let event = ClickEvent::click(vec![link("/settings#x")]);
        assert_eq!(decide(&event), ClickDecision::Navigate("/settings#x".into()));
    }

    #[test]
    fn test_base_prefix() {
        let interceptor = ClickInterceptor::new("/review");
        let location = Url::parse("https://review.example.com/review/q/is:open").unwrap();

        let event = ClickEvent::click(vec![link("/review/c/r/+/1")]);
        assert_eq!(
            interceptor.decide(&event, &location),
            ClickDecision::Navigate("/c/r/+/1".into())
        );

        let event = ClickEvent::click(vec![link("/other/thing")]);
        assert_eq!(
            interceptor.decide(&event, &location),
            ClickDecision::Ignore(IgnoreReason::OutsideBase)
        );

        let event = ClickEvent::click(vec![link("/reviewers/list")]);
        assert_eq!(
            interceptor.decide(&event, &location),
            ClickDecision::Ignore(IgnoreReason::OutsideBase)
        );
    }

    #[test]
    fn test_event_kind_for_device() {
        assert_eq!(ClickEventKind::for_device(true).event_name(), "touchstart");
        assert_eq!(ClickEventKind::for_device(false).event_name(), "click");
    }
}
