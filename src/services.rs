//! Collaborators the router calls out to.
//!
//! The router decides *where* to go; whether the user is signed in, which
//! repository a bare change number belongs to, and how notices are shown
//! are answered by the host application through these traits. Every trait
//! except [`AuthService`] has a no-op default, so tests and embedders only
//! implement what they care about.

use async_trait::async_trait;
use std::fmt;
use std::rc::Rc;

// ============================================================================
// Traits
// ============================================================================

/// Answers whether a user is signed in.
#[async_trait(?Send)]
pub trait AuthService {
    /// Resolves once the account has been loaded.
    async fn is_logged_in(&self) -> bool;
}

/// Resolves the repository of a change known only by number.
#[async_trait(?Send)]
pub trait ChangeLookup {
    /// `None` when the change does not exist or is not visible.
    async fn resolve_repo_for_change(&self, change_num: u32) -> Option<String>;
}

/// Navigation analytics.
pub trait Reporting {
    /// A route handler is about to run.
    fn location_changed(&self, _route: &str) {}

    /// The user is leaving the current page (not a redirect).
    fn before_location_changed(&self) {}

    /// The active repository is now known.
    fn set_repo_name(&self, _repo: &str) {}

    /// The active change is now known.
    fn set_change_id(&self, _change_num: u32) {}

    /// The visit came from an external source (`usp` parameter).
    fn user_referred_from(&self, _source: &str) {}
}

/// User-visible notices.
pub trait Notifier {
    /// Show a transient message.
    fn notify(&self, _message: &str) {}

    /// Replace the page with the not-found view.
    fn show_not_found(&self) {}
}

/// An entry in the admin navigation menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuLink {
    pub text: String,
    pub url: String,
    /// Capability the user needs to see the link, if any.
    pub capability: Option<String>,
}

impl MenuLink {
    pub fn new(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            url: url.into(),
            capability: None,
        }
    }

    pub fn capability(mut self, capability: impl Into<String>) -> Self {
        self.capability = Some(capability.into());
        self
    }
}

/// Contributions from installed plugins.
pub trait PluginHost {
    /// Extra admin menu entries.
    fn admin_menu_links(&self) -> Vec<MenuLink> {
        Vec::new()
    }
}

// ============================================================================
// Defaults
// ============================================================================

/// Reports every user as signed out.
#[derive(Debug, Default, Clone, Copy)]
pub struct Anonymous;

#[async_trait(?Send)]
impl AuthService for Anonymous {
    async fn is_logged_in(&self) -> bool {
        false
    }
}

/// Resolves no change.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLookup;

#[async_trait(?Send)]
impl ChangeLookup for NoLookup {
    async fn resolve_repo_for_change(&self, _change_num: u32) -> Option<String> {
        None
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Reporting for Silent {}
impl Notifier for Silent {}
impl PluginHost for Silent {}

// ============================================================================
// Services
// ============================================================================

/// The full set of collaborators.
///
/// # Example
///
/// ```
/// use review_router::services::{Anonymous, Services};
/// use std::rc::Rc;
///
/// let services = Services::new().auth(Rc::new(Anonymous));
/// ```
#[derive(Clone)]
pub struct Services {
    pub auth: Rc<dyn AuthService>,
    pub lookup: Rc<dyn ChangeLookup>,
    pub reporting: Rc<dyn Reporting>,
    pub notifier: Rc<dyn Notifier>,
    pub plugins: Rc<dyn PluginHost>,
}

impl Services {
    /// Signed-out defaults that do nothing.
    pub fn new() -> Self {
        Self {
            auth: Rc::new(Anonymous),
            lookup: Rc::new(NoLookup),
            reporting: Rc::new(Silent),
            notifier: Rc::new(Silent),
            plugins: Rc::new(Silent),
        }
    }

    pub fn auth(mut self, auth: Rc<dyn AuthService>) -> Self {
        self.auth = auth;
        self
    }

    pub fn lookup(mut self, lookup: Rc<dyn ChangeLookup>) -> Self {
        self.lookup = lookup;
        self
    }

    pub fn reporting(mut self, reporting: Rc<dyn Reporting>) -> Self {
        self.reporting = reporting;
        self
    }

    pub fn notifier(mut self, notifier: Rc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn plugins(mut self, plugins: Rc<dyn PluginHost>) -> Self {
        self.plugins = plugins;
        self
    }
}

impl Default for Services {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}
