//! Client-side navigation router for a code review web UI.
//!
//! The router maps browser URLs to typed view states. Every navigation
//! produces a [`NavigationContext`] that flows through exit middleware for
//! the page being left and enter middleware for the page being opened;
//! route handlers at the end of the chain publish a [`ViewState`] to the
//! observable models in [`sync`].
//!
//! # Features
//!
//! - Ordered regex routes with positional parameters
//! - Exit/enter middleware with supersession of stale navigations
//! - History sync through a [`Platform`] abstraction (wasm or native)
//! - Navigation blocking with a timeout
//! - Canonical URL generation for every view
//! - Link click interception
//! - Optional LRU cache for route matching (`cache` feature)
//!
//! # Example
//!
//! ```ignore
//! use review_router::{Router, RouterConfig, Services};
//!
//! let router = Router::new(RouterConfig::new().base_url("/r"), platform, Services::new());
//! router.start()?;
//! router.show("/c/myrepo/+/42");
//!
//! let _sub = router.models().change.subscribe(|change| {
//!     if let Some(change) = change {
//!         render_change(change);
//!     }
//! });
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

#[macro_use]
pub mod logging;

pub mod blocker;
#[cfg(feature = "cache")]
pub mod cache;
pub mod click;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod history;
pub mod matching;
pub mod middleware;
pub mod params;
pub mod patterns;
pub mod platform;
pub mod route;
pub mod router;
pub mod services;
pub mod sync;
pub mod url;
pub mod view_state;

#[cfg(test)]
mod testing;

pub use blocker::NavigationBlocker;
pub use click::{ClickDecision, ClickEvent, ClickEventKind, EventNode, IgnoreReason};
pub use config::RouterConfig;
pub use context::NavigationContext;
pub use dispatch::Dispatcher;
pub use error::{DispatchOutcome, RouterError};
pub use history::{HistoryEntry, MemoryHistory};
pub use matching::PathMatcher;
pub use middleware::{middleware_fn, Flow, Middleware};
pub use params::{QueryParams, RouteParams};
pub use platform::{LocationChange, Platform};
pub use router::Router;
pub use services::{
    AuthService, ChangeLookup, MenuLink, Notifier, PluginHost, Reporting, Services,
};
pub use sync::{RouterState, StateModel, Subscription, ViewModels};
pub use crate::url::{generate_url, SearchTerms};
pub use view_state::{
    AdminSection, AdminViewState, ChangeChildView, ChangeViewState, DashboardSection,
    DashboardViewState, DocumentationViewState, GroupDetailView, GroupViewState, LineAddress,
    PatchSetNum, PluginViewState, RepoDetailView, RepoViewState, SearchViewState,
    SettingsViewState, View, ViewState,
};
