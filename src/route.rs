//! The route table.
//!
//! A [`RouteTable`] is the ordered list of `(pattern, name, handler,
//! requires_auth)` registrations. Installing it into a
//! [`Dispatcher`](crate::dispatch::Dispatcher) turns every registration
//! into two enter middleware gated by the route's pattern:
//!
//! 1. [`LoadUser`] awaits the auth probe, so the account is loaded before
//!    any handler reads it, then passes the context on.
//! 2. [`RouteMiddleware`] reports the route, checks auth for protected
//!    routes (redirecting to login when signed out), awaits the handler and
//!    claims the context. If a newer navigation started while the auth
//!    check was pending, neither the redirect nor the handler runs.
//!
//! The first registration whose pattern matches wins. The table is built
//! once at startup and never changes afterwards.

use crate::context::NavigationContext;
use crate::dispatch::{CurrentPath, Dispatcher};
use crate::error::RouterError;
use crate::matching::PathMatcher;
use crate::middleware::{Flow, Middleware};
use crate::params::RouteParams;
use crate::services::{AuthService, Reporting};
use crate::{debug_log, info_log};
use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use std::fmt;
use std::rc::Rc;

/// A route handler. Receives the matched context, params filled in.
pub type Handler = Rc<dyn Fn(NavigationContext) -> LocalBoxFuture<'static, ()>>;

/// Called with the context of a protected route when the user is signed out.
pub type LoginRedirect = Rc<dyn Fn(&NavigationContext)>;

// ============================================================================
// RouteEntry
// ============================================================================

/// One registration.
pub struct RouteEntry {
    matcher: PathMatcher,
    name: String,
    requires_auth: bool,
    handler: Handler,
}

impl RouteEntry {
    /// The handler name, also used as the reporting label.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The route pattern.
    pub fn pattern(&self) -> &str {
        self.matcher.pattern()
    }

    /// Whether the handler only runs for signed-in users.
    pub fn requires_auth(&self) -> bool {
        self.requires_auth
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("pattern", &self.matcher.pattern())
            .field("name", &self.name)
            .field("requires_auth", &self.requires_auth)
            .finish()
    }
}

// ============================================================================
// RouteTable
// ============================================================================

/// Ordered route registrations.
#[derive(Debug, Default)]
pub struct RouteTable {
    entries: Vec<Rc<RouteEntry>>,
}

impl RouteTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route. Fails if `pattern` is not a valid regex.
    pub fn register<F>(
        &mut self,
        pattern: &str,
        name: &str,
        requires_auth: bool,
        handler: F,
    ) -> Result<(), RouterError>
    where
        F: Fn(NavigationContext) -> LocalBoxFuture<'static, ()> + 'static,
    {
        let matcher = PathMatcher::new(pattern)?;
        self.entries.push(Rc::new(RouteEntry {
            matcher,
            name: name.to_string(),
            requires_auth,
            handler: Rc::new(handler),
        }));
        Ok(())
    }

    /// Registrations in order.
    pub fn entries(&self) -> impl Iterator<Item = &RouteEntry> {
        self.entries.iter().map(|entry| entry.as_ref())
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The first route matching `path`, with its parameters.
    pub fn resolve(&self, path: &str) -> Result<(&RouteEntry, RouteParams), RouterError> {
        self.entries
            .iter()
            .find_map(|entry| {
                entry
                    .matcher
                    .matches(path)
                    .map(|params| (entry.as_ref(), params))
            })
            .ok_or_else(|| RouterError::RouteNotFound {
                path: path.to_string(),
            })
    }

    /// Add two enter middleware per route to `dispatcher`, in table order.
    pub fn install(
        &self,
        dispatcher: &Dispatcher,
        auth: Rc<dyn AuthService>,
        reporting: Rc<dyn Reporting>,
        on_login_required: LoginRedirect,
    ) {
        let current = dispatcher.current_path_handle();
        for entry in &self.entries {
            dispatcher.add_enter(
                Some(entry.matcher.clone()),
                Rc::new(LoadUser { auth: auth.clone() }),
            );
            dispatcher.add_enter(
                Some(entry.matcher.clone()),
                Rc::new(RouteMiddleware {
                    entry: entry.clone(),
                    auth: auth.clone(),
                    reporting: reporting.clone(),
                    on_login_required: on_login_required.clone(),
                    current: current.clone(),
                }),
            );
        }
        info_log!("installed {} routes", self.entries.len());
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Awaits the auth probe, then continues.
pub struct LoadUser {
    auth: Rc<dyn AuthService>,
}

#[async_trait(?Send)]
impl Middleware for LoadUser {
    async fn call(&self, _ctx: &NavigationContext) -> Flow {
        self.auth.is_logged_in().await;
        Flow::Next
    }

    fn name(&self) -> &str {
        "LoadUser"
    }
}

/// Runs one route's handler.
pub struct RouteMiddleware {
    entry: Rc<RouteEntry>,
    auth: Rc<dyn AuthService>,
    reporting: Rc<dyn Reporting>,
    on_login_required: LoginRedirect,
    current: CurrentPath,
}

#[async_trait(?Send)]
impl Middleware for RouteMiddleware {
    async fn call(&self, ctx: &NavigationContext) -> Flow {
        self.reporting.location_changed(&self.entry.name);
        if self.entry.requires_auth {
            let logged_in = self.auth.is_logged_in().await;
            if !self.current.is(&ctx.path) {
                // The dispatcher reports the stale context as superseded.
                debug_log!("'{}' superseded during auth check", ctx.path);
                return Flow::Next;
            }
            if !logged_in {
                debug_log!("'{}' requires sign-in, redirecting to login", ctx.path);
                (self.on_login_required)(ctx);
                return Flow::Handled;
            }
        }
        (self.entry.handler)(ctx.clone()).await;
        Flow::Handled
    }

    fn name(&self) -> &str {
        &self.entry.name
    }
}
