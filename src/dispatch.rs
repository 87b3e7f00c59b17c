//! The exit/enter middleware pipeline.
//!
//! A [`Dispatcher`] owns two ordered middleware lists. Dispatching a new
//! context runs three phases:
//!
//! 1. **Exit**: exit middleware whose matcher accepts the *previous*
//!    context's path, in registration order. Skipped on the first dispatch.
//! 2. **Enter**: enter middleware whose matcher accepts the new path, in
//!    registration order, until one claims the context.
//! 3. **Unhandled**: if every enter middleware fell through, the context is
//!    marked unhandled and the unhandled callback fires.
//!
//! Before each enter middleware runs, the dispatcher checks that the
//! context's path is still the router's current path. A middleware that
//! redirects (directly, or by awaiting something while a newer navigation
//! starts) therefore stops the rest of the stale chain.
//!
//! Panics in middleware are not caught.

#[cfg(feature = "cache")]
use crate::cache::{MatchCache, MatchKey};
use crate::context::NavigationContext;
use crate::error::DispatchOutcome;
use crate::matching::PathMatcher;
use crate::middleware::{Flow, Middleware};
use crate::params::RouteParams;
use crate::{debug_log, trace_log};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Callback fired for contexts no enter middleware claimed.
pub type UnhandledFn = Rc<dyn Fn(&NavigationContext)>;

/// Shared handle on the path of the most recent navigation.
///
/// Middleware that suspends hands this to itself so it can tell, once it
/// resumes, whether a newer navigation has started in the meantime.
#[derive(Clone, Default)]
pub struct CurrentPath(Rc<RefCell<String>>);

impl CurrentPath {
    /// Replace the recorded path.
    pub fn set(&self, path: &str) {
        let mut current = self.0.borrow_mut();
        current.clear();
        current.push_str(path);
    }

    /// The recorded path.
    pub fn get(&self) -> String {
        self.0.borrow().clone()
    }

    /// Whether `path` is still the recorded path.
    pub fn is(&self, path: &str) -> bool {
        *self.0.borrow() == path
    }

    fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

/// A middleware plus the matcher that gates it.
pub struct MiddlewareEntry {
    id: usize,
    matcher: Option<PathMatcher>,
    middleware: Rc<dyn Middleware>,
}

impl MiddlewareEntry {
    /// Middleware name, for diagnostics.
    pub fn name(&self) -> &str {
        self.middleware.name()
    }

    /// The gating pattern, `None` for global middleware.
    pub fn pattern(&self) -> Option<&str> {
        self.matcher.as_ref().map(PathMatcher::pattern)
    }
}

/// Runs navigation contexts through the exit and enter middleware lists.
pub struct Dispatcher {
    enters: RefCell<Vec<Rc<MiddlewareEntry>>>,
    exits: RefCell<Vec<Rc<MiddlewareEntry>>>,
    next_id: Cell<usize>,
    current_path: CurrentPath,
    previous: RefCell<Option<NavigationContext>>,
    unhandled: RefCell<Option<UnhandledFn>>,
    #[cfg(feature = "cache")]
    cache: RefCell<MatchCache>,
}

impl Dispatcher {
    /// Create an empty dispatcher.
    pub fn new() -> Self {
        Self {
            enters: RefCell::new(Vec::new()),
            exits: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
            current_path: CurrentPath::default(),
            previous: RefCell::new(None),
            unhandled: RefCell::new(None),
            #[cfg(feature = "cache")]
            cache: RefCell::new(MatchCache::new()),
        }
    }

    /// Create a dispatcher whose match cache holds `capacity` results.
    #[cfg(feature = "cache")]
    pub fn with_cache_capacity(capacity: usize) -> Self {
        let dispatcher = Self::new();
        dispatcher.cache.replace(MatchCache::with_capacity(capacity));
        dispatcher
    }

    fn entry(
        &self,
        matcher: Option<PathMatcher>,
        middleware: Rc<dyn Middleware>,
    ) -> Rc<MiddlewareEntry> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        #[cfg(feature = "cache")]
        self.cache.borrow_mut().clear();
        Rc::new(MiddlewareEntry {
            id,
            matcher,
            middleware,
        })
    }

    /// Append an enter middleware. `None` runs it for every path.
    pub fn add_enter(&self, matcher: Option<PathMatcher>, middleware: Rc<dyn Middleware>) {
        let entry = self.entry(matcher, middleware);
        trace_log!("enter middleware #{} '{}' ({:?})", entry.id, entry.name(), entry.pattern());
        self.enters.borrow_mut().push(entry);
    }

    /// Append an exit middleware. `None` runs it for every previous path.
    pub fn add_exit(&self, matcher: Option<PathMatcher>, middleware: Rc<dyn Middleware>) {
        let entry = self.entry(matcher, middleware);
        trace_log!("exit middleware #{} '{}' ({:?})", entry.id, entry.name(), entry.pattern());
        self.exits.borrow_mut().push(entry);
    }

    /// Set the callback fired for unclaimed contexts.
    pub fn on_unhandled(&self, callback: impl Fn(&NavigationContext) + 'static) {
        self.unhandled.replace(Some(Rc::new(callback)));
    }

    /// Record `path` as the navigation every in-flight dispatch must match.
    pub fn set_current_path(&self, path: &str) {
        self.current_path.set(path);
    }

    /// The path of the most recent navigation.
    pub fn current_path(&self) -> String {
        self.current_path.get()
    }

    /// A handle that tracks [`current_path`](Self::current_path) from now on.
    pub fn current_path_handle(&self) -> CurrentPath {
        self.current_path.clone()
    }

    /// The most recently dispatched context.
    pub fn previous(&self) -> Option<NavigationContext> {
        self.previous.borrow().clone()
    }

    /// Number of enter middleware.
    pub fn enter_count(&self) -> usize {
        self.enters.borrow().len()
    }

    /// Number of exit middleware.
    pub fn exit_count(&self) -> usize {
        self.exits.borrow().len()
    }

    /// Drop all middleware, the previous context and the unhandled callback.
    pub fn clear(&self) {
        self.enters.borrow_mut().clear();
        self.exits.borrow_mut().clear();
        self.previous.replace(None);
        self.unhandled.replace(None);
        self.current_path.clear();
        #[cfg(feature = "cache")]
        self.cache.borrow_mut().clear();
    }

    fn match_entry(&self, entry: &MiddlewareEntry, path: &str) -> Option<RouteParams> {
        match &entry.matcher {
            Some(matcher) => self.run_matcher(entry.id, matcher, path),
            None => Some(RouteParams::new()),
        }
    }

    #[cfg(feature = "cache")]
    fn run_matcher(&self, id: usize, matcher: &PathMatcher, path: &str) -> Option<RouteParams> {
        let key = MatchKey::new(id, path);
        if let Some(cached) = self.cache.borrow_mut().get(&key) {
            return cached;
        }
        let result = matcher.matches(path);
        self.cache.borrow_mut().insert(key, result.clone());
        result
    }

    #[cfg(not(feature = "cache"))]
    fn run_matcher(&self, _id: usize, matcher: &PathMatcher, path: &str) -> Option<RouteParams> {
        matcher.matches(path)
    }

    fn is_current(&self, ctx: &NavigationContext) -> bool {
        self.current_path.is(&ctx.path)
    }

    /// Run `ctx` through the pipeline.
    ///
    /// Middleware lists are snapshotted up front; middleware registered
    /// during the dispatch only affects later dispatches.
    pub async fn dispatch(&self, mut ctx: NavigationContext) -> DispatchOutcome {
        debug_log!("dispatch '{}'", ctx.path);
        let previous = self.previous.replace(Some(ctx.clone()));

        if let Some(prev) = previous {
            let exits: Vec<_> = self.exits.borrow().clone();
            for entry in exits {
                let Some(params) = self.match_entry(&entry, &prev.path) else {
                    continue;
                };
                let mut exit_ctx = prev.clone();
                exit_ctx.params = params;
                trace_log!("exit '{}' for '{}'", entry.name(), prev.path);
                match entry.middleware.call(&exit_ctx).await {
                    Flow::Next => {}
                    Flow::Handled => {
                        debug_log!(
                            "exit '{}' cancelled navigation to '{}'",
                            entry.name(),
                            ctx.path
                        );
                        return DispatchOutcome::Cancelled;
                    }
                    Flow::Refused(reason) => {
                        debug_log!("exit '{}' refused '{}': {}", entry.name(), ctx.path, reason);
                        return DispatchOutcome::Blocked { reason };
                    }
                }
            }
        }

        let enters: Vec<_> = self.enters.borrow().clone();
        for entry in enters {
            if !self.is_current(&ctx) {
                debug_log!(
                    "dispatch '{}' superseded by '{}'",
                    ctx.path,
                    self.current_path.get()
                );
                return DispatchOutcome::Superseded;
            }
            let Some(params) = self.match_entry(&entry, &ctx.path) else {
                continue;
            };
            ctx.params = params;
            trace_log!("enter '{}' for '{}'", entry.name(), ctx.path);
            match entry.middleware.call(&ctx).await {
                Flow::Next => {}
                Flow::Handled => {
                    ctx.handled = true;
                    debug_log!("'{}' handled by '{}'", ctx.path, entry.name());
                    return DispatchOutcome::Handled;
                }
                Flow::Refused(reason) => {
                    debug_log!("'{}' refused by '{}': {}", ctx.path, entry.name(), reason);
                    return DispatchOutcome::Blocked { reason };
                }
            }
        }

        if !self.is_current(&ctx) {
            return DispatchOutcome::Superseded;
        }

        ctx.handled = false;
        debug_log!("no middleware claimed '{}'", ctx.path);
        let callback = self.unhandled.borrow().clone();
        if let Some(callback) = callback {
            callback(&ctx);
        }
        DispatchOutcome::Unhandled
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::middleware_fn;

    type Log = Rc<RefCell<Vec<String>>>;

    fn recorder(log: &Log, label: &'static str, flow: Flow) -> Rc<dyn Middleware> {
        let log = log.clone();
        Rc::new(middleware_fn(move |ctx: NavigationContext| {
            let log = log.clone();
            let flow = flow.clone();
            async move {
                log.borrow_mut().push(format!("{}:{}", label, ctx.path));
                flow
            }
        }))
    }

    fn navigate(dispatcher: &Dispatcher, path: &str) -> DispatchOutcome {
        dispatcher.set_current_path(path);
        let ctx = NavigationContext::new(path, None, "");
        pollster::block_on(dispatcher.dispatch(ctx))
    }

    fn matcher(pattern: &str) -> Option<PathMatcher> {
        Some(PathMatcher::new(pattern).unwrap())
    }

    #[test]
    fn test_first_registered_match_wins() {
        let log = Log::default();
        let dispatcher = Dispatcher::new();
        dispatcher.add_enter(
            matcher(r"^/admin/repos/(.+),general$"),
            recorder(&log, "general", Flow::Handled),
        );
        dispatcher.add_enter(
            matcher(r"^/admin/repos/([^,]+)$"),
            recorder(&log, "bare", Flow::Handled),
        );
        dispatcher.add_enter(matcher(r".*"), recorder(&log, "any", Flow::Handled));

        assert!(navigate(&dispatcher, "/admin/repos/foo,general").is_handled());
        assert_eq!(*log.borrow(), vec!["general:/admin/repos/foo,general"]);
    }

    #[test]
    fn test_exit_runs_before_enter() {
        let log = Log::default();
        let dispatcher = Dispatcher::new();
        dispatcher.add_exit(None, recorder(&log, "exit", Flow::Next));
        dispatcher.add_enter(None, recorder(&log, "enter", Flow::Handled));

        navigate(&dispatcher, "/a");
        navigate(&dispatcher, "/b");
        assert_eq!(*log.borrow(), vec!["enter:/a", "exit:/a", "enter:/b"]);
    }

    #[test]
    fn test_exit_matcher_uses_previous_path() {
        let log = Log::default();
        let dispatcher = Dispatcher::new();
        dispatcher.add_exit(matcher(r"^/settings"), recorder(&log, "exit", Flow::Next));
        dispatcher.add_enter(None, recorder(&log, "enter", Flow::Handled));

        navigate(&dispatcher, "/q/x");
        navigate(&dispatcher, "/settings");
        navigate(&dispatcher, "/q/y");
        assert_eq!(
            *log.borrow(),
            vec!["enter:/q/x", "enter:/settings", "exit:/settings", "enter:/q/y"]
        );
    }

    #[test]
    fn test_exit_can_cancel() {
        let log = Log::default();
        let dispatcher = Dispatcher::new();
        dispatcher.add_exit(None, recorder(&log, "exit", Flow::Handled));
        dispatcher.add_enter(None, recorder(&log, "enter", Flow::Handled));

        navigate(&dispatcher, "/a");
        assert!(navigate(&dispatcher, "/b").is_cancelled());
        assert_eq!(*log.borrow(), vec!["enter:/a", "exit:/a"]);
    }

    #[test]
    fn test_stale_dispatch_abandoned() {
        let log = Log::default();
        let dispatcher = Rc::new(Dispatcher::new());
        let weak = Rc::downgrade(&dispatcher);
        dispatcher.add_enter(
            None,
            Rc::new(middleware_fn(move |_ctx: NavigationContext| {
                let weak = weak.clone();
                async move {
                    if let Some(dispatcher) = weak.upgrade() {
                        dispatcher.set_current_path("/elsewhere");
                    }
                    Flow::Next
                }
            })),
        );
        dispatcher.add_enter(None, recorder(&log, "later", Flow::Handled));

        assert!(navigate(&dispatcher, "/a").is_superseded());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_unhandled_callback() {
        let seen = Log::default();
        let dispatcher = Dispatcher::new();
        dispatcher.add_enter(matcher(r"^/settings$"), recorder(&seen, "settings", Flow::Handled));
        let unhandled = seen.clone();
        dispatcher.on_unhandled(move |ctx| {
            assert!(!ctx.handled);
            unhandled.borrow_mut().push(format!("unhandled:{}", ctx.path));
        });

        assert!(navigate(&dispatcher, "/nowhere").is_unhandled());
        assert_eq!(*seen.borrow(), vec!["unhandled:/nowhere"]);
    }

    #[test]
    fn test_refused_stops_chain() {
        let log = Log::default();
        let dispatcher = Dispatcher::new();
        dispatcher.add_enter(None, recorder(&log, "blocker", Flow::Refused("saving".into())));
        dispatcher.add_enter(None, recorder(&log, "route", Flow::Handled));

        let outcome = navigate(&dispatcher, "/a");
        assert_eq!(outcome.block_reason(), Some("saving"));
        assert_eq!(*log.borrow(), vec!["blocker:/a"]);
    }

    #[test]
    fn test_params_reach_middleware() {
        let captured = Log::default();
        let dispatcher = Dispatcher::new();
        let sink = captured.clone();
        dispatcher.add_enter(
            matcher(r"^/c/(.+)/\+/(\d+)$"),
            Rc::new(middleware_fn(move |ctx: NavigationContext| {
                let sink = sink.clone();
                async move {
                    sink.borrow_mut().push(format!(
                        "{}#{}",
                        ctx.params.get(0).unwrap_or_default(),
                        ctx.params.get(1).unwrap_or_default()
                    ));
                    Flow::Handled
                }
            })),
        );

        navigate(&dispatcher, "/c/my/repo/+/42");
        navigate(&dispatcher, "/c/my/repo/+/42");
        assert_eq!(*captured.borrow(), vec!["my/repo#42", "my/repo#42"]);
    }

    #[test]
    fn test_current_path_handle_follows_dispatcher() {
        let dispatcher = Dispatcher::new();
        let handle = dispatcher.current_path_handle();
        dispatcher.set_current_path("/a");
        assert!(handle.is("/a"));

        dispatcher.set_current_path("/b");
        assert!(!handle.is("/a"));
        assert_eq!(handle.get(), "/b");

        dispatcher.clear();
        assert_eq!(handle.get(), "");
    }

    #[test]
    fn test_clear() {
        let dispatcher = Dispatcher::new();
        dispatcher.add_enter(None, recorder(&Log::default(), "x", Flow::Next));
        dispatcher.add_exit(None, recorder(&Log::default(), "y", Flow::Next));
        navigate(&dispatcher, "/a");
        assert!(dispatcher.previous().is_some());

        dispatcher.clear();
        assert_eq!(dispatcher.enter_count(), 0);
        assert_eq!(dispatcher.exit_count(), 0);
        assert!(dispatcher.previous().is_none());
    }
}
