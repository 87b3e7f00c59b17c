//! The router.
//!
//! [`Router`] wires the pieces together: it owns the dispatcher, the
//! history bridge, the navigation blocker and the view-state models, builds
//! the route table on [`start`](Router::start), and implements every route
//! handler of the review UI.
//!
//! # Pipeline
//!
//! Exit middleware (one, global):
//! - report `before_location_changed` unless the navigation is a redirect,
//!   then clear the redirect and initial-load flags.
//!
//! Enter middleware, in order:
//! 1. blocker check: wait for active block reasons to clear, or refuse;
//! 2. drop the `usp` tracking parameter with a redirect;
//! 3. scroll to top, redirect `#/x/...` hashes, schedule the deferred
//!    `location-change` notification;
//! 4. the route table, two middleware per route (see [`crate::route`]).
//!
//! # Example
//!
//! ```ignore
//! let router = Router::new(RouterConfig::new(), platform, Services::new());
//! router.start()?;
//! router.show("/c/myrepo/+/42");
//! ```

use crate::blocker::NavigationBlocker;
use crate::click::{ClickDecision, ClickEvent, ClickEventKind, ClickInterceptor};
use crate::config::RouterConfig;
use crate::context::{base_relative, NavigationContext};
use crate::dispatch::Dispatcher;
use crate::error::{DispatchOutcome, RouterError};
use crate::history::{BackAction, HistoryBridge, HistoryEntry, PopAction};
use crate::matching::PathMatcher;
use crate::middleware::{Flow, Middleware};
use crate::params::{decode_uri, encode_component, QueryParams};
use crate::patterns;
use crate::platform::{path_of, LocationChange, Platform};
use crate::route::RouteTable;
use crate::services::{MenuLink, Services};
use crate::sync::{change_url_rewrite, RouterState, Subscription, ViewModels};
use crate::url::{generate_url, normalize_patch_range, root_url};
use crate::view_state::{
    AdminSection, AdminViewState, ChangeChildView, ChangeViewState, DashboardSection,
    DashboardViewState, DocumentationViewState, GroupDetailView, GroupViewState, LineAddress,
    PatchSetNum, PluginViewState, RepoDetailView, RepoViewState, SearchViewState,
    SettingsViewState, ViewState,
};
use crate::{debug_log, info_log, trace_log, warn_log};
use async_trait::async_trait;
use futures::future;
use futures::FutureExt;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::{Rc, Weak};

/// Title of a custom dashboard without a `title` parameter.
pub const DEFAULT_DASHBOARD_TITLE: &str = "Custom Dashboard";

/// How a navigation is written to history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Commit {
    Push,
    Replace,
    Skip,
}

// ============================================================================
// Router
// ============================================================================

/// The navigation router of the review UI.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct Router {
    inner: Rc<RouterInner>,
}

struct RouterInner {
    weak: Weak<RouterInner>,
    config: RouterConfig,
    platform: Rc<dyn Platform>,
    services: Services,
    dispatcher: Dispatcher,
    history: HistoryBridge,
    blocker: NavigationBlocker,
    click: ClickInterceptor,
    models: ViewModels,
    routes: RefCell<RouteTable>,
    started: Cell<bool>,
    is_redirecting: Cell<bool>,
    is_initial_load: Cell<bool>,
    just_registered: Cell<bool>,
    /// Canonical path of the last navigation a route handled.
    displayed: RefCell<Option<String>>,
    change_sync: RefCell<Option<Subscription>>,
}

impl Router {
    /// Create a router. Nothing is dispatched until [`start`](Self::start).
    pub fn new(config: RouterConfig, platform: Rc<dyn Platform>, services: Services) -> Self {
        #[cfg(feature = "cache")]
        let dispatcher = Dispatcher::with_cache_capacity(config.cache_capacity);
        #[cfg(not(feature = "cache"))]
        let dispatcher = Dispatcher::new();

        let inner = Rc::new_cyclic(|weak| RouterInner {
            weak: weak.clone(),
            history: HistoryBridge::new(platform.clone()),
            blocker: NavigationBlocker::new(platform.clone()),
            click: ClickInterceptor::new(config.base_url.clone()),
            config,
            platform,
            services,
            dispatcher,
            models: ViewModels::new(),
            routes: RefCell::new(RouteTable::new()),
            started: Cell::new(false),
            is_redirecting: Cell::new(false),
            is_initial_load: Cell::new(true),
            just_registered: Cell::new(false),
            displayed: RefCell::new(None),
            change_sync: RefCell::new(None),
        });
        Self { inner }
    }

    /// Install the middleware and routes, then dispatch the current location.
    ///
    /// Starting twice is a no-op.
    pub fn start(&self) -> Result<(), RouterError> {
        if self.inner.started.get() {
            return Ok(());
        }
        self.inner.install()?;
        self.inner.started.set(true);

        let location = path_of(&self.inner.platform.location());
        info_log!("router started at '{}'", location);
        self.inner.navigate(&location, None, Commit::Replace);
        Ok(())
    }

    /// Remove every middleware and stop syncing the change URL.
    pub fn stop(&self) {
        self.inner.dispatcher.clear();
        self.inner.routes.replace(RouteTable::new());
        self.inner.change_sync.replace(None);
        self.inner.started.set(false);
        info_log!("router stopped");
    }

    /// Whether [`start`](Self::start) ran.
    pub fn is_started(&self) -> bool {
        self.inner.started.get()
    }

    /// Navigate to `path`, adding a history entry.
    pub fn show(&self, path: &str) -> NavigationContext {
        self.inner.navigate(path, None, Commit::Push)
    }

    /// Navigate to `path`, replacing the current history entry.
    pub fn replace(&self, path: &str) -> NavigationContext {
        self.inner.navigate(path, None, Commit::Replace)
    }

    /// Replace the current navigation with `path` without reporting a
    /// location change.
    pub fn redirect(&self, path: &str) -> NavigationContext {
        self.inner.redirect(path)
    }

    /// Go back one entry, or to the root when this app pushed none.
    pub fn back(&self) {
        self.inner.back();
    }

    /// Handle a `popstate` event.
    pub fn on_popstate(&self, state: Option<HistoryEntry>) {
        match self.inner.history.on_popstate(state) {
            Some(PopAction::Replace(entry)) => {
                let path = entry.path.clone();
                self.inner.navigate(&path, Some(entry), Commit::Replace);
            }
            Some(PopAction::Show(path)) => {
                self.inner.navigate(&path, None, Commit::Skip);
            }
            None => {}
        }
    }

    /// Handle the page `load` event.
    pub fn on_load(&self) {
        self.inner.history.mark_loaded();
    }

    /// Handle a click or touch. Returns `true` when the caller must call
    /// `preventDefault()` on the event.
    pub fn handle_click(&self, event: &ClickEvent) -> bool {
        if event.kind != ClickEventKind::for_device(self.inner.config.touch_only) {
            return false;
        }
        match self.inner.click.decide(event, &self.inner.platform.location()) {
            ClickDecision::Navigate(path) => {
                self.show(&path);
                true
            }
            ClickDecision::Ignore(reason) => {
                trace_log!("click left to the browser: {:?}", reason);
                false
            }
        }
    }

    /// Hold navigation until `reason` is released.
    pub fn block_navigation(&self, reason: &str) {
        self.inner.blocker.block(reason);
    }

    /// Release a reason added with [`block_navigation`](Self::block_navigation).
    pub fn release_navigation(&self, reason: &str) {
        self.inner.blocker.release(reason);
    }

    /// Whether any block reason is active.
    pub fn is_navigation_blocked(&self) -> bool {
        self.inner.blocker.is_blocked()
    }

    /// Canonical URL of `view`, base prefix included.
    pub fn generate_url(&self, view: &ViewState) -> String {
        generate_url(view, &self.inner.config.base_url)
    }

    /// The active view and change coordinates.
    pub fn router_state(&self) -> Option<RouterState> {
        self.inner.models.router.get_state()
    }

    /// The view-state models.
    pub fn models(&self) -> &ViewModels {
        &self.inner.models
    }

    /// Whether the current page was reached through `/register`.
    pub fn just_registered(&self) -> bool {
        self.inner.just_registered.get()
    }

    /// The route that would handle `path`.
    pub fn resolve(&self, path: &str) -> Result<String, RouterError> {
        if !self.inner.started.get() {
            return Err(RouterError::NotStarted);
        }
        let ctx = NavigationContext::new(path, None, &self.inner.config.base_url);
        let routes = self.inner.routes.borrow();
        routes
            .resolve(&ctx.path)
            .map(|(entry, _)| entry.name().to_string())
    }

    /// Entries of the admin menu: the built-in lists the user may see,
    /// followed by plugin contributions.
    pub async fn admin_links(&self) -> Vec<MenuLink> {
        let base = &self.inner.config.base_url;
        let list = |section| generate_url(&ViewState::Admin(AdminViewState::list(section)), base);

        let mut links = vec![MenuLink::new("Repositories", list(AdminSection::Repos))];
        if self.inner.services.auth.is_logged_in().await {
            links.push(MenuLink::new("Groups", list(AdminSection::Groups)));
            links.push(
                MenuLink::new("Plugins", list(AdminSection::Plugins)).capability("viewPlugins"),
            );
        }
        links.extend(self.inner.services.plugins.admin_menu_links());
        links
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("base_url", &self.inner.config.base_url)
            .field("started", &self.inner.started.get())
            .field("current_path", &self.inner.dispatcher.current_path())
            .finish()
    }
}

// ============================================================================
// Navigation
// ============================================================================

impl RouterInner {
    fn base(&self) -> &str {
        &self.config.base_url
    }

    fn navigate(
        &self,
        path: &str,
        state: Option<HistoryEntry>,
        commit: Commit,
    ) -> NavigationContext {
        let ctx = NavigationContext::new(path, state, self.base());
        if !self.started.get() {
            warn_log!("ignoring navigation to '{}': {}", path, RouterError::NotStarted);
            return ctx;
        }
        debug_log!("navigate to '{}' ({:?})", ctx.canonical_path, commit);
        self.dispatcher.set_current_path(&ctx.path);
        match commit {
            Commit::Push => self.history.push(&ctx),
            Commit::Replace => self.history.replace(&ctx),
            Commit::Skip => {}
        }
        self.spawn_dispatch(ctx.clone());
        ctx
    }

    fn spawn_dispatch(&self, ctx: NavigationContext) {
        let weak = self.weak.clone();
        self.platform.spawn(
            async move {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                let path = ctx.path.clone();
                let canonical = ctx.canonical_path.clone();
                let outcome = inner.dispatcher.dispatch(ctx).await;
                inner.finish_dispatch(&path, canonical, &outcome);
            }
            .boxed_local(),
        );
    }

    fn finish_dispatch(&self, path: &str, canonical: String, outcome: &DispatchOutcome) {
        let current = self.dispatcher.current_path() == path;
        match outcome {
            DispatchOutcome::Handled if current => {
                self.displayed.replace(Some(canonical));
            }
            DispatchOutcome::Blocked { reason } if current => {
                // Put the address bar back on the page that is still shown.
                if let Some(shown) = self.displayed.borrow().as_deref() {
                    debug_log!("restoring '{}' after blocked navigation ({})", shown, reason);
                    self.history.replace_url(shown);
                }
            }
            _ => {}
        }
        debug_log!("dispatch '{}' finished: {:?}", path, outcome);
    }

    fn redirect(&self, path: &str) -> NavigationContext {
        debug_log!("redirect to '{}'", path);
        self.is_redirecting.set(true);
        self.navigate(path, None, Commit::Replace)
    }

    fn back(&self) {
        if let BackAction::Show(path) = self.history.back(&root_url(self.base())) {
            let weak = self.weak.clone();
            self.platform.spawn(
                async move {
                    if let Some(inner) = weak.upgrade() {
                        inner.navigate(&path, None, Commit::Push);
                    }
                }
                .boxed_local(),
            );
        }
    }

    fn redirect_to_login(&self, canonical_path: &str) {
        let return_url = base_relative(canonical_path, self.base()).unwrap_or(canonical_path);
        let login = format!("{}{}", self.config.login_path, encode_component(return_url));
        info_log!("sign-in required, showing '{}'", login);
        self.navigate(&login, None, Commit::Push);
    }

    fn is_current(&self, ctx: &NavigationContext) -> bool {
        self.dispatcher.current_path() == ctx.path
    }

    fn set_view(&self, state: ViewState) {
        trace_log!("view state {:?}", state.view());
        self.models.apply(&state);
    }

    fn show_not_found(&self) {
        warn_log!("showing not-found page");
        self.services.notifier.show_not_found();
    }

    fn reload(&self) {
        debug_log!("handing navigation to the server");
        self.platform.reload();
    }

    fn on_unhandled(&self, ctx: &NavigationContext) {
        if self.displayed.borrow().as_deref() == Some(ctx.canonical_path.as_str()) {
            return;
        }
        warn_log!("no route for '{}', loading from server", ctx.canonical_path);
        self.platform.assign(&ctx.canonical_path);
    }

    fn sync_change_url(&self, change: &ChangeViewState) {
        if let Some(url) = change_url_rewrite(change, &self.platform.location(), self.base()) {
            debug_log!("change url out of sync, rewriting to '{}'", url);
            self.history.replace_url(&url);
        }
    }
}

// ============================================================================
// Installation
// ============================================================================

impl RouterInner {
    fn install(&self) -> Result<(), RouterError> {
        self.dispatcher.add_exit(None, Rc::new(ExitReporter { router: self.weak.clone() }));
        self.dispatcher.add_enter(None, Rc::new(BlockerCheck { router: self.weak.clone() }));
        self.dispatcher.add_enter(None, Rc::new(StripTrackingParam { router: self.weak.clone() }));
        self.dispatcher.add_enter(
            None,
            Rc::new(PageSetup {
                router: self.weak.clone(),
                plugin_screen: PathMatcher::new(patterns::PLUGIN_SCREEN)?,
            }),
        );

        let table = self.build_routes()?;
        let login = self.weak.clone();
        table.install(
            &self.dispatcher,
            self.services.auth.clone(),
            self.services.reporting.clone(),
            Rc::new(move |ctx: &NavigationContext| {
                if let Some(inner) = login.upgrade() {
                    inner.redirect_to_login(&ctx.canonical_path);
                }
            }),
        );
        self.routes.replace(table);

        let unhandled = self.weak.clone();
        self.dispatcher.on_unhandled(move |ctx| {
            if let Some(inner) = unhandled.upgrade() {
                inner.on_unhandled(ctx);
            }
        });

        let sync = self.weak.clone();
        let subscription = self.models.change.subscribe(move |state| {
            if let (Some(inner), Some(change)) = (sync.upgrade(), state) {
                inner.sync_change_url(change);
            }
        });
        self.change_sync.replace(Some(subscription));
        Ok(())
    }

    /// Register a synchronous handler.
    fn route(
        &self,
        table: &mut RouteTable,
        pattern: &str,
        name: &str,
        requires_auth: bool,
        handler: fn(&RouterInner, &NavigationContext),
    ) -> Result<(), RouterError> {
        let weak = self.weak.clone();
        table.register(pattern, name, requires_auth, move |ctx| {
            if let Some(inner) = weak.upgrade() {
                handler(&inner, &ctx);
            }
            future::ready(()).boxed_local()
        })
    }

    /// Register a handler that awaits a collaborator.
    fn route_async<H, Fut>(
        &self,
        table: &mut RouteTable,
        pattern: &str,
        name: &str,
        requires_auth: bool,
        handler: H,
    ) -> Result<(), RouterError>
    where
        H: Fn(Rc<RouterInner>, NavigationContext) -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        let weak = self.weak.clone();
        table.register(pattern, name, requires_auth, move |ctx| match weak.upgrade() {
            Some(inner) => handler(inner, ctx).boxed_local(),
            None => future::ready(()).boxed_local(),
        })
    }

    fn build_routes(&self) -> Result<RouteTable, RouterError> {
        use patterns as p;
        let mut t = RouteTable::new();

        self.route_async(&mut t, p::ROOT, "handleRootRoute", false, Self::handle_root)?;
        self.route_async(
            &mut t,
            p::DASHBOARD,
            "handleDashboardRoute",
            false,
            Self::handle_dashboard,
        )?;
        self.route(
            &mut t,
            p::CUSTOM_DASHBOARD,
            "handleCustomDashboardRoute",
            false,
            Self::handle_custom_dashboard,
        )?;
        self.route(
            &mut t,
            p::PROJECT_DASHBOARD,
            "handleProjectDashboardRoute",
            false,
            Self::handle_project_dashboard,
        )?;
        self.route(
            &mut t,
            p::LEGACY_PROJECT_DASHBOARD,
            "handleLegacyProjectDashboardRoute",
            false,
            Self::handle_legacy_project_dashboard,
        )?;

        self.route(&mut t, p::GROUP_INFO, "handleGroupInfoRoute", true, Self::handle_group_info)?;
        self.route(
            &mut t,
            p::GROUP_AUDIT_LOG,
            "handleGroupAuditLogRoute",
            true,
            Self::handle_group_audit_log,
        )?;
        self.route(
            &mut t,
            p::GROUP_MEMBERS,
            "handleGroupMembersRoute",
            true,
            Self::handle_group_members,
        )?;
        self.route(
            &mut t,
            p::GROUP_LIST_OFFSET,
            "handleGroupListOffsetRoute",
            true,
            Self::handle_group_list_offset,
        )?;
        self.route(
            &mut t,
            p::GROUP_LIST_FILTER_OFFSET,
            "handleGroupListFilterOffsetRoute",
            true,
            Self::handle_group_list_filter_offset,
        )?;
        self.route(
            &mut t,
            p::GROUP_LIST_FILTER,
            "handleGroupListFilterRoute",
            true,
            Self::handle_group_list_filter,
        )?;
        self.route(
            &mut t,
            p::GROUP_SELF,
            "handleGroupSelfRedirectRoute",
            true,
            Self::handle_group_self,
        )?;
        self.route(&mut t, p::GROUP, "handleGroupRoute", true, Self::handle_group)?;

        self.route(
            &mut t,
            p::PROJECT_OLD,
            "handleProjectsOldRoute",
            false,
            Self::handle_projects_old,
        )?;
        self.route(
            &mut t,
            p::REPO_COMMANDS,
            "handleRepoCommandsRoute",
            true,
            Self::handle_repo_commands,
        )?;
        self.route(
            &mut t,
            p::REPO_GENERAL,
            "handleRepoGeneralRoute",
            false,
            Self::handle_repo_general,
        )?;
        self.route(
            &mut t,
            p::REPO_ACCESS,
            "handleRepoAccessRoute",
            false,
            Self::handle_repo_access,
        )?;
        self.route(
            &mut t,
            p::REPO_DASHBOARDS,
            "handleRepoDashboardsRoute",
            false,
            Self::handle_repo_dashboards,
        )?;
        self.route(
            &mut t,
            p::BRANCH_LIST_OFFSET,
            "handleBranchListOffsetRoute",
            false,
            Self::handle_branch_list_offset,
        )?;
        self.route(
            &mut t,
            p::BRANCH_LIST_FILTER_OFFSET,
            "handleBranchListFilterOffsetRoute",
            false,
            Self::handle_branch_list_filter_offset,
        )?;
        self.route(
            &mut t,
            p::BRANCH_LIST_FILTER,
            "handleBranchListFilterRoute",
            false,
            Self::handle_branch_list_filter,
        )?;
        self.route(
            &mut t,
            p::TAG_LIST_OFFSET,
            "handleTagListOffsetRoute",
            false,
            Self::handle_tag_list_offset,
        )?;
        self.route(
            &mut t,
            p::TAG_LIST_FILTER_OFFSET,
            "handleTagListFilterOffsetRoute",
            false,
            Self::handle_tag_list_filter_offset,
        )?;
        self.route(
            &mut t,
            p::TAG_LIST_FILTER,
            "handleTagListFilterRoute",
            false,
            Self::handle_tag_list_filter,
        )?;

        self.route(
            &mut t,
            p::LEGACY_CREATE_GROUP,
            "handleCreateGroupRoute",
            true,
            Self::handle_create_group,
        )?;
        self.route(
            &mut t,
            p::LEGACY_CREATE_PROJECT,
            "handleCreateProjectRoute",
            true,
            Self::handle_create_project,
        )?;
        self.route(
            &mut t,
            p::REPO_LIST_OFFSET,
            "handleRepoListOffsetRoute",
            false,
            Self::handle_repo_list_offset,
        )?;
        self.route(
            &mut t,
            p::REPO_LIST_FILTER_OFFSET,
            "handleRepoListFilterOffsetRoute",
            false,
            Self::handle_repo_list_filter_offset,
        )?;
        self.route(
            &mut t,
            p::REPO_LIST_FILTER,
            "handleRepoListFilterRoute",
            false,
            Self::handle_repo_list_filter,
        )?;
        self.route(&mut t, p::REPO, "handleRepoRoute", false, Self::handle_repo)?;
        self.route(&mut t, p::PLUGINS, "handlePassThroughRoute", false, Self::handle_pass_through)?;

        self.route(
            &mut t,
            p::PLUGIN_LIST_OFFSET,
            "handlePluginListOffsetRoute",
            true,
            Self::handle_plugin_list_offset,
        )?;
        self.route(
            &mut t,
            p::PLUGIN_LIST_FILTER_OFFSET,
            "handlePluginListFilterOffsetRoute",
            true,
            Self::handle_plugin_list_filter_offset,
        )?;
        self.route(
            &mut t,
            p::PLUGIN_LIST_FILTER,
            "handlePluginListFilterRoute",
            true,
            Self::handle_plugin_list_filter,
        )?;
        self.route(
            &mut t,
            p::PLUGIN_LIST,
            "handlePluginListRoute",
            true,
            Self::handle_plugin_list,
        )?;

        self.route(
            &mut t,
            p::QUERY_LEGACY_SUFFIX,
            "handleQueryLegacySuffixRoute",
            false,
            Self::handle_query_legacy_suffix,
        )?;
        self.route(&mut t, p::QUERY, "handleQueryRoute", false, Self::handle_query)?;
        self.route(
            &mut t,
            p::CHANGE_ID_QUERY,
            "handleChangeIdQueryRoute",
            false,
            Self::handle_change_id_query,
        )?;
        self.route(
            &mut t,
            p::DIFF_LEGACY_LINENUM,
            "handleLegacyLinenum",
            false,
            Self::handle_legacy_linenum,
        )?;
        self.route(
            &mut t,
            p::CHANGE_NUMBER_LEGACY,
            "handleChangeNumberLegacyRoute",
            false,
            Self::handle_change_number_legacy,
        )?;

        self.route(&mut t, p::DIFF_EDIT, "handleDiffEditRoute", true, Self::handle_diff_edit)?;
        self.route(
            &mut t,
            p::CHANGE_EDIT,
            "handleChangeEditRoute",
            true,
            Self::handle_change_edit,
        )?;
        self.route(&mut t, p::COMMENT, "handleCommentRoute", false, Self::handle_comment)?;
        self.route(
            &mut t,
            p::COMMENTS_TAB,
            "handleCommentsRoute",
            false,
            Self::handle_comments_tab,
        )?;
        self.route(&mut t, p::DIFF, "handleDiffRoute", false, Self::handle_diff)?;
        self.route(&mut t, p::CHANGE, "handleChangeRoute", false, Self::handle_change)?;
        self.route_async(
            &mut t,
            p::CHANGE_LEGACY,
            "handleChangeLegacyRoute",
            false,
            Self::handle_change_legacy,
        )?;

        self.route(&mut t, p::AGREEMENTS, "handleAgreementsRoute", true, Self::handle_agreements)?;
        self.route(
            &mut t,
            p::NEW_AGREEMENTS,
            "handleNewAgreementsRoute",
            true,
            Self::handle_new_agreements,
        )?;
        self.route(
            &mut t,
            p::SETTINGS_LEGACY,
            "handleSettingsLegacyRoute",
            true,
            Self::handle_settings_legacy,
        )?;
        self.route(&mut t, p::SETTINGS, "handleSettingsRoute", true, Self::handle_settings)?;

        self.route(&mut t, p::REGISTER, "handleRegisterRoute", false, Self::handle_register)?;
        self.route(
            &mut t,
            p::LOG_IN_OR_OUT,
            "handlePassThroughRoute",
            false,
            Self::handle_pass_through,
        )?;
        self.route(
            &mut t,
            p::IMPROPERLY_ENCODED_PLUS,
            "handleImproperlyEncodedPlusRoute",
            false,
            Self::handle_improperly_encoded_plus,
        )?;
        self.route(
            &mut t,
            p::PLUGIN_SCREEN,
            "handlePluginScreen",
            false,
            Self::handle_plugin_screen,
        )?;
        self.route(
            &mut t,
            p::DOCUMENTATION_SEARCH_FILTER,
            "handleDocumentationSearchRoute",
            false,
            Self::handle_documentation_search,
        )?;
        self.route(
            &mut t,
            p::DOCUMENTATION_SEARCH,
            "handleDocumentationSearchRedirectRoute",
            false,
            Self::handle_documentation_search_redirect,
        )?;
        self.route(
            &mut t,
            p::DOCUMENTATION,
            "handleDocumentationRedirectRoute",
            false,
            Self::handle_documentation_redirect,
        )?;

        // Must stay last.
        self.route(&mut t, p::DEFAULT, "handleDefaultRoute", false, Self::handle_default)?;

        Ok(t)
    }
}

// ============================================================================
// Global middleware
// ============================================================================

struct ExitReporter {
    router: Weak<RouterInner>,
}

#[async_trait(?Send)]
impl Middleware for ExitReporter {
    async fn call(&self, _ctx: &NavigationContext) -> Flow {
        if let Some(inner) = self.router.upgrade() {
            if !inner.is_redirecting.get() {
                inner.services.reporting.before_location_changed();
            }
            inner.is_redirecting.set(false);
            inner.is_initial_load.set(false);
        }
        Flow::Next
    }

    fn name(&self) -> &str {
        "ExitReporter"
    }
}

struct BlockerCheck {
    router: Weak<RouterInner>,
}

#[async_trait(?Send)]
impl Middleware for BlockerCheck {
    async fn call(&self, ctx: &NavigationContext) -> Flow {
        let Some(inner) = self.router.upgrade() else {
            return Flow::Next;
        };
        let Some(reason) = inner.blocker.first_reason() else {
            return Flow::Next;
        };

        inner
            .services
            .notifier
            .notify(&format!("Waiting for {} to complete", reason));
        if inner
            .blocker
            .wait_until_released(inner.config.block_timeout_duration())
            .await
        {
            debug_log!("block released, continuing to '{}'", ctx.path);
            return Flow::Next;
        }

        let reason = inner.blocker.first_reason().unwrap_or(reason);
        let err = RouterError::NavigationBlocked { reason: reason.clone() };
        warn_log!("'{}': {}", ctx.path, err);
        inner.services.notifier.notify(&err.to_string());
        Flow::Refused(reason)
    }

    fn name(&self) -> &str {
        "BlockerCheck"
    }
}

struct StripTrackingParam {
    router: Weak<RouterInner>,
}

#[async_trait(?Send)]
impl Middleware for StripTrackingParam {
    async fn call(&self, ctx: &NavigationContext) -> Flow {
        let Some(inner) = self.router.upgrade() else {
            return Flow::Next;
        };
        let mut query = ctx.query_params();
        let Some(usp) = query.remove("usp") else {
            return Flow::Next;
        };
        inner.services.reporting.user_referred_from(&usp);

        let pathname = ctx
            .canonical_path
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let target = if query.is_empty() {
            pathname.to_string()
        } else {
            format!("{}?{}", pathname, query.to_query_string())
        };
        inner.redirect(&target);
        Flow::Handled
    }

    fn name(&self) -> &str {
        "StripTrackingParam"
    }
}

struct PageSetup {
    router: Weak<RouterInner>,
    plugin_screen: PathMatcher,
}

#[async_trait(?Send)]
impl Middleware for PageSetup {
    async fn call(&self, ctx: &NavigationContext) -> Flow {
        let Some(inner) = self.router.upgrade() else {
            return Flow::Next;
        };
        inner.platform.scroll_to_top();

        if self.plugin_screen.is_match(&ctx.hash) {
            inner.redirect(&ctx.hash);
            return Flow::Handled;
        }

        // Fires after the URL has been committed.
        let delay = inner.platform.sleep(inner.config.location_change_delay_duration());
        let weak = self.router.clone();
        inner.platform.spawn(
            async move {
                delay.await;
                if let Some(inner) = weak.upgrade() {
                    let location = inner.platform.location();
                    inner.platform.location_changed(LocationChange {
                        pathname: location.path().to_string(),
                        hash: location
                            .fragment()
                            .map(|f| format!("#{}", f))
                            .unwrap_or_default(),
                    });
                }
            }
            .boxed_local(),
        );
        Flow::Next
    }

    fn name(&self) -> &str {
        "PageSetup"
    }
}

// ============================================================================
// Handlers: root, dashboards
// ============================================================================

impl RouterInner {
    async fn handle_root(self: Rc<Self>, ctx: NavigationContext) {
        if ctx.querystring.starts_with("closeAfterLogin") {
            self.platform.close_window();
            return;
        }

        let mut hash = ctx.full_hash().to_string();
        if !hash.is_empty() {
            if !hash.starts_with('/') {
                hash.insert(0, '/');
            }
            // `+` decoded to a space breaks repo-based change URLs.
            if hash.contains("/ /") && ctx.canonical_path.contains("/+/") {
                hash = hash.replacen("/ /", "/+/", 1);
            }
            let target = if hash.starts_with("/VE/") {
                format!("{}/settings{}", self.base(), hash)
            } else {
                format!("{}{}", self.base(), hash)
            };
            self.redirect(&target);
            return;
        }

        let logged_in = self.services.auth.is_logged_in().await;
        if !self.is_current(&ctx) {
            return;
        }
        if logged_in {
            self.redirect("/dashboard/self");
        } else {
            self.redirect("/q/status:open+-is:wip");
        }
    }

    async fn handle_dashboard(self: Rc<Self>, ctx: NavigationContext) {
        let user = ctx.params.get(0).unwrap_or_default().to_string();
        let logged_in = self.services.auth.is_logged_in().await;
        if !self.is_current(&ctx) {
            return;
        }
        if logged_in {
            self.set_view(ViewState::Dashboard(DashboardViewState {
                user: Some(user),
                ..DashboardViewState::default()
            }));
        } else if user.eq_ignore_ascii_case("self") {
            self.redirect_to_login(&ctx.canonical_path);
        } else {
            self.redirect(&format!("/q/owner:{}", encode_component(&user)));
        }
    }

    fn handle_custom_dashboard(&self, ctx: &NavigationContext) {
        let query = ctx.query_params();
        let title = query
            .get_ignore_case("title")
            .unwrap_or(DEFAULT_DASHBOARD_TITLE)
            .to_string();
        let for_each = query.get_ignore_case("foreach");

        let sections: Vec<_> = query
            .iter()
            .filter(|(name, value)| {
                !name.is_empty()
                    && !value.is_empty()
                    && !name.eq_ignore_ascii_case("title")
                    && !name.eq_ignore_ascii_case("foreach")
            })
            .map(|(name, value)| DashboardSection {
                name: name.to_string(),
                query: match for_each {
                    Some(base) if !base.is_empty() => format!("{} {}", base, value),
                    _ => value.to_string(),
                },
            })
            .collect();

        if sections.is_empty() {
            self.redirect("/dashboard/self");
            return;
        }
        self.set_view(ViewState::Dashboard(DashboardViewState {
            user: Some("self".to_string()),
            sections,
            title: Some(title),
            ..DashboardViewState::default()
        }));
    }

    fn handle_project_dashboard(&self, ctx: &NavigationContext) {
        let repo = ctx.params.get(0).unwrap_or_default().to_string();
        let dashboard = decode_uri(ctx.params.get(1).unwrap_or_default());
        self.set_view(ViewState::Dashboard(DashboardViewState {
            repo: Some(repo.clone()),
            dashboard: Some(dashboard),
            ..DashboardViewState::default()
        }));
        self.services.reporting.set_repo_name(&repo);
    }

    fn handle_legacy_project_dashboard(&self, ctx: &NavigationContext) {
        self.redirect(&format!(
            "/p/{}/+/dashboard/{}",
            ctx.params.get(0).unwrap_or_default(),
            ctx.params.get(1).unwrap_or_default()
        ));
    }
}

// ============================================================================
// Handlers: groups
// ============================================================================

impl RouterInner {
    fn handle_group_info(&self, ctx: &NavigationContext) {
        let group = ctx.params.get(0).unwrap_or_default();
        self.redirect(&format!("/admin/groups/{}", encode_component(group)));
    }

    fn handle_group_self(&self, _ctx: &NavigationContext) {
        self.redirect("/settings/#Groups");
    }

    fn set_group(&self, ctx: &NavigationContext, detail: Option<GroupDetailView>) {
        self.set_view(ViewState::Group(GroupViewState {
            group_id: ctx.params.get(0).unwrap_or_default().to_string(),
            detail,
        }));
    }

    fn handle_group(&self, ctx: &NavigationContext) {
        self.set_group(ctx, None);
    }

    fn handle_group_audit_log(&self, ctx: &NavigationContext) {
        self.set_group(ctx, Some(GroupDetailView::Log));
    }

    fn handle_group_members(&self, ctx: &NavigationContext) {
        self.set_group(ctx, Some(GroupDetailView::Members));
    }

    fn handle_group_list_offset(&self, ctx: &NavigationContext) {
        self.set_list_offset(ctx, AdminSection::Groups, true);
    }

    fn handle_group_list_filter_offset(&self, ctx: &NavigationContext) {
        self.set_list_filter_offset(ctx, AdminSection::Groups);
    }

    fn handle_group_list_filter(&self, ctx: &NavigationContext) {
        self.set_list_filter(ctx, AdminSection::Groups);
    }

    fn handle_create_group(&self, _ctx: &NavigationContext) {
        self.redirect("/admin/groups#create");
    }
}

// ============================================================================
// Handlers: admin lists
// ============================================================================

impl RouterInner {
    /// `/admin/<list>[,<offset>]`, params `[_, offset]`.
    fn set_list_offset(&self, ctx: &NavigationContext, section: AdminSection, create_modal: bool) {
        self.set_view(ViewState::Admin(AdminViewState {
            section: Some(section),
            offset: ctx.params.get_as(1),
            filter: None,
            open_create_modal: create_modal && ctx.hash == "create",
        }));
    }

    /// `/admin/<list>/q/filter:<filter>,<offset>`, params `[filter, offset]`.
    fn set_list_filter_offset(&self, ctx: &NavigationContext, section: AdminSection) {
        self.set_view(ViewState::Admin(AdminViewState {
            section: Some(section),
            offset: ctx.params.get_as(1),
            filter: ctx.params.get(0).map(str::to_string),
            open_create_modal: false,
        }));
    }

    /// `/admin/<list>/q/filter:<filter>`, params `[filter]`.
    fn set_list_filter(&self, ctx: &NavigationContext, section: AdminSection) {
        self.set_view(ViewState::Admin(AdminViewState {
            section: Some(section),
            filter: ctx.params.non_empty(0).map(str::to_string),
            ..AdminViewState::default()
        }));
    }

    fn handle_repo_list_offset(&self, ctx: &NavigationContext) {
        self.set_list_offset(ctx, AdminSection::Repos, true);
    }

    fn handle_repo_list_filter_offset(&self, ctx: &NavigationContext) {
        self.set_list_filter_offset(ctx, AdminSection::Repos);
    }

    fn handle_repo_list_filter(&self, ctx: &NavigationContext) {
        self.set_list_filter(ctx, AdminSection::Repos);
    }

    fn handle_plugin_list_offset(&self, ctx: &NavigationContext) {
        self.set_list_offset(ctx, AdminSection::Plugins, false);
    }

    fn handle_plugin_list_filter_offset(&self, ctx: &NavigationContext) {
        self.set_list_filter_offset(ctx, AdminSection::Plugins);
    }

    fn handle_plugin_list_filter(&self, ctx: &NavigationContext) {
        self.set_list_filter(ctx, AdminSection::Plugins);
    }

    fn handle_plugin_list(&self, _ctx: &NavigationContext) {
        self.set_view(ViewState::Admin(AdminViewState::list(AdminSection::Plugins)));
    }

    fn handle_create_project(&self, _ctx: &NavigationContext) {
        self.redirect("/admin/repos#create");
    }
}

// ============================================================================
// Handlers: repos
// ============================================================================

impl RouterInner {
    fn handle_projects_old(&self, ctx: &NavigationContext) {
        let rest = match ctx.params.non_empty(1) {
            Some(rest) if rest.contains(',') => encode_component(rest).replacen("%2C", ",", 1),
            Some(rest) => encode_component(rest),
            None => String::new(),
        };
        self.redirect(&format!("/admin/repos/{}", rest));
    }

    fn set_repo_detail(&self, ctx: &NavigationContext, detail: RepoDetailView) {
        let repo = ctx.params.get(0).unwrap_or_default().to_string();
        self.set_view(ViewState::Repo(RepoViewState::new(repo.clone(), detail)));
        self.services.reporting.set_repo_name(&repo);
    }

    fn handle_repo_commands(&self, ctx: &NavigationContext) {
        self.set_repo_detail(ctx, RepoDetailView::Commands);
    }

    fn handle_repo_general(&self, ctx: &NavigationContext) {
        self.set_repo_detail(ctx, RepoDetailView::General);
    }

    fn handle_repo_access(&self, ctx: &NavigationContext) {
        self.set_repo_detail(ctx, RepoDetailView::Access);
    }

    fn handle_repo_dashboards(&self, ctx: &NavigationContext) {
        self.set_repo_detail(ctx, RepoDetailView::Dashboards);
    }

    /// Branch or tag list. `offset_index` and `filter_index` locate the
    /// groups in the matched pattern.
    fn set_ref_list(
        &self,
        ctx: &NavigationContext,
        detail: RepoDetailView,
        filter_index: Option<usize>,
        offset_index: Option<usize>,
    ) {
        self.set_view(ViewState::Repo(RepoViewState {
            repo: ctx.params.get(0).unwrap_or_default().to_string(),
            detail: Some(detail),
            offset: offset_index.and_then(|i| ctx.params.get_as(i)),
            filter: filter_index.and_then(|i| ctx.params.non_empty(i)).map(str::to_string),
        }));
    }

    fn handle_branch_list_offset(&self, ctx: &NavigationContext) {
        self.set_ref_list(ctx, RepoDetailView::Branches, None, Some(2));
    }

    fn handle_branch_list_filter_offset(&self, ctx: &NavigationContext) {
        self.set_ref_list(ctx, RepoDetailView::Branches, Some(1), Some(2));
    }

    fn handle_branch_list_filter(&self, ctx: &NavigationContext) {
        self.set_ref_list(ctx, RepoDetailView::Branches, Some(1), None);
    }

    fn handle_tag_list_offset(&self, ctx: &NavigationContext) {
        self.set_ref_list(ctx, RepoDetailView::Tags, None, Some(2));
    }

    fn handle_tag_list_filter_offset(&self, ctx: &NavigationContext) {
        self.set_ref_list(ctx, RepoDetailView::Tags, Some(1), Some(2));
    }

    fn handle_tag_list_filter(&self, ctx: &NavigationContext) {
        self.set_ref_list(ctx, RepoDetailView::Tags, Some(1), None);
    }

    fn handle_repo(&self, ctx: &NavigationContext) {
        self.redirect(&format!("{},general", ctx.path_without_query()));
    }
}

// ============================================================================
// Handlers: search
// ============================================================================

impl RouterInner {
    fn handle_query_legacy_suffix(&self, ctx: &NavigationContext) {
        let path = ctx.path.strip_suffix(",n,z").unwrap_or(&ctx.path);
        self.redirect(path);
    }

    fn handle_query(&self, ctx: &NavigationContext) {
        self.set_view(ViewState::Search(SearchViewState {
            query: ctx.params.get(0).unwrap_or_default().to_string(),
            offset: ctx.params.get_as(2),
        }));
    }

    fn handle_change_id_query(&self, ctx: &NavigationContext) {
        self.set_view(ViewState::Search(SearchViewState {
            query: ctx.params.get(0).unwrap_or_default().to_string(),
            offset: None,
        }));
    }

    fn handle_change_number_legacy(&self, ctx: &NavigationContext) {
        let change_num = ctx.params.get(0).unwrap_or_default();
        self.redirect(&format!("/c/{}", encode_component(change_num)));
    }
}

// ============================================================================
// Handlers: changes and diffs
// ============================================================================

impl RouterInner {
    /// Repo and change number, params `[repo, changeNum, ...]`.
    fn change_base(&self, ctx: &NavigationContext) -> ChangeViewState {
        ChangeViewState::overview(
            ctx.params.get(0).unwrap_or_default(),
            ctx.params.get_as(1).unwrap_or_default(),
        )
    }

    fn report_change(&self, change: &ChangeViewState) {
        self.services.reporting.set_repo_name(&change.repo);
        self.services.reporting.set_change_id(change.change_num);
    }

    /// Drop `forceReload` from the address bar. Returns whether it was set.
    fn take_force_reload(&self, query: &QueryParams) -> bool {
        if !query.contains("forceReload") {
            return false;
        }
        let mut location = self.platform.location();
        let mut remaining = QueryParams::from_query_string(location.query().unwrap_or_default());
        remaining.remove("forceReload");
        if remaining.is_empty() {
            location.set_query(None);
        } else {
            location.set_query(Some(&remaining.to_query_string()));
        }
        self.history.replace_url(&path_of(&location));
        true
    }

    /// Redirect when the patch range is not canonical, else publish.
    fn redirect_or_navigate(&self, mut change: ChangeViewState) {
        if normalize_patch_range(&mut change.base_patch_num, &mut change.patch_num) {
            let url = generate_url(&ViewState::Change(change), self.base());
            self.redirect(&url);
        } else {
            self.set_view(ViewState::Change(change));
        }
    }

    fn handle_change(&self, ctx: &NavigationContext) {
        let query = ctx.query_params();
        let mut change = self.change_base(ctx);
        change.base_patch_num = PatchSetNum::parse_opt(ctx.params.get(4));
        change.patch_num = PatchSetNum::parse_opt(ctx.params.get(6));
        change.force_reload = self.take_force_reload(&query);
        change.tab = query.get("tab").filter(|v| !v.is_empty()).map(str::to_string);
        change.filter = query.get("filter").filter(|v| !v.is_empty()).map(str::to_string);
        change.select = query.get("select").filter(|v| !v.is_empty()).map(str::to_string);
        change.attempt = query.get_as::<u32>("attempt").filter(|a| *a > 0);

        self.report_change(&change);
        self.redirect_or_navigate(change);
    }

    fn handle_comment(&self, ctx: &NavigationContext) {
        let mut change = self.change_base(ctx);
        change.child_view = ChangeChildView::Diff;
        change.comment_id = ctx.params.get(2).map(str::to_string);
        change.comment_link = true;

        self.report_change(&change);
        self.redirect_or_navigate(change);
    }

    fn handle_comments_tab(&self, ctx: &NavigationContext) {
        let mut change = self.change_base(ctx);
        change.comment_id = ctx.params.non_empty(2).map(str::to_string);

        self.report_change(&change);
        self.redirect_or_navigate(change);
    }

    fn handle_diff(&self, ctx: &NavigationContext) {
        let mut change = self.change_base(ctx);
        change.child_view = ChangeChildView::Diff;
        change.base_patch_num = PatchSetNum::parse_opt(ctx.params.get(4));
        change.patch_num = PatchSetNum::parse_opt(ctx.params.get(6));
        change.diff_path = ctx.params.get(8).map(str::to_string);
        change.line = LineAddress::parse(&ctx.hash);

        self.report_change(&change);
        self.redirect_or_navigate(change);
    }

    fn handle_diff_edit(&self, ctx: &NavigationContext) {
        let mut change = self.change_base(ctx);
        change.child_view = ChangeChildView::Edit;
        change.patch_num = PatchSetNum::parse_opt(ctx.params.get(2));
        change.diff_path = ctx.params.get(3).map(str::to_string);
        change.line = LineAddress::parse(&ctx.hash);

        self.report_change(&change);
        self.redirect_or_navigate(change);
    }

    fn handle_change_edit(&self, ctx: &NavigationContext) {
        let query = ctx.query_params();
        let mut change = self.change_base(ctx);
        change.patch_num = PatchSetNum::parse_opt(ctx.params.get(3));
        change.edit = true;
        change.tab = query.get("tab").map(str::to_string);
        change.force_reload = self.take_force_reload(&query);

        self.report_change(&change);
        self.redirect_or_navigate(change);
    }

    async fn handle_change_legacy(self: Rc<Self>, ctx: NavigationContext) {
        let change_num: u32 = ctx.params.get_as(0).unwrap_or_default();
        if change_num == 0 {
            self.show_not_found();
            return;
        }
        let repo = self.services.lookup.resolve_repo_for_change(change_num).await;
        if !self.is_current(&ctx) {
            debug_log!("dropping stale lookup of change {}", change_num);
            return;
        }
        // Redirecting without a repo would loop through this route forever.
        match repo {
            Some(repo) => {
                let tail = ctx.params.get(1).unwrap_or_default();
                self.redirect(&format!("/c/{}/+/{}/{}", repo, change_num, tail));
            }
            None => self.show_not_found(),
        }
    }

    fn handle_legacy_linenum(&self, ctx: &NavigationContext) {
        match ctx.path.rsplit_once('@') {
            Some((head, line)) if LineAddress::parse(line).is_some() => {
                self.redirect(&format!("{}#{}", head, line));
            }
            _ => self.show_not_found(),
        }
    }

    fn handle_improperly_encoded_plus(&self, ctx: &NavigationContext) {
        let hash = match ctx.full_hash() {
            "" => String::new(),
            hash => format!("#{}", hash),
        };
        self.redirect(&format!(
            "/c/{}/+/{}{}",
            ctx.params.get(0).unwrap_or_default(),
            ctx.params.get(1).unwrap_or_default(),
            hash
        ));
    }
}

// ============================================================================
// Handlers: settings, account, plugins, documentation
// ============================================================================

impl RouterInner {
    fn handle_agreements(&self, _ctx: &NavigationContext) {
        self.redirect("/settings/#Agreements");
    }

    fn handle_new_agreements(&self, _ctx: &NavigationContext) {
        self.set_view(ViewState::Agreement);
    }

    fn handle_settings_legacy(&self, ctx: &NavigationContext) {
        // Tokens may contain '+', which parameter decoding turned into ' '.
        let token = ctx.params.get(0).unwrap_or_default().replace(' ', "+");
        self.set_view(ViewState::Settings(SettingsViewState {
            email_token: Some(token),
        }));
    }

    fn handle_settings(&self, _ctx: &NavigationContext) {
        self.set_view(ViewState::Settings(SettingsViewState::default()));
    }

    fn handle_register(&self, ctx: &NavigationContext) {
        self.just_registered.set(true);
        let mut path = ctx.params.non_empty(0).unwrap_or("/");
        if path.starts_with("/register") {
            path = "/";
        }
        if !path.starts_with('/') {
            return;
        }
        self.redirect(&format!("{}{}", self.base(), path));
    }

    fn handle_pass_through(&self, _ctx: &NavigationContext) {
        self.reload();
    }

    fn handle_plugin_screen(&self, ctx: &NavigationContext) {
        self.set_view(ViewState::Plugin(PluginViewState {
            plugin: ctx.params.get(0).unwrap_or_default().to_string(),
            screen: ctx.params.get(1).unwrap_or_default().to_string(),
        }));
    }

    fn handle_documentation_search(&self, ctx: &NavigationContext) {
        self.set_view(ViewState::Documentation(DocumentationViewState {
            filter: ctx.params.non_empty(0).map(str::to_string),
        }));
    }

    fn handle_documentation_search_redirect(&self, ctx: &NavigationContext) {
        let filter = ctx.params.get(0).unwrap_or_default();
        self.redirect(&format!("/Documentation/q/filter:{}", encode_component(filter)));
    }

    fn handle_documentation_redirect(&self, ctx: &NavigationContext) {
        if ctx.params.non_empty(1).is_some() {
            self.reload();
        } else {
            self.redirect("/Documentation/index.html");
        }
    }

    fn handle_default(&self, ctx: &NavigationContext) {
        if self.is_initial_load.get() {
            debug_log!("'{}' is not a known page", ctx.path);
            self.show_not_found();
        } else {
            self.reload();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, TestPlatform};
    use tokio::task::LocalSet;

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    fn router(start: &str) -> (Rc<TestPlatform>, Router) {
        let platform = TestPlatform::new(start);
        let router = Router::new(RouterConfig::new(), platform.clone(), Services::new());
        (platform, router)
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_dispatches_current_location() {
        LocalSet::new()
            .run_until(async {
                let (platform, router) = router("/admin/repos");
                router.start().unwrap();
                settle().await;

                assert_eq!(
                    router.models().app.get_state(),
                    Some(ViewState::Admin(AdminViewState::list(AdminSection::Repos)))
                );
                assert_eq!(platform.calls()[0], Call::Replace("/admin/repos".to_string()));
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_before_start_is_ignored() {
        LocalSet::new()
            .run_until(async {
                let (platform, router) = router("/");
                router.show("/settings");
                settle().await;
                assert!(platform.calls().is_empty());
                assert_eq!(router.resolve("/settings"), Err(RouterError::NotStarted));
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_names_route() {
        LocalSet::new()
            .run_until(async {
                let (_platform, router) = router("/");
                router.start().unwrap();
                assert_eq!(router.resolve("/c/r/+/1").as_deref(), Ok("handleChangeRoute"));
                assert_eq!(router.resolve("/admin/repos/r").as_deref(), Ok("handleRepoRoute"));
                assert_eq!(router.resolve("/unknown").as_deref(), Ok("handleDefaultRoute"));
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_usp_removed_with_redirect() {
        LocalSet::new()
            .run_until(async {
                let (platform, router) = router("/");
                router.start().unwrap();
                settle().await;

                router.show("/q/is:open?usp=email&x=1");
                settle().await;
                assert_eq!(platform.current_url(), "/q/is:open?x=1");
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_plugin_hash_redirect() {
        LocalSet::new()
            .run_until(async {
                let (platform, router) = router("/");
                router.start().unwrap();
                settle().await;

                router.show("/settings#/x/checks/overview");
                settle().await;
                assert_eq!(platform.current_url(), "/x/checks/overview");
                assert_eq!(
                    router.models().app.get_state(),
                    Some(ViewState::Plugin(PluginViewState {
                        plugin: "checks".to_string(),
                        screen: "overview".to_string(),
                    }))
                );
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_location_change_fires_after_delay() {
        LocalSet::new()
            .run_until(async {
                let (platform, router) = router("/q/is:open#frag");
                router.start().unwrap();
                settle().await;
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;

                assert!(platform.calls().contains(&Call::LocationChanged(LocationChange {
                    pathname: "/q/is:open".to_string(),
                    hash: "#frag".to_string(),
                })));
            })
            .await;
    }
}
