//! View-state models and address-bar reconciliation.
//!
//! Each section of the UI reads its state from a [`StateModel`]: a single
//! observable slot. The router writes the models after every successful
//! match, through [`ViewModels::apply`], in a fixed order:
//!
//! 1. the lightweight [`RouterState`] naming the active view,
//! 2. the domain model of that view,
//! 3. the app-wide [`ViewState`] model.
//!
//! Subscribers of a domain model can therefore always look up which view is
//! active. Leaving the change view resets the change model to `None`.
//! Plugin, documentation and agreement views have no domain model; read
//! them from `app`.
//!
//! The change model is also written by the change page itself (switching
//! patch sets, opening a diff). [`change_url_rewrite`] computes the address
//! bar correction for such writes; the router subscribes it with
//! `replace_state` so the URL follows the model without a new dispatch.

use crate::context::strip_base;
use crate::matching::strip_query;
use crate::params::QueryParams;
use crate::url::generate_url;
use crate::view_state::{
    AdminViewState, ChangeViewState, DashboardViewState, GroupViewState, PatchSetNum,
    RepoViewState, SearchViewState, SettingsViewState, View, ViewState,
};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use url::Url;

/// Query parameters the change page keeps when its URL is rewritten.
pub const CHANGE_QUERY_ALLOW_LIST: &[&str] = &[
    "tab",
    "filter",
    "select",
    "attempt",
    "checksPatchset",
    "checksResultsFilter",
    "checksRunsSelected",
];

// ============================================================================
// StateModel
// ============================================================================

type Listener<T> = Rc<dyn Fn(Option<&T>)>;

struct ModelInner<T> {
    state: RefCell<Option<T>>,
    listeners: RefCell<Vec<(usize, Listener<T>)>>,
    next_id: Cell<usize>,
}

/// An observable slot holding an optional `T`.
///
/// Clones share the same slot. Listeners are only called when the stored
/// value actually changes.
pub struct StateModel<T> {
    inner: Rc<ModelInner<T>>,
}

impl<T> Clone for StateModel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + 'static> StateModel<T> {
    /// Create an empty model.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ModelInner {
                state: RefCell::new(None),
                listeners: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    /// A copy of the current value.
    pub fn get_state(&self) -> Option<T> {
        self.inner.state.borrow().clone()
    }

    /// Replace the value and notify listeners if it changed.
    ///
    /// Listeners may write to this or any other model; the borrow on the
    /// slot is released before they run.
    pub fn set_state(&self, state: Option<T>) {
        if *self.inner.state.borrow() == state {
            return;
        }
        self.inner.state.replace(state.clone());
        let listeners: Vec<_> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener(state.as_ref());
        }
    }

    /// Modify the current value in place. A `None` slot is left alone.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        if let Some(mut state) = self.get_state() {
            f(&mut state);
            self.set_state(Some(state));
        }
    }

    /// Call `listener` on every change until the returned
    /// [`Subscription`] is dropped.
    pub fn subscribe(&self, listener: impl Fn(Option<&T>) + 'static) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));

        let inner = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.listeners.borrow_mut().retain(|(i, _)| *i != id);
            }
        })
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }
}

impl<T: Clone + PartialEq + 'static> Default for StateModel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for StateModel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateModel")
            .field("state", &self.inner.state.borrow())
            .field("listeners", &self.inner.listeners.borrow().len())
            .finish()
    }
}

/// Keeps a listener registered. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Unsubscribe now.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

// ============================================================================
// RouterState
// ============================================================================

/// Which view is active, plus the change coordinates other models key on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterState {
    pub view: View,
    pub change_num: Option<u32>,
    pub patch_num: Option<PatchSetNum>,
}

impl RouterState {
    /// The router state for `view_state`.
    pub fn for_view(view_state: &ViewState) -> Self {
        let change = view_state.as_change();
        Self {
            view: view_state.view(),
            change_num: change.map(|c| c.change_num),
            patch_num: change.and_then(|c| c.patch_num),
        }
    }
}

// ============================================================================
// ViewModels
// ============================================================================

/// One model per view domain, plus the router and app-wide models.
#[derive(Debug, Clone, Default)]
pub struct ViewModels {
    pub router: StateModel<RouterState>,
    pub app: StateModel<ViewState>,
    pub admin: StateModel<AdminViewState>,
    pub repo: StateModel<RepoViewState>,
    pub group: StateModel<GroupViewState>,
    pub change: StateModel<ChangeViewState>,
    pub dashboard: StateModel<DashboardViewState>,
    pub settings: StateModel<SettingsViewState>,
    pub search: StateModel<SearchViewState>,
}

impl ViewModels {
    /// Create empty models.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `state` as the active view.
    pub fn apply(&self, state: &ViewState) {
        self.router.set_state(Some(RouterState::for_view(state)));

        if state.view() != View::Change {
            self.change.set_state(None);
        }
        match state {
            ViewState::Admin(s) => self.admin.set_state(Some(s.clone())),
            ViewState::Repo(s) => self.repo.set_state(Some(s.clone())),
            ViewState::Group(s) => self.group.set_state(Some(s.clone())),
            ViewState::Change(s) => self.change.set_state(Some(s.clone())),
            ViewState::Dashboard(s) => self.dashboard.set_state(Some(s.clone())),
            ViewState::Settings(s) => self.settings.set_state(Some(s.clone())),
            ViewState::Search(s) => self.search.set_state(Some(s.clone())),
            ViewState::Plugin(_) | ViewState::Documentation(_) | ViewState::Agreement => {}
        }

        self.app.set_state(Some(state.clone()));
    }

    /// The active view, if any navigation succeeded yet.
    pub fn active_view(&self) -> Option<View> {
        self.router.get_state().map(|s| s.view)
    }
}

// ============================================================================
// Change back-sync
// ============================================================================

/// The URL the address bar should show for `change`, or `None` when the
/// current location already routes to it.
///
/// Only the path is compared. The rewrite keeps the location's hash and the
/// allow-listed query parameters.
pub fn change_url_rewrite(change: &ChangeViewState, location: &Url, base: &str) -> Option<String> {
    let generated = generate_url(&ViewState::Change(change.clone()), base);
    let generated_path = strip_query(generated.split('#').next().unwrap_or_default());
    let current = strip_base(location.path(), base);
    if strip_base(generated_path, base) == current {
        return None;
    }

    let mut query = QueryParams::from_query_string(location.query().unwrap_or_default());
    query.retain_keys(CHANGE_QUERY_ALLOW_LIST);

    let mut url = generated_path.to_string();
    if !query.is_empty() {
        url.push('?');
        url.push_str(&query.to_query_string());
    }
    if let Some(fragment) = location.fragment().filter(|f| !f.is_empty()) {
        url.push('#');
        url.push_str(fragment);
    }
    Some(url)
}

// ============================================================================
// Tests
// ============================================================================
