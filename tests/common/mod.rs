//! Test utilities for router integration tests
//!
//! Provides a scripted browser, recording collaborators and a harness that
//! wires them into a started [`Router`].

#![allow(dead_code)]

use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use review_router::*;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;
use ::url::Url;

/// Route `log` output through the test harness. Safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Let spawned tasks run until the event loop is idle.
pub async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

// ============================================================================
// FakePlatform
// ============================================================================

/// Browser side effects, in the order the router caused them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Push(String),
    Replace(String),
    Back,
    Reload,
    Assign(String),
    UnloadWarning(Option<String>),
    ScrollToTop,
    LocationChanged(LocationChange),
    CloseWindow,
}

/// In-memory browser backed by [`MemoryHistory`].
pub struct FakePlatform {
    origin: Url,
    history: RefCell<MemoryHistory>,
    effects: RefCell<Vec<Effect>>,
}

impl FakePlatform {
    pub fn new(start: &str) -> Rc<Self> {
        Rc::new(Self {
            origin: Url::parse("https://review.example.com/").unwrap(),
            history: RefCell::new(MemoryHistory::new(start)),
            effects: RefCell::new(Vec::new()),
        })
    }

    pub fn effects(&self) -> Vec<Effect> {
        self.effects.borrow().clone()
    }

    pub fn clear_effects(&self) {
        self.effects.borrow_mut().clear();
    }

    pub fn current_url(&self) -> String {
        self.history.borrow().current_url().to_string()
    }

    pub fn history_len(&self) -> usize {
        self.history.borrow().len()
    }

    /// Count of effects matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&Effect) -> bool) -> usize {
        self.effects.borrow().iter().filter(|e| predicate(e)).count()
    }

    fn record(&self, effect: Effect) {
        self.effects.borrow_mut().push(effect);
    }
}

impl Platform for FakePlatform {
    fn location(&self) -> Url {
        self.origin.join(self.history.borrow().current_url()).unwrap()
    }

    fn push_state(&self, entry: &HistoryEntry, url: &str) {
        self.history.borrow_mut().push(entry.clone(), url);
        self.record(Effect::Push(url.to_string()));
    }

    fn replace_state(&self, entry: &HistoryEntry, url: &str) {
        self.history.borrow_mut().replace(entry.clone(), url);
        self.record(Effect::Replace(url.to_string()));
    }

    fn history_back(&self) {
        self.history.borrow_mut().back();
        self.record(Effect::Back);
    }

    fn reload(&self) {
        self.record(Effect::Reload);
    }

    fn assign(&self, url: &str) {
        self.record(Effect::Assign(url.to_string()));
    }

    fn set_unload_warning(&self, warning: Option<String>) {
        self.record(Effect::UnloadWarning(warning));
    }

    fn scroll_to_top(&self) {
        self.record(Effect::ScrollToTop);
    }

    fn location_changed(&self, change: LocationChange) {
        self.record(Effect::LocationChanged(change));
    }

    fn close_window(&self) {
        self.record(Effect::CloseWindow);
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        tokio::task::spawn_local(task);
    }

    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        tokio::time::sleep(duration).boxed_local()
    }
}

// ============================================================================
// Collaborators
// ============================================================================

/// Switchable sign-in state, answered after `delay`.
#[derive(Default)]
pub struct FakeAuth {
    pub logged_in: Cell<bool>,
    pub delay: Cell<Duration>,
}

#[async_trait(?Send)]
impl AuthService for FakeAuth {
    async fn is_logged_in(&self) -> bool {
        let delay = self.delay.get();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.logged_in.get()
    }
}

/// Change number to repository table, answered after `delay`.
#[derive(Default)]
pub struct FakeLookup {
    pub repos: RefCell<HashMap<u32, String>>,
    pub delay: Cell<Duration>,
    pub calls: Cell<usize>,
}

impl FakeLookup {
    pub fn insert(&self, change_num: u32, repo: &str) {
        self.repos.borrow_mut().insert(change_num, repo.to_string());
    }
}

#[async_trait(?Send)]
impl ChangeLookup for FakeLookup {
    async fn resolve_repo_for_change(&self, change_num: u32) -> Option<String> {
        self.calls.set(self.calls.get() + 1);
        let delay = self.delay.get();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.repos.borrow().get(&change_num).cloned()
    }
}

/// Everything reported or shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Route(String),
    BeforeLocationChange,
    RepoName(String),
    ChangeId(u32),
    Referred(String),
    Notice(String),
    NotFound,
}

#[derive(Default)]
pub struct Recorder {
    pub events: RefCell<Vec<Event>>,
    pub plugin_links: RefCell<Vec<MenuLink>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn routes(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Route(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn has(&self, event: &Event) -> bool {
        self.events.borrow().contains(event)
    }

    fn push(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }
}

impl Reporting for Recorder {
    fn location_changed(&self, route: &str) {
        self.push(Event::Route(route.to_string()));
    }

    fn before_location_changed(&self) {
        self.push(Event::BeforeLocationChange);
    }

    fn set_repo_name(&self, repo: &str) {
        self.push(Event::RepoName(repo.to_string()));
    }

    fn set_change_id(&self, change_num: u32) {
        self.push(Event::ChangeId(change_num));
    }

    fn user_referred_from(&self, source: &str) {
        self.push(Event::Referred(source.to_string()));
    }
}

impl Notifier for Recorder {
    fn notify(&self, message: &str) {
        self.push(Event::Notice(message.to_string()));
    }

    fn show_not_found(&self) {
        self.push(Event::NotFound);
    }
}

impl PluginHost for Recorder {
    fn admin_menu_links(&self) -> Vec<MenuLink> {
        self.plugin_links.borrow().clone()
    }
}

// ============================================================================
// Harness
// ============================================================================

/// A router wired to fakes. Not started.
pub struct Harness {
    pub platform: Rc<FakePlatform>,
    pub auth: Rc<FakeAuth>,
    pub lookup: Rc<FakeLookup>,
    pub recorder: Rc<Recorder>,
    pub router: Router,
}

impl Harness {
    pub fn new(start: &str) -> Self {
        Self::with_config(start, RouterConfig::new())
    }

    pub fn with_config(start: &str, config: RouterConfig) -> Self {
        init_logging();
        let platform = FakePlatform::new(start);
        let auth = Rc::new(FakeAuth::default());
        let lookup = Rc::new(FakeLookup::default());
        let recorder = Rc::new(Recorder::default());
        let services = Services::new()
            .auth(auth.clone())
            .lookup(lookup.clone())
            .reporting(recorder.clone())
            .notifier(recorder.clone())
            .plugins(recorder.clone());
        let router = Router::new(config, platform.clone(), services);
        Self {
            platform,
            auth,
            lookup,
            recorder,
            router,
        }
    }

    pub fn signed_in(self) -> Self {
        self.auth.logged_in.set(true);
        self
    }

    /// Start the router and let the initial dispatch finish.
    pub async fn start(&self) {
        self.router.start().unwrap();
        settle().await;
    }

    /// `show(path)` and let every resulting dispatch finish.
    pub async fn show(&self, path: &str) {
        self.router.show(path);
        settle().await;
    }

    pub fn view(&self) -> Option<ViewState> {
        self.router.models().app.get_state()
    }

    pub fn change(&self) -> Option<ChangeViewState> {
        self.router.models().change.get_state()
    }
}

/// Run `test` on a fresh local task set.
pub async fn local<F: std::future::Future<Output = ()>>(test: F) {
    tokio::task::LocalSet::new().run_until(test).await;
}
