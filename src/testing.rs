//! Scripted platform for unit tests.

use crate::history::{HistoryEntry, MemoryHistory};
use crate::platform::{LocationChange, Platform};
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
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

pub struct TestPlatform {
    origin: Url,
    history: RefCell<MemoryHistory>,
    calls: RefCell<Vec<Call>>,
}

impl TestPlatform {
    pub fn new(start: &str) -> Rc<Self> {
        Rc::new(Self {
            origin: Url::parse("https://review.example.com/").expect("valid origin"),
            history: RefCell::new(MemoryHistory::new(start)),
            calls: RefCell::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn current_url(&self) -> String {
        self.history.borrow().current_url().to_string()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl Platform for TestPlatform {
    fn location(&self) -> Url {
        let history = self.history.borrow();
        self.origin
            .join(history.current_url())
            .expect("history urls are relative to the origin")
    }

    fn push_state(&self, entry: &HistoryEntry, url: &str) {
        self.history.borrow_mut().push(entry.clone(), url);
        self.record(Call::Push(url.to_string()));
    }

    fn replace_state(&self, entry: &HistoryEntry, url: &str) {
        self.history.borrow_mut().replace(entry.clone(), url);
        self.record(Call::Replace(url.to_string()));
    }

    fn history_back(&self) {
        self.history.borrow_mut().back();
        self.record(Call::Back);
    }

    fn reload(&self) {
        self.record(Call::Reload);
    }

    fn assign(&self, url: &str) {
        self.record(Call::Assign(url.to_string()));
    }

    fn set_unload_warning(&self, warning: Option<String>) {
        self.record(Call::UnloadWarning(warning));
    }

    fn scroll_to_top(&self) {
        self.record(Call::ScrollToTop);
    }

    fn location_changed(&self, change: LocationChange) {
        self.record(Call::LocationChanged(change));
    }

    fn close_window(&self) {
        self.record(Call::CloseWindow);
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        tokio::task::spawn_local(task);
    }

    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        tokio::time::sleep(duration).boxed_local()
    }
}
