//! Tests for the lower-level routing API: route tables, the dispatcher and
//! custom middleware, driven without a router or platform.

use futures::FutureExt;
use review_router::patterns;
use review_router::route::RouteTable;
use review_router::services::{Anonymous, Silent};
use review_router::*;
use std::cell::RefCell;
use std::rc::Rc;

type Log = Rc<RefCell<Vec<String>>>;

fn log_handler(
    log: &Log,
    tag: &'static str,
) -> impl Fn(NavigationContext) -> futures::future::LocalBoxFuture<'static, ()> {
    let log = log.clone();
    move |ctx: NavigationContext| {
        let log = log.clone();
        async move {
            let params: Vec<_> = ctx.params.iter().map(|(_, v)| v.to_string()).collect();
            log.borrow_mut().push(format!("{}({})", tag, params.join("|")));
        }
        .boxed_local()
    }
}

fn dispatch(dispatcher: &Dispatcher, path: &str) -> DispatchOutcome {
    let ctx = NavigationContext::new(path, None, "");
    dispatcher.set_current_path(&ctx.path);
    pollster::block_on(dispatcher.dispatch(ctx))
}

fn install(table: &RouteTable, dispatcher: &Dispatcher) {
    table.install(
        dispatcher,
        Rc::new(Anonymous),
        Rc::new(Silent),
        Rc::new(|_: &NavigationContext| {}),
    );
}

fn table(log: &Log) -> RouteTable {
    let mut table = RouteTable::new();
    table
        .register(patterns::CHANGE_EDIT, "edit", false, log_handler(log, "edit"))
        .unwrap();
    table
        .register(patterns::DIFF, "diff", false, log_handler(log, "diff"))
        .unwrap();
    table
        .register(patterns::CHANGE, "change", false, log_handler(log, "change"))
        .unwrap();
    table
        .register(patterns::DEFAULT, "default", false, log_handler(log, "default"))
        .unwrap();
    table
}

#[test]
fn test_specific_pattern_registered_first_wins() {
    let log = Log::default();
    let dispatcher = Dispatcher::new();
    install(&table(&log), &dispatcher);

    assert!(dispatch(&dispatcher, "/c/repo/+/1/2,edit").is_handled());
    assert!(dispatch(&dispatcher, "/c/repo/+/1/2/README.md").is_handled());
    assert!(dispatch(&dispatcher, "/c/repo/+/1").is_handled());
    assert!(dispatch(&dispatcher, "/elsewhere").is_handled());

    let log = log.borrow();
    assert!(log[0].starts_with("edit("));
    assert!(log[1].starts_with("diff("));
    assert!(log[1].ends_with("|README.md"));
    assert!(log[2].starts_with("change(repo|1"));
    assert_eq!(log[3], "default()");
}

#[test]
fn test_resolve_reports_route_and_params() {
    let log = Log::default();
    let table = table(&log);

    let (entry, params) = table.resolve("/c/my%2Frepo/+/9").unwrap();
    assert_eq!(entry.name(), "change");
    assert_eq!(params.get(0), Some("my/repo"));
    assert_eq!(params.get_as::<u32>(1), Some(9));
    assert_eq!(table.len(), 4);
}

#[test]
fn test_global_middleware_runs_before_routes() {
    let log = Log::default();
    let dispatcher = Dispatcher::new();

    let seen = log.clone();
    dispatcher.add_enter(
        None,
        Rc::new(middleware_fn(move |ctx: NavigationContext| {
            let seen = seen.clone();
            async move {
                seen.borrow_mut().push(format!("global {}", ctx.path));
                Flow::Next
            }
        })),
    );
    install(&table(&log), &dispatcher);

    dispatch(&dispatcher, "/c/r/+/3");
    assert_eq!(*log.borrow(), vec!["global /c/r/+/3", "change(r|3)"]);
}

#[test]
fn test_refusing_middleware_blocks_routes() {
    let log = Log::default();
    let dispatcher = Dispatcher::new();
    dispatcher.add_enter(
        None,
        Rc::new(middleware_fn(|_ctx: NavigationContext| async {
            Flow::Refused("saving".to_string())
        })),
    );
    install(&table(&log), &dispatcher);

    let outcome = dispatch(&dispatcher, "/c/r/+/3");
    assert_eq!(outcome.block_reason(), Some("saving"));
    assert!(log.borrow().is_empty());
}
