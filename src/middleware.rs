//! Dispatch middleware.
//!
//! Every step of a navigation, from the blocker check to the route handler
//! itself, is a [`Middleware`]. The [`Dispatcher`](crate::dispatch::Dispatcher)
//! runs them in registration order; each one either passes the context on
//! ([`Flow::Next`]), claims it ([`Flow::Handled`]) or refuses the navigation
//! outright ([`Flow::Refused`]). The last two end the chain.
//!
//! Middleware is asynchronous and single-threaded: it may await the auth
//! probe, a timer or a network lookup, and its futures are `!Send`.
//!
//! # Creating middleware
//!
//! | Approach | When to use |
//! |----------|-------------|
//! | Implement [`Middleware`] | Named, holds its own state |
//! | [`middleware_fn`] | Quick one-off from a closure |
//!
//! # Example
//!
//! ```
//! use review_router::middleware::{middleware_fn, Flow, Middleware};
//! use review_router::NavigationContext;
//!
//! let mw = middleware_fn(|ctx: NavigationContext| async move {
//!     if ctx.path == "/settings" {
//!         Flow::Handled
//!     } else {
//!         Flow::Next
//!     }
//! });
//!
//! let ctx = NavigationContext::new("/settings", None, "");
//! assert_eq!(pollster::block_on(mw.call(&ctx)), Flow::Handled);
//! ```

use crate::context::NavigationContext;
use async_trait::async_trait;
use std::future::Future;

// ============================================================================
// Middleware trait
// ============================================================================

/// Result of running one middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    /// Continue with the next middleware in the chain.
    Next,
    /// The context was claimed; stop the chain.
    Handled,
    /// Stop the chain without claiming the context.
    Refused(String),
}

/// A step in the exit or enter pipeline.
#[async_trait(?Send)]
pub trait Middleware {
    /// Run against `ctx`. The context's `params` already hold whatever this
    /// middleware's matcher captured.
    async fn call(&self, ctx: &NavigationContext) -> Flow;

    /// Middleware name for debugging.
    fn name(&self) -> &str {
        "Middleware"
    }
}

// ============================================================================
// middleware_fn helper
// ============================================================================

/// Create middleware from a closure returning a future.
///
/// The closure receives its own copy of the context so the future it returns
/// can be `'static`.
pub const fn middleware_fn<F, Fut>(f: F) -> FnMiddleware<F>
where
    F: Fn(NavigationContext) -> Fut,
    Fut: Future<Output = Flow>,
{
    FnMiddleware { f }
}

/// Middleware created from a closure via [`middleware_fn`].
pub struct FnMiddleware<F> {
    f: F,
}

#[async_trait(?Send)]
impl<F, Fut> Middleware for FnMiddleware<F>
where
    F: Fn(NavigationContext) -> Fut,
    Fut: Future<Output = Flow>,
{
    async fn call(&self, ctx: &NavigationContext) -> Flow {
        (self.f)(ctx.clone()).await
    }

    fn name(&self) -> &str {
        "FnMiddleware"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recording {
        seen: Rc<RefCell<Vec<String>>>,
    }

    #[async_trait(?Send)]
    impl Middleware for Recording {
        async fn call(&self, ctx: &NavigationContext) -> Flow {
            self.seen.borrow_mut().push(ctx.path.clone());
            Flow::Next
        }

        fn name(&self) -> &str {
            "Recording"
        }
    }

    #[test]
    fn test_trait_impl() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mw = Recording { seen: seen.clone() };
        let ctx = NavigationContext::new("/q/is:open", None, "");

        assert_eq!(pollster::block_on(mw.call(&ctx)), Flow::Next);
        assert_eq!(*seen.borrow(), vec!["/q/is:open".to_string()]);
        assert_eq!(mw.name(), "Recording");
    }

    #[test]
    fn test_middleware_fn_sees_params() {
        let mw = middleware_fn(|ctx: NavigationContext| async move {
            match ctx.params.get(0) {
                Some(_) => Flow::Handled,
                None => Flow::Next,
            }
        });

        let mut ctx = NavigationContext::new("/x/a/b", None, "");
        assert_eq!(pollster::block_on(mw.call(&ctx)), Flow::Next);

        ctx.params.push_group(Some("a".to_string()));
        assert_eq!(pollster::block_on(mw.call(&ctx)), Flow::Handled);
        assert_eq!(mw.name(), "FnMiddleware");
    }
}
