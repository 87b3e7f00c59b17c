//! Navigation blocking.
//!
//! Background work that must not be interrupted (an auto-saving edit, an
//! in-flight upload) registers a textual *block reason*. While any reason is
//! active:
//!
//! - the page's `beforeunload` warning is installed, naming the first reason;
//! - every dispatch waits a bounded time for the reasons to clear before
//!   either proceeding or giving up.
//!
//! A single shared resolution future exists exactly while the reason set is
//! non-empty. Clearing the last reason completes it, waking every waiting
//! dispatch at once.
//!
//! # Example
//!
//! ```ignore
//! blocker.block("saving");
//! // ... the edit finishes saving ...
//! blocker.release("saving");
//! ```

use crate::platform::Platform;
use crate::{debug_log, warn_log};
use futures::channel::oneshot;
use futures::future::{self, Either, FutureExt, Shared};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Default bound on how long a dispatch waits for block reasons to clear.
pub const DEFAULT_BLOCK_TIMEOUT: Duration = Duration::from_millis(1000);

struct Pending {
    sender: oneshot::Sender<()>,
    released: Shared<oneshot::Receiver<()>>,
}

/// The set of active block reasons and the pending resolution.
pub struct NavigationBlocker {
    platform: Rc<dyn Platform>,
    reasons: RefCell<Vec<String>>,
    pending: RefCell<Option<Pending>>,
}

impl NavigationBlocker {
    /// Create an empty blocker.
    pub fn new(platform: Rc<dyn Platform>) -> Self {
        Self {
            platform,
            reasons: RefCell::new(Vec::new()),
            pending: RefCell::new(None),
        }
    }

    /// Add `reason`. Blocking twice with the same reason is a no-op.
    pub fn block(&self, reason: &str) {
        if reason.trim().is_empty() {
            warn_log!("ignoring empty navigation block reason");
            return;
        }
        let first = {
            let mut reasons = self.reasons.borrow_mut();
            if reasons.iter().any(|r| r == reason) {
                return;
            }
            reasons.push(reason.to_string());
            reasons.len() == 1
        };
        debug_log!("navigation blocked: {}", reason);

        if first {
            let (sender, receiver) = oneshot::channel();
            self.pending.replace(Some(Pending {
                sender,
                released: receiver.shared(),
            }));
            self.platform.set_unload_warning(Some(reason.to_string()));
        }
    }

    /// Remove `reason`. Releasing an inactive reason is a no-op.
    pub fn release(&self, reason: &str) {
        let now_empty = {
            let mut reasons = self.reasons.borrow_mut();
            let Some(index) = reasons.iter().position(|r| r == reason) else {
                return;
            };
            reasons.remove(index);
            reasons.is_empty()
        };
        debug_log!("navigation block released: {}", reason);

        if now_empty {
            self.platform.set_unload_warning(None);
            if let Some(pending) = self.pending.take() {
                // Waiters may already be gone.
                let _ = pending.sender.send(());
            }
        }
    }

    /// Whether any reason is active.
    pub fn is_blocked(&self) -> bool {
        !self.reasons.borrow().is_empty()
    }

    /// The first active reason, used in warnings and notices.
    pub fn first_reason(&self) -> Option<String> {
        self.reasons.borrow().first().cloned()
    }

    /// All active reasons, in the order they were added.
    pub fn reasons(&self) -> Vec<String> {
        self.reasons.borrow().clone()
    }

    /// Wait until the reasons clear or `timeout` elapses, whichever comes
    /// first. Returns `true` if no reason is active when the wait settles.
    pub async fn wait_until_released(&self, timeout: Duration) -> bool {
        let released = match &*self.pending.borrow() {
            Some(pending) => pending.released.clone(),
            None => return true,
        };
        match future::select(released, self.platform.sleep(timeout)).await {
            Either::Left(_) => {
                debug_log!("navigation block cleared before timeout");
            }
            Either::Right(_) => {
                debug_log!("navigation block wait timed out after {:?}", timeout);
            }
        }
        !self.is_blocked()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, TestPlatform};
    use tokio::task::LocalSet;
    use tokio::time::Instant;

    fn blocker() -> (Rc<TestPlatform>, Rc<NavigationBlocker>) {
        let platform = TestPlatform::new("/");
        let blocker = Rc::new(NavigationBlocker::new(platform.clone()));
        (platform, blocker)
    }

    #[test]
    fn test_block_release_idempotent() {
        let (platform, blocker) = blocker();
        blocker.block("saving");
        blocker.block("saving");
        blocker.block("uploading");
        assert_eq!(blocker.reasons(), vec!["saving", "uploading"]);

        blocker.release("saving");
        blocker.release("saving");
        assert_eq!(blocker.first_reason(), Some("uploading".to_string()));
        blocker.release("uploading");
        assert!(!blocker.is_blocked());

        assert_eq!(
            platform.calls(),
            vec![
                Call::UnloadWarning(Some("saving".to_string())),
                Call::UnloadWarning(None),
            ]
        );
    }

    #[test]
    fn test_empty_reason_ignored() {
        let (platform, blocker) = blocker();
        blocker.block("");
        blocker.block("   ");
        assert!(!blocker.is_blocked());
        assert!(platform.calls().is_empty());
    }

    #[test]
    fn test_unblocked_wait_is_immediate() {
        let (_platform, blocker) = blocker();
        assert!(pollster::block_on(blocker.wait_until_released(DEFAULT_BLOCK_TIMEOUT)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out() {
        let (_platform, blocker) = blocker();
        LocalSet::new()
            .run_until(async move {
                blocker.block("saving");
                let start = Instant::now();
                let released = blocker.wait_until_released(DEFAULT_BLOCK_TIMEOUT).await;
                assert!(!released);
                let elapsed = start.elapsed();
                assert!(elapsed >= DEFAULT_BLOCK_TIMEOUT);
                assert!(elapsed < DEFAULT_BLOCK_TIMEOUT + Duration::from_millis(50));
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_wakes_waiter_early() {
        let (_platform, blocker) = blocker();
        LocalSet::new()
            .run_until(async move {
                blocker.block("saving");
                let releaser = blocker.clone();
                tokio::task::spawn_local(async move {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    releaser.release("saving");
                });

                let start = Instant::now();
                assert!(blocker.wait_until_released(DEFAULT_BLOCK_TIMEOUT).await);
                let elapsed = start.elapsed();
                assert!(elapsed >= Duration::from_millis(200));
                assert!(elapsed < DEFAULT_BLOCK_TIMEOUT);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_reblock_creates_fresh_resolution() {
        let (_platform, blocker) = blocker();
        LocalSet::new()
            .run_until(async move {
                blocker.block("a");
                blocker.release("a");
                blocker.block("b");
                assert!(!blocker.wait_until_released(Duration::from_millis(50)).await);
            })
            .await;
    }
}
