//! Error and outcome types for the router.
//!
//! - [`RouterError`]: failures that reach a caller as a `Result` (broken
//!   route patterns, use of a router that was never started).
//! - [`DispatchOutcome`]: how a single dispatch through the middleware
//!   pipeline ended. Outcomes are informational: the public navigation entry
//!   points never surface them as errors.
//!
//! # Examples
//!
//! ```
//! use review_router::error::{DispatchOutcome, RouterError};
//!
//! let outcome = DispatchOutcome::Blocked { reason: "saving".into() };
//! assert!(outcome.is_blocked());
//!
//! let err = RouterError::RouteNotFound { path: "/nope".into() };
//! assert_eq!(err.to_string(), "Route not found: /nope");
//! ```

use std::fmt;

// ============================================================================
// RouterError
// ============================================================================

/// Errors surfaced by fallible router APIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// A route pattern failed to compile as a regular expression.
    InvalidPattern { pattern: String, message: String },

    /// No route claimed the path.
    RouteNotFound { path: String },

    /// Navigation was refused while a block reason was active.
    NavigationBlocked { reason: String },

    /// The router was used before [`start`](crate::Router::start).
    NotStarted,
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouterError::InvalidPattern { pattern, message } => {
                write!(f, "Invalid route pattern '{}': {}", pattern, message)
            }
            RouterError::RouteNotFound { path } => write!(f, "Route not found: {}", path),
            RouterError::NavigationBlocked { reason } => {
                write!(f, "Navigation blocked: {}", reason)
            }
            RouterError::NotStarted => write!(f, "Router has not been started"),
        }
    }
}

impl std::error::Error for RouterError {}

// ============================================================================
// DispatchOutcome
// ============================================================================

/// How a dispatch through the exit/enter pipeline ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// An enter middleware claimed the context.
    Handled,
    /// Every enter middleware fell through; the unhandled callback fired.
    Unhandled,
    /// A newer navigation replaced the current path mid-dispatch and the rest
    /// of this chain was abandoned.
    Superseded,
    /// The navigation blocker refused the navigation.
    Blocked { reason: String },
    /// An exit middleware claimed the outgoing context, so no enter
    /// middleware ran.
    Cancelled,
}

impl DispatchOutcome {
    /// Check if the context was claimed by a middleware.
    pub fn is_handled(&self) -> bool {
        matches!(self, DispatchOutcome::Handled)
    }

    /// Check if no middleware claimed the context.
    pub fn is_unhandled(&self) -> bool {
        matches!(self, DispatchOutcome::Unhandled)
    }

    /// Check if the dispatch lost the race against a newer navigation.
    pub fn is_superseded(&self) -> bool {
        matches!(self, DispatchOutcome::Superseded)
    }

    /// Check if an exit middleware stopped the navigation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DispatchOutcome::Cancelled)
    }

    /// Check if the navigation blocker refused the navigation.
    pub fn is_blocked(&self) -> bool {
        matches!(self, DispatchOutcome::Blocked { .. })
    }

    /// The block reason, if the navigation was refused.
    pub fn block_reason(&self) -> Option<&str> {
        match self {
            DispatchOutcome::Blocked { reason } => Some(reason),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
