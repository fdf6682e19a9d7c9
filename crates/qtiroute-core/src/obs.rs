//! Structured observability hooks for route lifecycle events.
//!
//! This module provides:
//! - Session-scoped tracing spans via the `SessionSpan` RAII guard, which
//!   flushes [`crate::METRICS`] when the session closes
//! - Emission functions for route events: step appended, route composed,
//!   branch taken, branch rejected
//!
//! Route construction events are emitted at `debug!`, branching at `info!`
//! and rejected branches at `warn!`. Filter with `RUST_LOG`.

use tracing::{debug, info, warn};

use crate::metrics::METRICS;

/// RAII guard that enters a session-scoped tracing span.
///
/// Dropping the guard logs the route counters inside the span before leaving
/// it.
///
/// # Example
///
/// ```ignore
/// let _span = SessionSpan::enter("session-42");
/// // every route event below is tagged with session_id = "session-42"
/// ```
pub struct SessionSpan {
    _span: tracing::span::EnteredSpan,
}

impl SessionSpan {
    /// Create and enter a span tagged with the session id.
    pub fn enter(session_id: &str) -> Self {
        let span = tracing::info_span!("qtiroute.session", session_id = %session_id);
        Self {
            _span: span.entered(),
        }
    }
}

impl Drop for SessionSpan {
    fn drop(&mut self) {
        METRICS.flush();
    }
}

/// Emit event: a step was appended to a route.
pub fn emit_step_appended(position: usize, occurrence: &str, test_part: &str) {
    debug!(
        event = "route.step_appended",
        position = position,
        occurrence = %occurrence,
        test_part = %test_part,
    );
}

/// Emit event: another route was appended, `copied` steps in total.
pub fn emit_route_appended(copied: usize, len: usize) {
    debug!(event = "route.route_appended", copied = copied, len = len);
}

/// Emit event: a branch moved the cursor.
pub fn emit_branch_taken(target: &str, from: usize, to: usize) {
    info!(event = "route.branch_taken", target = %target, from = from, to = to);
}

/// Emit event: a branch was refused (warning level).
pub fn emit_branch_rejected(target: &str, position: usize, error: &dyn std::fmt::Display) {
    warn!(
        event = "route.branch_rejected",
        target = %target,
        position = position,
        error = %error,
    );
}
