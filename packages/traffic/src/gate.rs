//! Latest-wins ordering for overlapping queries.
//!
//! When the time slider moves faster than queries finish, only the result
//! of the most recently issued query may reach the renderer. Each query
//! takes a [`QueryTicket`] before it starts; a result is accepted only if
//! no newer ticket has been issued since.

use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one issued query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueryTicket(u64);

impl QueryTicket {
    /// Sequence number, starting at 1.
    #[must_use]
    pub const fn sequence(self) -> u64 {
        self.0
    }
}

/// Hands out increasing tickets and drops results from superseded queries.
///
/// Shareable across threads behind an `Arc`.
#[derive(Debug, Default)]
pub struct QueryGate {
    latest: AtomicU64,
}

impl QueryGate {
    /// Creates a gate with no queries issued.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            latest: AtomicU64::new(0),
        }
    }

    /// Registers a new query, superseding every earlier ticket.
    pub fn issue(&self) -> QueryTicket {
        QueryTicket(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Whether `ticket` is still the most recent one.
    #[must_use]
    pub fn is_current(&self, ticket: QueryTicket) -> bool {
        self.latest.load(Ordering::Acquire) == ticket.0
    }

    /// Passes `value` through if `ticket` is current, otherwise drops it.
    pub fn accept<T>(&self, ticket: QueryTicket, value: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(value)
        } else {
            log::debug!("Dropping stale result for query #{}", ticket.0);
            None
        }
    }
}
