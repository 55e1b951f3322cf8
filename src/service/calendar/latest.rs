use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;

/// Single result slot guarded by a generation ticket.
///
/// Overlapping queries are not prevented; instead each query takes a
/// ticket before its fetch and commits its result with that ticket. A
/// commit loses when a later ticket has already committed, so a stale
/// response can never overwrite a newer one, whatever order the two
/// responses arrive in.
#[derive(Debug)]
pub struct LatestSlot<T> {
    next_ticket: AtomicU64,
    inner: Mutex<Inner<T>>,
}

#[derive(Debug)]
struct Inner<T> {
    committed: u64,
    value: Option<T>,
}

impl<T: Clone> LatestSlot<T> {
    pub fn new() -> Self {
        Self {
            next_ticket: AtomicU64::new(1),
            inner: Mutex::new(Inner {
                committed: 0,
                value: None,
            }),
        }
    }

    /// Hand out the ticket for a query that is about to start. Tickets
    /// are strictly increasing.
    pub fn begin(&self) -> u64 {
        self.next_ticket.fetch_add(1, Ordering::Relaxed)
    }

    /// Install `value` unless a newer ticket already committed. Returns
    /// whether the value was installed.
    pub async fn commit(&self, ticket: u64, value: T) -> bool {
        let mut inner = self.inner.lock().await;
        if ticket <= inner.committed {
            return false;
        }
        inner.committed = ticket;
        inner.value = Some(value);
        true
    }

    /// Newest committed value, if any.
    pub async fn current(&self) -> Option<T> {
        self.inner.lock().await.value.clone()
    }
}

impl<T: Clone> Default for LatestSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}
