//! Redelivery guard for already-applied order operations.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use common::OrderId;
use domain::OrderStatus;

/// How long applied entries are remembered by default.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(3600);

/// The ledger operation an order message maps to.
///
/// Guard entries are keyed per operation, so a ROLLBACK for an order
/// is independent of the NEW that created its reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppliedOperation {
    Create,
    Rollback,
    Confirm,
}

impl AppliedOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppliedOperation::Create => "create",
            AppliedOperation::Rollback => "rollback",
            AppliedOperation::Confirm => "confirm",
        }
    }
}

/// Result of [`AppliedOrders::claim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The caller now owns the operation and must apply it, then call
    /// [`AppliedOrders::complete`] or [`AppliedOrders::release`].
    Claimed,

    /// A concurrent delivery holds the claim; back off and let the
    /// transport redeliver.
    InFlight,

    /// The operation was applied earlier, with the outcome recorded for
    /// it (compensations record none).
    Applied(Option<OrderStatus>),
}

#[derive(Debug, Clone, Copy)]
enum EntryState {
    Pending,
    Applied(Option<OrderStatus>),
}

#[derive(Debug, Clone, Copy)]
struct AppliedEntry {
    state: EntryState,
    recorded_at: Instant,
}

#[derive(Debug, Default)]
struct AppliedState {
    entries: HashMap<(OrderId, AppliedOperation), AppliedEntry>,
    queue: VecDeque<(Instant, (OrderId, AppliedOperation))>,
}

impl AppliedState {
    fn upsert(&mut self, key: (OrderId, AppliedOperation), state: EntryState) {
        let now = Instant::now();
        self.entries.insert(
            key,
            AppliedEntry {
                state,
                recorded_at: now,
            },
        );
        self.queue.push_back((now, key));
    }
}

/// Tracks which order operations have already been applied to the ledger.
///
/// Message redelivery is at-least-once, so the same order can arrive more
/// than once — including concurrently on two workers. The check and the
/// claim are one atomic step: [`AppliedOrders::claim`] inserts a pending
/// marker under the write lock, so of two simultaneous duplicates exactly
/// one owns the operation and the other backs off. Entries expire after
/// the retention period; a duplicate that arrives later than that is
/// treated as a fresh delivery.
#[derive(Debug, Clone)]
pub struct AppliedOrders {
    state: Arc<RwLock<AppliedState>>,
    retention: Duration,
}

impl Default for AppliedOrders {
    fn default() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }
}

impl AppliedOrders {
    /// Creates a guard with the default retention.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a guard that forgets entries older than `retention`.
    pub fn with_retention(retention: Duration) -> Self {
        Self {
            state: Arc::new(RwLock::new(AppliedState::default())),
            retention,
        }
    }

    /// Atomically claims an operation for the order.
    ///
    /// Exactly one of any set of concurrent callers gets
    /// [`ClaimOutcome::Claimed`]; it must settle the claim with
    /// [`complete`](Self::complete) on success or
    /// [`release`](Self::release) on failure.
    pub fn claim(&self, order_id: OrderId, operation: AppliedOperation) -> ClaimOutcome {
        let mut state = self.state.write().unwrap();
        Self::prune_expired(&mut state, self.retention);

        let key = (order_id, operation);
        match state.entries.get(&key) {
            Some(entry) => match entry.state {
                EntryState::Pending => ClaimOutcome::InFlight,
                EntryState::Applied(outcome) => ClaimOutcome::Applied(outcome),
            },
            None => {
                state.upsert(key, EntryState::Pending);
                ClaimOutcome::Claimed
            }
        }
    }

    /// Marks a claimed operation as applied.
    ///
    /// For NEW orders the outcome carries the published ACCEPT or REJECT
    /// so a redelivery can re-answer without touching the ledger again.
    pub fn complete(
        &self,
        order_id: OrderId,
        operation: AppliedOperation,
        outcome: Option<OrderStatus>,
    ) {
        let mut state = self.state.write().unwrap();
        state.upsert((order_id, operation), EntryState::Applied(outcome));
    }

    /// Drops a claim whose apply failed, so a redelivery can retry.
    pub fn release(&self, order_id: OrderId, operation: AppliedOperation) {
        let mut state = self.state.write().unwrap();
        let key = (order_id, operation);
        if let Some(entry) = state.entries.get(&key)
            && matches!(entry.state, EntryState::Pending)
        {
            state.entries.remove(&key);
        }
    }

    /// Records an operation as applied without a prior claim.
    pub fn record(
        &self,
        order_id: OrderId,
        operation: AppliedOperation,
        outcome: Option<OrderStatus>,
    ) {
        let mut state = self.state.write().unwrap();
        state.upsert((order_id, operation), EntryState::Applied(outcome));
        Self::prune_expired(&mut state, self.retention);
    }

    /// Returns true if the operation has been applied for the order.
    ///
    /// A pending claim does not count as applied.
    pub fn is_applied(&self, order_id: OrderId, operation: AppliedOperation) -> bool {
        matches!(
            self.state
                .read()
                .unwrap()
                .entries
                .get(&(order_id, operation)),
            Some(AppliedEntry {
                state: EntryState::Applied(_),
                ..
            })
        )
    }

    /// Returns the outcome recorded for the operation, if one was recorded.
    pub fn recorded_outcome(
        &self,
        order_id: OrderId,
        operation: AppliedOperation,
    ) -> Option<OrderStatus> {
        match self
            .state
            .read()
            .unwrap()
            .entries
            .get(&(order_id, operation))
        {
            Some(AppliedEntry {
                state: EntryState::Applied(outcome),
                ..
            }) => *outcome,
            _ => None,
        }
    }

    /// Drops entries older than the retention period.
    pub fn prune(&self) {
        let mut state = self.state.write().unwrap();
        Self::prune_expired(&mut state, self.retention);
    }

    /// Returns the number of remembered entries, pending claims included.
    pub fn len(&self) -> usize {
        self.state.read().unwrap().entries.len()
    }

    /// Returns true if no entries are remembered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn prune_expired(state: &mut AppliedState, retention: Duration) {
        while let Some((recorded_at, key)) = state.queue.front().copied() {
            if recorded_at.elapsed() <= retention {
                break;
            }
            state.queue.pop_front();
            // A later record for the same key refreshed the entry; only
            // remove it when this queue slot is still the live one.
            if let Some(entry) = state.entries.get(&key)
                && entry.recorded_at == recorded_at
            {
                state.entries.remove(&key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_reports_applied_operations() {
        let guard = AppliedOrders::new();
        let order_id = OrderId::new();

        assert!(!guard.is_applied(order_id, AppliedOperation::Create));

        guard.record(order_id, AppliedOperation::Create, Some(OrderStatus::Accept));

        assert!(guard.is_applied(order_id, AppliedOperation::Create));
        assert_eq!(
            guard.recorded_outcome(order_id, AppliedOperation::Create),
            Some(OrderStatus::Accept)
        );
    }

    #[test]
    fn claim_is_exclusive_until_settled() {
        let guard = AppliedOrders::new();
        let order_id = OrderId::new();

        assert_eq!(
            guard.claim(order_id, AppliedOperation::Rollback),
            ClaimOutcome::Claimed
        );
        // A concurrent duplicate sees the pending claim, not "not applied".
        assert_eq!(
            guard.claim(order_id, AppliedOperation::Rollback),
            ClaimOutcome::InFlight
        );
        assert!(!guard.is_applied(order_id, AppliedOperation::Rollback));

        guard.complete(order_id, AppliedOperation::Rollback, None);

        assert_eq!(
            guard.claim(order_id, AppliedOperation::Rollback),
            ClaimOutcome::Applied(None)
        );
        assert!(guard.is_applied(order_id, AppliedOperation::Rollback));
    }

    #[test]
    fn released_claim_can_be_retried() {
        let guard = AppliedOrders::new();
        let order_id = OrderId::new();

        assert_eq!(
            guard.claim(order_id, AppliedOperation::Confirm),
            ClaimOutcome::Claimed
        );
        guard.release(order_id, AppliedOperation::Confirm);

        assert_eq!(
            guard.claim(order_id, AppliedOperation::Confirm),
            ClaimOutcome::Claimed
        );
    }

    #[test]
    fn release_does_not_erase_an_applied_entry() {
        let guard = AppliedOrders::new();
        let order_id = OrderId::new();

        guard.record(order_id, AppliedOperation::Create, Some(OrderStatus::Accept));
        guard.release(order_id, AppliedOperation::Create);

        assert!(guard.is_applied(order_id, AppliedOperation::Create));
    }

    #[test]
    fn completed_claim_reports_the_recorded_outcome() {
        let guard = AppliedOrders::new();
        let order_id = OrderId::new();

        guard.claim(order_id, AppliedOperation::Create);
        guard.complete(order_id, AppliedOperation::Create, Some(OrderStatus::Reject));

        assert_eq!(
            guard.claim(order_id, AppliedOperation::Create),
            ClaimOutcome::Applied(Some(OrderStatus::Reject))
        );
        assert_eq!(
            guard.recorded_outcome(order_id, AppliedOperation::Create),
            Some(OrderStatus::Reject)
        );
    }

    #[test]
    fn operations_are_tracked_independently() {
        let guard = AppliedOrders::new();
        let order_id = OrderId::new();

        guard.record(order_id, AppliedOperation::Create, Some(OrderStatus::Accept));

        assert!(!guard.is_applied(order_id, AppliedOperation::Rollback));
        assert!(!guard.is_applied(order_id, AppliedOperation::Confirm));

        guard.record(order_id, AppliedOperation::Rollback, None);
        assert!(guard.is_applied(order_id, AppliedOperation::Rollback));
        assert_eq!(
            guard.recorded_outcome(order_id, AppliedOperation::Rollback),
            None
        );
    }

    #[test]
    fn distinct_orders_do_not_collide() {
        let guard = AppliedOrders::new();
        let first = OrderId::new();
        let second = OrderId::new();

        guard.record(first, AppliedOperation::Create, Some(OrderStatus::Reject));

        assert!(!guard.is_applied(second, AppliedOperation::Create));
        assert_eq!(guard.len(), 1);
    }

    #[test]
    fn prune_forgets_expired_entries() {
        let guard = AppliedOrders::with_retention(Duration::from_millis(5));
        let order_id = OrderId::new();

        guard.record(order_id, AppliedOperation::Create, Some(OrderStatus::Accept));
        assert_eq!(guard.len(), 1);

        std::thread::sleep(Duration::from_millis(20));
        guard.prune();

        assert!(guard.is_empty());
        assert!(!guard.is_applied(order_id, AppliedOperation::Create));
    }

    #[test]
    fn re_recording_refreshes_expiry() {
        let guard = AppliedOrders::with_retention(Duration::from_millis(40));
        let order_id = OrderId::new();

        guard.record(order_id, AppliedOperation::Create, Some(OrderStatus::Accept));
        std::thread::sleep(Duration::from_millis(25));

        // Refresh before the first slot expires.
        guard.record(order_id, AppliedOperation::Create, Some(OrderStatus::Accept));
        std::thread::sleep(Duration::from_millis(25));
        guard.prune();

        // The first queue slot expired, the refreshed entry survives.
        assert!(guard.is_applied(order_id, AppliedOperation::Create));
    }

    #[test]
    fn recording_prunes_older_entries() {
        let guard = AppliedOrders::with_retention(Duration::from_millis(5));
        let stale = OrderId::new();
        let fresh = OrderId::new();

        guard.record(stale, AppliedOperation::Create, Some(OrderStatus::Accept));
        std::thread::sleep(Duration::from_millis(20));
        guard.record(fresh, AppliedOperation::Create, Some(OrderStatus::Accept));

        assert!(!guard.is_applied(stale, AppliedOperation::Create));
        assert!(guard.is_applied(fresh, AppliedOperation::Create));
    }
}
