use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use tokio::sync::mpsc;

use super::events::{DomainEvent, EventKind};

/// Past this many live subscriptions every new subscribe logs a warning.
/// Catches listener leaks without hard-failing legitimate large deployments.
const SOFT_SUBSCRIBER_CAP: usize = 200;

/// Handler invoked once per delivered event. Errors are logged and isolated;
/// they never reach the emitter or other listeners.
pub type EventHandler =
    Arc<dyn Fn(DomainEvent) -> BoxFuture<'static, Result<(), String>> + Send + Sync>;

/// What a subscription listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFilter {
    Kind(EventKind),
    /// Wildcard: every event regardless of kind.
    All,
}

impl EventFilter {
    fn matches(&self, event: &DomainEvent) -> bool {
        match self {
            EventFilter::Kind(kind) => *kind == event.kind(),
            EventFilter::All => true,
        }
    }
}

/// Opaque handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: u64,
    filter: EventFilter,
    tx: mpsc::UnboundedSender<DomainEvent>,
}

/// In-process publish/subscribe bus. No history, no redelivery.
///
/// Each subscription owns a dedicated consumer task fed by an unbounded
/// channel, so delivery is at-most-once, per-listener FIFO relative to
/// emission order, and a slow handler never blocks the emitter or other
/// listeners. Listeners are fed in registration order on each emit;
/// completion order across listeners is unspecified.
pub struct EventBus {
    subs: Mutex<Vec<Subscription>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subs: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register a handler for events matching `filter`.
    ///
    /// Spawns the subscription's consumer task; must be called from within a
    /// tokio runtime.
    pub fn subscribe(&self, filter: EventFilter, handler: EventHandler) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, mut rx) = mpsc::unbounded_channel::<DomainEvent>();

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let kind = event.kind();
                if let Err(e) = handler(event).await {
                    tracing::warn!(
                        event_kind = kind.as_str(),
                        "event handler failed, continuing: {e}"
                    );
                }
            }
        });

        let mut subs = self.subs.lock().expect("event bus mutex poisoned");
        subs.push(Subscription { id, filter, tx });
        if subs.len() > SOFT_SUBSCRIBER_CAP {
            tracing::warn!(
                count = subs.len(),
                "event bus subscriber count exceeds soft cap, possible listener leak"
            );
        }
        SubscriptionId(id)
    }

    /// Remove a subscription. Returns false if it was already gone.
    ///
    /// Dropping the sender ends the consumer task after it drains whatever
    /// was already queued.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.subs.lock().expect("event bus mutex poisoned");
        let before = subs.len();
        subs.retain(|sub| sub.id != id.0);
        subs.len() != before
    }

    /// Publish an event to all matching subscriptions, in registration order.
    ///
    /// Never blocks and never fails: each matching listener gets the event
    /// queued on its own channel. Dead subscriptions are pruned on the way.
    pub fn emit(&self, event: &DomainEvent) {
        let mut subs = self.subs.lock().expect("event bus mutex poisoned");
        subs.retain(|sub| {
            if !sub.filter.matches(event) {
                return !sub.tx.is_closed();
            }
            // A send error means the consumer task is gone; drop the entry.
            sub.tx.send(event.clone()).is_ok()
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.subs.lock().expect("event bus mutex poisoned").len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
