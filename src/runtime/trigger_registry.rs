//! Listener lifecycle for stored entities.
//!
//! One registry instance per domain (automations, agents). Each entity id
//! holds at most one live bus subscription; re-registering replaces the old
//! subscription before creating the new one.

use std::sync::Arc;

use dashmap::DashMap;

use crate::bus::{EventBus, EventFilter, EventHandler, SubscriptionId};

pub struct TriggerRegistry {
    domain: &'static str,
    bus: Arc<EventBus>,
    handlers: DashMap<String, SubscriptionId>,
}

impl TriggerRegistry {
    pub fn new(domain: &'static str, bus: Arc<EventBus>) -> Self {
        Self {
            domain,
            bus,
            handlers: DashMap::new(),
        }
    }

    /// Subscribe `handler` for `id`, replacing any prior subscription.
    pub fn bind(&self, id: &str, filter: EventFilter, handler: EventHandler) {
        self.unbind(id);
        let subscription = self.bus.subscribe(filter, handler);
        self.handlers.insert(id.to_string(), subscription);
        tracing::debug!(domain = self.domain, id, "listener registered");
    }

    /// Remove `id`'s subscription. No-op (returns false) if absent.
    pub fn unbind(&self, id: &str) -> bool {
        match self.handlers.remove(id) {
            Some((_, subscription)) => {
                self.bus.unsubscribe(subscription);
                tracing::debug!(domain = self.domain, id, "listener unregistered");
                true
            }
            None => false,
        }
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.handlers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn domain(&self) -> &'static str {
        self.domain
    }
}
