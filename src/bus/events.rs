//! Domain event types published on the bus.
//!
//! Single source of truth for the event kinds the engine reacts to. Every
//! variant is a fact about a completed board mutation; events are ephemeral
//! and never persisted by the engine itself.

use serde::{Deserialize, Serialize};

/// Discriminant for [`DomainEvent`] variants, used for subscription routing
/// and trigger matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ItemCreated,
    ItemUpdated,
    ColumnValueChanged,
    ItemDeleted,
}

impl EventKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            EventKind::ItemCreated => "item_created",
            EventKind::ItemUpdated => "item_updated",
            EventKind::ColumnValueChanged => "column_value_changed",
            EventKind::ItemDeleted => "item_deleted",
        }
    }
}

/// A completed board/item mutation, published by the CRUD collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    ItemCreated {
        board_id: String,
        item_id: String,
        actor_id: String,
        group_id: String,
        column_values: serde_json::Value,
    },
    ItemUpdated {
        board_id: String,
        item_id: String,
        actor_id: String,
        field: String,
        old_value: serde_json::Value,
        new_value: serde_json::Value,
    },
    ColumnValueChanged {
        board_id: String,
        item_id: String,
        actor_id: String,
        column_id: String,
        old_value: serde_json::Value,
        new_value: serde_json::Value,
    },
    ItemDeleted {
        board_id: String,
        item_id: String,
        actor_id: String,
    },
}

impl DomainEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            DomainEvent::ItemCreated { .. } => EventKind::ItemCreated,
            DomainEvent::ItemUpdated { .. } => EventKind::ItemUpdated,
            DomainEvent::ColumnValueChanged { .. } => EventKind::ColumnValueChanged,
            DomainEvent::ItemDeleted { .. } => EventKind::ItemDeleted,
        }
    }

    pub fn board_id(&self) -> &str {
        match self {
            DomainEvent::ItemCreated { board_id, .. }
            | DomainEvent::ItemUpdated { board_id, .. }
            | DomainEvent::ColumnValueChanged { board_id, .. }
            | DomainEvent::ItemDeleted { board_id, .. } => board_id,
        }
    }

    pub fn item_id(&self) -> &str {
        match self {
            DomainEvent::ItemCreated { item_id, .. }
            | DomainEvent::ItemUpdated { item_id, .. }
            | DomainEvent::ColumnValueChanged { item_id, .. }
            | DomainEvent::ItemDeleted { item_id, .. } => item_id,
        }
    }

    pub fn actor_id(&self) -> &str {
        match self {
            DomainEvent::ItemCreated { actor_id, .. }
            | DomainEvent::ItemUpdated { actor_id, .. }
            | DomainEvent::ColumnValueChanged { actor_id, .. }
            | DomainEvent::ItemDeleted { actor_id, .. } => actor_id,
        }
    }
}
