//! Notion webhook event payloads.
//!
//! Only the fields the service reads are modelled; everything else in the
//! payload is ignored. All fields are optional because Notion's payload shape
//! varies by event type and API version, and a missing field must degrade to a
//! no-op rather than a parse error.
//!
//! ```json
//! {
//!   "id": "evt_…",
//!   "timestamp": "2026-01-22T10:00:00.000Z",
//!   "type": "page.created",
//!   "api_version": "2025-09-03",
//!   "entity": { "id": "page_…", "type": "page" },
//!   "data": { "parent": { "id": "db_…", "type": "database", "data_source_id": "ds_…" } }
//! }
//! ```

use serde::Deserialize;

use crate::types::{EventId, PageId, normalize_notion_id};

/// Event type that triggers sprint naming.
pub const PAGE_CREATED: &str = "page.created";

/// The subset of a Notion webhook event used for routing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    #[serde(rename = "id")]
    pub event_id: Option<String>,
    pub timestamp: Option<String>,
    pub api_version: Option<String>,
    pub entity: Option<EventEntity>,
    pub data: Option<EventData>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EventEntity {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EventData {
    pub parent: Option<EventParent>,
}

/// The parent collection of the entity an event refers to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EventParent {
    pub id: Option<String>,
    #[serde(alias = "dataSourceId")]
    pub data_source_id: Option<String>,
}

impl WebhookEvent {
    /// Parses an event from a JSON value.
    ///
    /// Fields with unexpected types are treated as absent.
    pub fn from_value(value: &serde_json::Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_else(|_| WebhookEvent {
            event_type: str_at(value, &["type"]),
            event_id: str_at(value, &["id"]),
            timestamp: str_at(value, &["timestamp"]),
            api_version: str_at(value, &["api_version"]),
            entity: Some(EventEntity {
                id: str_at(value, &["entity", "id"]),
                kind: str_at(value, &["entity", "type"]),
            }),
            data: Some(EventData {
                parent: Some(EventParent {
                    id: str_at(value, &["data", "parent", "id"]),
                    data_source_id: str_at(value, &["data", "parent", "data_source_id"])
                        .or_else(|| str_at(value, &["data", "parent", "dataSourceId"])),
                }),
            }),
        })
    }

    /// Returns the event type, or `"unknown"`.
    pub fn type_or_unknown(&self) -> &str {
        self.event_type.as_deref().unwrap_or("unknown")
    }

    /// Returns the entity ID when it is a non-blank string.
    pub fn entity_id(&self) -> Option<PageId> {
        self.entity
            .as_ref()
            .and_then(|e| e.id.as_deref())
            .and_then(PageId::parse)
    }

    pub fn event_id(&self) -> Option<EventId> {
        self.event_id.as_ref().map(EventId::new)
    }

    pub fn parent(&self) -> Option<&EventParent> {
        self.data.as_ref().and_then(|d| d.parent.as_ref())
    }
}

impl EventParent {
    /// Returns the parent identifiers present, normalized for comparison.
    pub fn normalized_ids(&self) -> Vec<String> {
        [self.id.as_deref(), self.data_source_id.as_deref()]
            .into_iter()
            .flatten()
            .map(normalize_notion_id)
            .filter(|id| !id.is_empty())
            .collect()
    }
}

fn str_at(value: &serde_json::Value, path: &[&str]) -> Option<String> {
    path.iter()
        .try_fold(value, |v, key| v.get(key))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}
