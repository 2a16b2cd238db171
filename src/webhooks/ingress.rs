//! Webhook ingress state machine.
//!
//! Every delivery is classified synchronously, before any background work is
//! scheduled:
//!
//! ```text
//! RECEIVED ──verification_token──► HANDSHAKE ─────────────────────────► ACK
//!    │
//!    ├─ secret configured, signature bad ──► REJECTED ────────────────► 401
//!    │
//!    └─ signature ok / no secret ──► AUTHENTICATED
//!                                       ├─ not page.created / no id ──► ACK (no-op)
//!                                       ├─ parent not targeted ───────► ACK (no-op)
//!                                       └─ targeted page ─────────────► schedule job, ACK
//! ```
//!
//! [`classify`] is pure: it returns an [`IngressDecision`] and the HTTP handler
//! performs the side effects.

use tracing::{debug, info, warn};

use super::events::{PAGE_CREATED, WebhookEvent};
use super::signature::verify;
use crate::types::{EventId, PageId, normalize_notion_id};

/// The collection whose new pages should be named.
///
/// With neither identifier configured, every created page qualifies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetCollection {
    database_id: Option<String>,
    data_source_id: Option<String>,
}

impl TargetCollection {
    /// Creates a target from optional identifiers; blank values count as unset.
    pub fn new(database_id: Option<String>, data_source_id: Option<String>) -> Self {
        let clean = |id: Option<String>| {
            id.map(|s| normalize_notion_id(&s))
                .filter(|s| !s.is_empty())
        };
        TargetCollection {
            database_id: clean(database_id),
            data_source_id: clean(data_source_id),
        }
    }

    /// A target that matches every page.
    pub fn any() -> Self {
        Self::default()
    }

    /// Returns true when no identifier is configured.
    pub fn is_unrestricted(&self) -> bool {
        self.database_id.is_none() && self.data_source_id.is_none()
    }

    /// Returns true when an event parent belongs to this collection.
    pub fn matches(&self, event: &WebhookEvent) -> bool {
        if self.is_unrestricted() {
            return true;
        }
        let Some(parent) = event.parent() else {
            return false;
        };
        let configured = [self.database_id.as_ref(), self.data_source_id.as_ref()];
        parent
            .normalized_ids()
            .iter()
            .any(|id| configured.iter().flatten().any(|c| *c == id))
    }
}

/// Settings that drive classification.
#[derive(Debug, Clone, Default)]
pub struct IngressConfig {
    /// HMAC secret; `None` accepts unsigned deliveries.
    pub verification_secret: Option<String>,
    pub target: TargetCollection,
}

/// A page that should be named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCreated {
    pub page_id: PageId,
    pub event_id: Option<EventId>,
    pub timestamp: Option<String>,
}

/// Why an authenticated delivery needs no work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The body was not a JSON object.
    NotAnEvent,
    /// The event type is not `page.created`.
    UnhandledType,
    /// `page.created` without a usable entity ID.
    MissingEntityId,
    /// The page is outside the target collection.
    OutsideTarget,
}

/// Outcome of classifying one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngressDecision {
    /// One-time subscription handshake; acknowledge without verification.
    Handshake { verification_token: String },
    /// Signature missing or wrong.
    Rejected { had_signature: bool },
    /// Authenticated, but nothing to do.
    Ignored(IgnoreReason),
    /// Authenticated page creation in the target collection.
    Schedule(PageCreated),
}

/// Classifies a raw delivery.
///
/// `signature` is the raw `X-Notion-Signature` header value, if any.
pub fn classify(
    config: &IngressConfig,
    raw_body: &[u8],
    signature: Option<&str>,
) -> IngressDecision {
    let body: Option<serde_json::Value> = serde_json::from_slice(raw_body).ok();

    if let Some(token) = body
        .as_ref()
        .and_then(|b| b.get("verification_token"))
        .and_then(|t| t.as_str())
    {
        info!(
            verification_token = %token,
            "Notion webhook verification token received"
        );
        return IngressDecision::Handshake {
            verification_token: token.to_string(),
        };
    }

    if let Some(secret) = config.verification_secret.as_deref()
        && !verify(secret.as_bytes(), raw_body, signature)
    {
        let had_signature = signature.is_some_and(|s| !s.trim().is_empty());
        warn!(has_signature = had_signature, "Notion webhook signature mismatch");
        return IngressDecision::Rejected { had_signature };
    }

    let Some(body) = body.filter(|b| b.is_object()) else {
        warn!("Authenticated webhook body is not a JSON object");
        return IngressDecision::Ignored(IgnoreReason::NotAnEvent);
    };

    let event = WebhookEvent::from_value(&body);
    info!(
        event_type = %event.type_or_unknown(),
        entity_id = ?event.entity_id().map(|id| id.to_string()),
        event_id = ?event.event_id.as_deref(),
        "Notion webhook event received"
    );

    if event.event_type.as_deref() != Some(PAGE_CREATED) {
        return IngressDecision::Ignored(IgnoreReason::UnhandledType);
    }

    let Some(page_id) = event.entity_id() else {
        debug!("page.created without entity id");
        return IngressDecision::Ignored(IgnoreReason::MissingEntityId);
    };

    if !config.target.matches(&event) {
        debug!(page_id = %page_id, "Page is outside the target collection");
        return IngressDecision::Ignored(IgnoreReason::OutsideTarget);
    }

    IngressDecision::Schedule(PageCreated {
        page_id,
        event_id: event.event_id(),
        timestamp: event.timestamp,
    })
}
