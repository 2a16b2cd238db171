//! Webhook handling for Notion events.
//!
//! This module provides:
//! - Signature verification for webhook payloads (HMAC-SHA256)
//! - Typed parsing of the event fields the service uses
//! - Classification of deliveries into handshake / rejected / ignored / scheduled

pub mod events;
pub mod ingress;
pub mod signature;

pub use events::{PAGE_CREATED, WebhookEvent};
pub use ingress::{
    IgnoreReason, IngressConfig, IngressDecision, PageCreated, TargetCollection, classify,
};
pub use signature::{compute_signature, sign, verify};
