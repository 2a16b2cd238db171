//! Notion webhook endpoint.
//!
//! Classification (handshake, signature check, filtering) happens before the
//! response is sent; naming the page happens in a background job. Every
//! authenticated delivery is acknowledged with `{"ok": true}`, including ones
//! whose job could not be queued, since Notion redelivers on its own.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::AppState;
use super::error::{ApiError, ErrorResponse};
use super::request::{header_str, request_id};
use crate::notion::RemoteDocumentClient;
use crate::webhooks::{IngressDecision, classify};

/// Header carrying the delivery signature.
pub const HEADER_SIGNATURE: &str = "x-notion-signature";

fn ack() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// Webhook handler.
///
/// # Response
///
/// - 200 OK: `{"ok": true}` for handshakes, ignored events, and scheduled
///   events
/// - 401 Unauthorized: a verification secret is configured and the signature
///   is missing or wrong
pub async fn webhook_handler<C: RemoteDocumentClient>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ErrorResponse> {
    let signature = header_str(&headers, HEADER_SIGNATURE);

    match classify(state.ingress(), &body, signature) {
        IngressDecision::Handshake { .. } => Ok(ack()),
        IngressDecision::Rejected { .. } => {
            Err(ApiError::InvalidSignature.for_request(&request_id(&headers)))
        }
        IngressDecision::Ignored(reason) => {
            debug!(reason = ?reason, "Webhook acknowledged without work");
            Ok(ack())
        }
        IngressDecision::Schedule(event) => {
            let page_id = event.page_id.clone();
            let submission = state.dispatcher().submit(state.jobs().page_created(event));
            if submission.accepted {
                info!(page_id = %page_id, pending = submission.pending, "Page naming queued");
            } else {
                warn!(
                    page_id = %page_id,
                    max_pending = submission.max_pending,
                    "Page naming dropped: dispatcher full"
                );
            }
            Ok(ack())
        }
    }
}
