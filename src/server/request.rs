//! Request parsing for the naming endpoints.
//!
//! Automation tools differ in what they can send, so inputs are read from
//! headers first and from the JSON body second.

use axum::http::HeaderMap;
use serde_json::Value;

use super::error::ApiError;
use crate::types::{PageId, RequestId};

pub const HEADER_REQUEST_ID: &str = "x-request-id";
pub const HEADER_SEED: &str = "x-notion-sprint-seed";
pub const HEADER_PAGE_ID: &str = "x-notion-page-id";

/// Returns a header value if present and valid UTF-8.
pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// The caller's `X-Request-Id`, or a fresh one.
pub fn request_id(headers: &HeaderMap) -> RequestId {
    RequestId::from_header(header_str(headers, HEADER_REQUEST_ID))
}

/// Parses an optional JSON body. An empty body is `None`.
pub fn parse_json_body(body: &[u8]) -> Result<Option<Value>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|_| ApiError::invalid_input("Request body must be valid JSON"))
}

/// Reads the seed from `X-Notion-Sprint-Seed`, falling back to the body's
/// `seed` field.
///
/// Blankness is judged on the trimmed value, but the seed is returned exactly
/// as received: it is hashed byte for byte.
pub fn extract_seed(headers: &HeaderMap, body: Option<&Value>) -> Result<String, ApiError> {
    let seed = match header_str(headers, HEADER_SEED) {
        Some(header) => header.to_string(),
        None => match body.and_then(|b| b.as_object()).and_then(|o| o.get("seed")) {
            None | Some(Value::Null) => return Err(ApiError::invalid_input("`seed` is required")),
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(ApiError::invalid_input("`seed` must be a string")),
        },
    };

    if seed.trim().is_empty() {
        return Err(ApiError::invalid_input("`seed` must be a non-empty string"));
    }
    Ok(seed)
}

/// Reads the target page from `X-Notion-Page-Id`, or from the body's
/// `page_id`, `pageId`, `id`, or `page.id`, whichever is first non-blank.
pub fn extract_page_id(headers: &HeaderMap, body: Option<&Value>) -> Result<PageId, ApiError> {
    if let Some(id) = header_str(headers, HEADER_PAGE_ID).and_then(PageId::parse) {
        return Ok(id);
    }

    let object = body.and_then(|b| b.as_object());
    let candidates = [
        object.and_then(|o| o.get("page_id")),
        object.and_then(|o| o.get("pageId")),
        object.and_then(|o| o.get("id")),
        object.and_then(|o| o.get("page")).and_then(|p| p.get("id")),
    ];

    candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .find_map(PageId::parse)
        .ok_or_else(|| ApiError::invalid_input("`page_id` is required"))
}
