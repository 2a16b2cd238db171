//! Sprint naming endpoints.
//!
//! - `POST /v1/notion/sprint-name` returns the generated name directly.
//! - `POST /v1/notion/sprint-name-async` queues a job that writes the name to
//!   a page and returns 202 before the job runs.
//!
//! Both authenticate with the automations token before looking at the body.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::AppState;
use super::auth::{HEADER_AUTOMATIONS_TOKEN, check_token};
use super::error::{ApiError, ErrorResponse};
use super::request::{extract_page_id, extract_seed, header_str, parse_json_body, request_id};
use crate::naming::GeneratedName;
use crate::notion::RemoteDocumentClient;
use crate::types::SprintSeed;

/// Body of a successful synchronous naming call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprintNameResponse {
    pub request_id: String,
    pub name: String,
    pub slug: String,
    pub generator_version: String,
}

/// Body of an accepted asynchronous naming call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedResponse {
    pub request_id: String,
}

fn authenticate<C>(state: &AppState<C>, headers: &HeaderMap) -> Result<(), ApiError> {
    check_token(
        state.automations_token(),
        header_str(headers, HEADER_AUTOMATIONS_TOKEN),
    )
    .map_err(|e| {
        warn!(reason = %e, "Automations token rejected");
        ApiError::from(e)
    })
}

/// Synchronous naming handler.
///
/// Accepts any non-blank seed.
///
/// # Response
///
/// - 200 OK: `{request_id, name, slug, generator_version}`
/// - 400 Bad Request: invalid JSON, missing or blank seed
/// - 401 Unauthorized: missing or wrong token
pub async fn sprint_name_handler<C: RemoteDocumentClient>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SprintNameResponse>, ErrorResponse> {
    let request_id = request_id(&headers);

    let generate = || -> Result<GeneratedName, ApiError> {
        authenticate(&state, &headers)?;
        let body = parse_json_body(&body)?;
        let seed = extract_seed(&headers, body.as_ref())?;
        state
            .generator()
            .generate(&seed)
            .map_err(|e| ApiError::invalid_input(e.to_string()))
    };
    let generated = generate().map_err(|e| e.for_request(&request_id))?;

    info!(
        request_id = %request_id,
        slug = %generated.slug,
        generator_version = %generated.generator_version,
        "Sprint name generated"
    );

    Ok(Json(SprintNameResponse {
        request_id: request_id.as_str().to_string(),
        name: generated.name,
        slug: generated.slug,
        generator_version: generated.generator_version,
    }))
}

/// Asynchronous naming handler.
///
/// The seed must be a `YYYY_WNN` period since it is written to the page.
///
/// # Response
///
/// - 202 Accepted: `{request_id}`; the page is updated in the background
/// - 400 Bad Request: invalid JSON, missing or malformed seed, missing page ID
/// - 401 Unauthorized: missing or wrong token
/// - 429 Too Many Requests: the job dispatcher is full
pub async fn sprint_name_async_handler<C: RemoteDocumentClient>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<AcceptedResponse>), ErrorResponse> {
    let request_id = request_id(&headers);

    let parse = || {
        authenticate(&state, &headers)?;
        let body = parse_json_body(&body)?;
        let seed = extract_seed(&headers, body.as_ref())?;
        let seed =
            SprintSeed::parse(&seed).map_err(|e| ApiError::invalid_input(e.to_string()))?;
        let page_id = extract_page_id(&headers, body.as_ref())?;
        Ok::<_, ApiError>((seed, page_id))
    };
    let (seed, page_id) = parse().map_err(|e| e.for_request(&request_id))?;

    let job = state
        .jobs()
        .name_page(page_id.clone(), seed.clone(), request_id.clone());
    let submission = state.dispatcher().submit(job);

    if !submission.accepted {
        warn!(
            request_id = %request_id,
            page_id = %page_id,
            pending = submission.pending,
            max_pending = submission.max_pending,
            "Async naming rejected: dispatcher full"
        );
        return Err(ApiError::CapacityExceeded.for_request(&request_id));
    }

    info!(
        request_id = %request_id,
        page_id = %page_id,
        seed = %seed,
        pending = submission.pending,
        "Async naming queued"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(AcceptedResponse {
            request_id: request_id.as_str().to_string(),
        }),
    ))
}
