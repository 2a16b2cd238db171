//! HTTP server for the sprint naming service.
//!
//! This module implements the HTTP server that:
//! - Generates sprint names on demand for Notion automations
//! - Queues page updates for automations that cannot wait for Notion writes
//! - Receives Notion webhooks and names newly created sprint pages
//! - Provides health checks for liveness probes
//!
//! # Endpoints
//!
//! - `POST /v1/notion/sprint-name` - Returns a generated name (200)
//! - `POST /v1/notion/sprint-name-async` - Queues a page update (202, or 429 when busy)
//! - `POST /v1/notion/webhook` - Accepts Notion webhook deliveries (200)
//! - `GET /health` - Returns 200 if server is running

use std::sync::Arc;

pub mod auth;
pub mod error;
pub mod health;
pub mod request;
pub mod sprint_name;
pub mod webhook;

pub use error::{ApiError, ErrorResponse};
pub use health::health_handler;
pub use sprint_name::{sprint_name_async_handler, sprint_name_handler};
pub use webhook::webhook_handler;

use crate::jobs::JobDispatcher;
use crate::naming::NameGenerator;
use crate::notion::RemoteDocumentClient;
use crate::pipeline::PageJobs;
use crate::webhooks::IngressConfig;

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor. Every
/// component is constructed by the caller; nothing is looked up globally.
pub struct AppState<C> {
    inner: Arc<AppStateInner<C>>,
}

struct AppStateInner<C> {
    generator: Arc<NameGenerator>,
    dispatcher: JobDispatcher,
    jobs: PageJobs<C>,
    ingress: IngressConfig,
    /// Shared token expected in `X-Notion-Automations-Token`.
    automations_token: String,
}

impl<C> Clone for AppState<C> {
    fn clone(&self) -> Self {
        AppState {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> AppState<C> {
    pub fn new(
        generator: Arc<NameGenerator>,
        dispatcher: JobDispatcher,
        jobs: PageJobs<C>,
        ingress: IngressConfig,
        automations_token: impl Into<String>,
    ) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                generator,
                dispatcher,
                jobs,
                ingress,
                automations_token: automations_token.into(),
            }),
        }
    }

    pub fn generator(&self) -> &NameGenerator {
        &self.inner.generator
    }

    pub fn dispatcher(&self) -> &JobDispatcher {
        &self.inner.dispatcher
    }

    pub fn jobs(&self) -> &PageJobs<C> {
        &self.inner.jobs
    }

    pub fn ingress(&self) -> &IngressConfig {
        &self.inner.ingress
    }

    pub fn automations_token(&self) -> &str {
        &self.inner.automations_token
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router<C: RemoteDocumentClient>(app_state: AppState<C>) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/v1/notion/sprint-name", post(sprint_name_handler::<C>))
        .route(
            "/v1/notion/sprint-name-async",
            post(sprint_name_async_handler::<C>),
        )
        .route("/v1/notion/webhook", post(webhook_handler::<C>))
        .route("/health", get(health_handler))
        .with_state(app_state)
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::notion::PropertyValue;
    use crate::pipeline::{PropertyMapping, UpdatePipeline};
    use crate::test_utils::FakeDocumentClient;
    use crate::webhooks::{TargetCollection, sign};

    const TOKEN: &str = "automations-token";
    const SECRET: &str = "webhook-secret";
    const GRACE: Duration = Duration::from_secs(5);

    struct TestApp {
        router: axum::Router,
        dispatcher: JobDispatcher,
        client: Arc<FakeDocumentClient>,
    }

    fn test_app(
        max_pending: usize,
        verification_secret: Option<&str>,
        client: FakeDocumentClient,
    ) -> TestApp {
        let client = Arc::new(client);
        let generator = Arc::new(NameGenerator::with_default_words("1.0.0").unwrap());
        let mapping = PropertyMapping::new(
            Some("Sprint Name".into()),
            Some("Slug".into()),
            Some("Generator Version".into()),
        );
        let pipeline = UpdatePipeline::new(Arc::clone(&generator), Arc::clone(&client), mapping);
        let dispatcher = JobDispatcher::new(max_pending);
        let ingress = IngressConfig {
            verification_secret: verification_secret.map(str::to_string),
            target: TargetCollection::any(),
        };
        let state = AppState::new(
            generator,
            dispatcher.clone(),
            PageJobs::new(pipeline, None),
            ingress,
            TOKEN,
        );
        TestApp {
            router: build_router(state),
            dispatcher,
            client,
        }
    }

    fn naming_request(uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("x-request-id", "req-test");
        if let Some(token) = token {
            builder = builder.header("x-notion-automations-token", token);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    /// Creates a webhook request, signed when a secret is given.
    fn webhook_request(secret: Option<&str>, body: &Value) -> Request<Body> {
        let bytes = serde_json::to_vec(body).unwrap();
        let mut builder = Request::builder()
            .method("POST")
            .uri("/v1/notion/webhook")
            .header("content-type", "application/json");
        if let Some(secret) = secret {
            builder = builder.header("x-notion-signature", sign(secret.as_bytes(), &bytes));
        }
        builder.body(Body::from(bytes)).unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn page_created_event() -> Value {
        json!({
            "id": "evt-1",
            "timestamp": "2026-01-22T10:00:00.000Z",
            "type": "page.created",
            "entity": { "id": "page-1", "type": "page" },
            "data": { "parent": { "id": "db-1", "type": "database" } }
        })
    }

    // ─── Health endpoint tests ───

    #[tokio::test]
    async fn health_returns_200() {
        let app = test_app(1, None, FakeDocumentClient::new());

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app.router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"OK");
    }

    // ─── Synchronous naming tests ───

    #[tokio::test]
    async fn sprint_name_returns_generated_name() {
        let app = test_app(1, None, FakeDocumentClient::new());

        let response = app
            .router
            .oneshot(naming_request(
                "/v1/notion/sprint-name",
                Some(TOKEN),
                r#"{"seed":"2026_W04"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let slug = body["slug"].as_str().unwrap();
        assert_eq!(body["request_id"], "req-test");
        assert_eq!(body["name"], format!("Sprint {slug}"));
        assert_eq!(body["generator_version"], "1.0.0");
    }

    #[tokio::test]
    async fn sprint_name_is_deterministic_across_calls() {
        let app = test_app(1, None, FakeDocumentClient::new());

        let mut slugs = Vec::new();
        for _ in 0..2 {
            let request = Request::builder()
                .method("POST")
                .uri("/v1/notion/sprint-name")
                .header("x-notion-automations-token", TOKEN)
                .header("x-notion-sprint-seed", "2026_W04")
                .body(Body::empty())
                .unwrap();
            let response = app.router.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            slugs.push(json_body(response).await["slug"].clone());
        }

        assert_eq!(slugs[0], slugs[1]);
    }

    #[tokio::test]
    async fn sprint_name_accepts_free_form_seed() {
        let app = test_app(1, None, FakeDocumentClient::new());
        let response = app
            .router
            .oneshot(naming_request(
                "/v1/notion/sprint-name",
                Some(TOKEN),
                r#"{"seed":"Q3 planning"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn sprint_name_hashes_seed_as_received() {
        let app = test_app(1, None, FakeDocumentClient::new());
        let generator = NameGenerator::with_default_words("1.0.0").unwrap();

        let response = app
            .router
            .oneshot(naming_request(
                "/v1/notion/sprint-name",
                Some(TOKEN),
                r#"{"seed":" 2026_W04"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let slug = json_body(response).await["slug"].clone();
        assert_eq!(slug, generator.generate(" 2026_W04").unwrap().slug);
        assert_ne!(slug, generator.generate("2026_W04").unwrap().slug);
    }

    #[tokio::test]
    async fn sprint_name_requires_token() {
        let app = test_app(1, None, FakeDocumentClient::new());

        let missing = app
            .router
            .clone()
            .oneshot(naming_request("/v1/notion/sprint-name", None, r#"{"seed":"x"}"#))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            json_body(missing).await,
            json!({
                "message": "Missing X-Notion-Automations-Token header",
                "request_id": "req-test"
            })
        );

        // Authentication runs before body validation.
        let wrong = app
            .router
            .oneshot(naming_request("/v1/notion/sprint-name", Some("nope"), "{not json"))
            .await
            .unwrap();
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            json_body(wrong).await["message"],
            "Invalid X-Notion-Automations-Token"
        );
    }

    #[tokio::test]
    async fn sprint_name_validates_body() {
        let app = test_app(1, None, FakeDocumentClient::new());

        for (body, message) in [
            ("{not json", "Request body must be valid JSON"),
            ("{}", "`seed` is required"),
            (r#"{"seed":"   "}"#, "`seed` must be a non-empty string"),
        ] {
            let response = app
                .router
                .clone()
                .oneshot(naming_request("/v1/notion/sprint-name", Some(TOKEN), body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(json_body(response).await["message"], message);
        }
    }

    // ─── Asynchronous naming tests ───

    #[tokio::test]
    async fn sprint_name_async_accepts_and_updates_page() {
        let app = test_app(4, None, FakeDocumentClient::new());

        let response = app
            .router
            .oneshot(naming_request(
                "/v1/notion/sprint-name-async",
                Some(TOKEN),
                r#"{"seed":"2026_W04","page_id":"page-9"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(json_body(response).await, json!({ "request_id": "req-test" }));

        assert_eq!(app.dispatcher.shutdown(GRACE).await, 0);
        let patches = app.client.patches();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].0.as_str(), "page-9");
        assert_eq!(
            patches[0].1.get("Generator Version"),
            Some(&PropertyValue::RichText("1.0.0".into()))
        );
    }

    #[tokio::test]
    async fn sprint_name_async_writes_padded_seed_as_received() {
        let app = test_app(4, None, FakeDocumentClient::new());
        let expected = NameGenerator::with_default_words("1.0.0")
            .unwrap()
            .generate(" 2026_W04")
            .unwrap();

        let response = app
            .router
            .oneshot(naming_request(
                "/v1/notion/sprint-name-async",
                Some(TOKEN),
                r#"{"seed":" 2026_W04","page_id":"page-9"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        assert_eq!(app.dispatcher.shutdown(GRACE).await, 0);
        let patches = app.client.patches();
        assert_eq!(patches.len(), 1);
        assert_eq!(
            patches[0].1.get("Slug"),
            Some(&PropertyValue::RichText(expected.slug.clone()))
        );
        assert_eq!(
            patches[0].1.get("Sprint Name"),
            Some(&PropertyValue::Title(format!("{} -  2026_W04", expected.name)))
        );
    }

    #[tokio::test]
    async fn sprint_name_async_returns_429_when_full() {
        let app = test_app(0, None, FakeDocumentClient::new());

        let response = app
            .router
            .oneshot(naming_request(
                "/v1/notion/sprint-name-async",
                Some(TOKEN),
                r#"{"seed":"2026_W04","page_id":"page-9"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            json_body(response).await["message"],
            "Server is busy, try again later"
        );
        app.dispatcher.shutdown(GRACE).await;
        assert!(app.client.patches().is_empty());
    }

    #[tokio::test]
    async fn sprint_name_async_validates_input() {
        let app = test_app(4, None, FakeDocumentClient::new());

        for body in [
            r#"{"seed":"next sprint","page_id":"page-9"}"#,
            r#"{"seed":"2026_W04"}"#,
        ] {
            let response = app
                .router
                .clone()
                .oneshot(naming_request("/v1/notion/sprint-name-async", Some(TOKEN), body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        }

        assert_eq!(app.dispatcher.pending(), 0);
    }

    // ─── Webhook endpoint tests ───

    #[tokio::test]
    async fn webhook_handshake_acknowledged_without_signature() {
        let app = test_app(4, Some(SECRET), FakeDocumentClient::new());

        let response = app
            .router
            .oneshot(webhook_request(None, &json!({ "verification_token": "abc" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "ok": true }));
        app.dispatcher.shutdown(GRACE).await;
        assert_eq!(app.client.get_count(), 0);
    }

    #[tokio::test]
    async fn webhook_page_updated_is_a_no_op() {
        let event = json!({ "type": "page.updated", "entity": { "id": "x" } });

        let signed = test_app(4, Some(SECRET), FakeDocumentClient::new());
        let response = signed
            .router
            .oneshot(webhook_request(Some(SECRET), &event))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "ok": true }));

        let open = test_app(4, None, FakeDocumentClient::new());
        let response = open
            .router
            .oneshot(webhook_request(None, &event))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        signed.dispatcher.shutdown(GRACE).await;
        open.dispatcher.shutdown(GRACE).await;
        assert_eq!(signed.client.get_count(), 0);
        assert_eq!(open.client.get_count(), 0);
    }

    #[tokio::test]
    async fn webhook_bad_signature_returns_401() {
        let app = test_app(4, Some(SECRET), FakeDocumentClient::new());

        let response = app
            .router
            .oneshot(webhook_request(Some("wrong-secret"), &page_created_event()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            json_body(response).await["message"],
            "Invalid Notion webhook signature"
        );
        app.dispatcher.shutdown(GRACE).await;
        assert_eq!(app.client.get_count(), 0);
    }

    #[tokio::test]
    async fn webhook_page_created_names_page() {
        let client = FakeDocumentClient::new().with_page("page-1", vec![]);
        let app = test_app(4, Some(SECRET), client);

        let response = app
            .router
            .oneshot(webhook_request(Some(SECRET), &page_created_event()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        assert_eq!(app.dispatcher.shutdown(GRACE).await, 0);
        let page = app.client.page("page-1").unwrap();
        let title = page.plain_text("Sprint Name").unwrap();
        assert!(title.starts_with("Sprint "));
        assert!(title.ends_with(" - 2026_W04"));
    }

    #[tokio::test]
    async fn webhook_acknowledges_even_when_dispatcher_full() {
        let client = FakeDocumentClient::new().with_page("page-1", vec![]);
        let app = test_app(0, None, client);

        let response = app
            .router
            .oneshot(webhook_request(None, &page_created_event()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "ok": true }));
        app.dispatcher.shutdown(GRACE).await;
        assert_eq!(app.client.get_count(), 0);
    }

    #[tokio::test]
    async fn webhook_upstream_failure_is_still_acknowledged() {
        let client = FakeDocumentClient::new();
        client.fail_with_status(502);
        let app = test_app(4, None, client);

        let response = app
            .router
            .oneshot(webhook_request(None, &page_created_event()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        app.dispatcher.shutdown(GRACE).await;
        assert_eq!(app.client.get_count(), 1);
        assert_eq!(app.dispatcher.pending(), 0);
    }
}
