//! Background jobs that name Notion pages.
//!
//! Two entry points produce jobs for the dispatcher:
//!
//! - `page.created` webhook events, where the seed comes from the page itself
//!   or from the week the event happened in
//! - the asynchronous naming endpoint, where the caller supplies the seed
//!
//! Failures never reach a client. They are logged with the page ID, the event
//! or request ID, and the upstream status.

use chrono::{DateTime, Utc};
use tracing::{error, info, instrument};

use super::update::{PipelineError, UpdateOutcome, UpdatePipeline};
use crate::jobs::Job;
use crate::notion::{PageSnapshot, RemoteDocumentClient};
use crate::types::{PageId, RequestId, SprintSeed};
use crate::webhooks::PageCreated;

/// Reads a seed from a page: the seed property first, then the title.
///
/// Only values in `YYYY_WNN` form count.
pub fn seed_from_page(
    snapshot: &PageSnapshot,
    seed_property: Option<&str>,
) -> Option<SprintSeed> {
    let from_property = seed_property.and_then(|p| snapshot.plain_text(p));
    [from_property, snapshot.title_text()]
        .into_iter()
        .flatten()
        .find_map(|text| SprintSeed::parse(&text).ok())
}

/// Picks the seed for a created page, falling back to the ISO week of the
/// event timestamp or of `now`.
pub fn resolve_seed(
    snapshot: &PageSnapshot,
    seed_property: Option<&str>,
    timestamp: Option<&str>,
    now: DateTime<Utc>,
) -> SprintSeed {
    seed_from_page(snapshot, seed_property)
        .unwrap_or_else(|| SprintSeed::from_timestamp_or(timestamp, now))
}

/// Builds naming jobs around a shared [`UpdatePipeline`].
pub struct PageJobs<C> {
    pipeline: UpdatePipeline<C>,
    seed_property: Option<String>,
}

impl<C> Clone for PageJobs<C> {
    fn clone(&self) -> Self {
        PageJobs {
            pipeline: self.pipeline.clone(),
            seed_property: self.seed_property.clone(),
        }
    }
}

impl<C: RemoteDocumentClient> PageJobs<C> {
    pub fn new(pipeline: UpdatePipeline<C>, seed_property: Option<String>) -> Self {
        PageJobs {
            pipeline,
            seed_property: seed_property
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
        }
    }

    pub fn pipeline(&self) -> &UpdatePipeline<C> {
        &self.pipeline
    }

    /// Fetches the created page, picks its seed, and names it.
    #[instrument(skip_all, fields(page_id = %event.page_id))]
    pub async fn name_created_page(
        &self,
        event: &PageCreated,
    ) -> Result<UpdateOutcome, PipelineError> {
        let snapshot = self.pipeline.client().get(&event.page_id).await?;
        let seed = resolve_seed(
            &snapshot,
            self.seed_property.as_deref(),
            event.timestamp.as_deref(),
            Utc::now(),
        );
        self.pipeline
            .apply(&event.page_id, &seed, Some(&snapshot))
            .await
    }

    /// Job for a `page.created` webhook event.
    pub fn page_created(&self, event: PageCreated) -> Job {
        let jobs = self.clone();
        let page_id = event.page_id.clone();
        let event_id = event.event_id.clone();

        Job::new("page_created", async move {
            let outcome = jobs.name_created_page(&event).await?;
            info!(
                page_id = %event.page_id,
                event_id = ?event.event_id.as_ref().map(|id| id.as_str()),
                outcome = ?outcome,
                "Page-created job finished"
            );
            Ok(())
        })
        .on_error(move |err| {
            error!(
                page_id = %page_id,
                event_id = ?event_id.as_ref().map(|id| id.as_str()),
                status = ?upstream_status(err),
                error = %err,
                "Page-created job failed"
            );
            Ok(())
        })
    }

    /// Job for the asynchronous naming endpoint.
    ///
    /// The page is not fetched first, so the write is never skipped.
    pub fn name_page(&self, page_id: PageId, seed: SprintSeed, request_id: RequestId) -> Job {
        let pipeline = self.pipeline.clone();
        let failed_page = page_id.clone();
        let failed_request = request_id.clone();

        Job::new("sprint_name_async", async move {
            let outcome = pipeline.apply(&page_id, &seed, None).await?;
            info!(
                page_id = %page_id,
                request_id = %request_id,
                outcome = ?outcome,
                "Async sprint naming finished"
            );
            Ok(())
        })
        .on_error(move |err| {
            error!(
                page_id = %failed_page,
                request_id = %failed_request,
                status = ?upstream_status(err),
                error = %err,
                "Async sprint naming failed"
            );
            Ok(())
        })
    }
}

fn upstream_status(err: &anyhow::Error) -> Option<u16> {
    match err.downcast_ref::<PipelineError>() {
        Some(PipelineError::Upstream(e)) => e.status_code,
        _ => None,
    }
}
