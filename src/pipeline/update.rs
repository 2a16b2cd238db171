//! Idempotent page update.
//!
//! An update is a pure plan ([`UpdateIntent`]) followed by at most one
//! `PATCH`. The generator version written to the page is the idempotency
//! marker: when the page already carries the current version, the write is
//! skipped, so a redelivered event never rewrites a title.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::naming::{NameError, NameGenerator};
use crate::notion::{
    NotionApiError, PageSnapshot, PropertyPatch, PropertyValue, RemoteDocumentClient,
};
use crate::types::{PageId, SprintSeed};

/// Reason reported when the page already carries the current generator version.
pub const ALREADY_PROCESSED: &str = "already_processed";

/// Names of the page properties the pipeline writes.
///
/// Each mapping is optional; an unset mapping means the field is not written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyMapping {
    /// Title property receiving `"Sprint <slug> - <seed>"`.
    pub title: Option<String>,
    /// Rich-text property receiving the slug.
    pub slug: Option<String>,
    /// Rich-text property receiving the generator version.
    pub generator_version: Option<String>,
}

impl PropertyMapping {
    pub fn new(
        title: Option<String>,
        slug: Option<String>,
        generator_version: Option<String>,
    ) -> Self {
        let clean = |name: Option<String>| {
            name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
        };
        PropertyMapping {
            title: clean(title),
            slug: clean(slug),
            generator_version: clean(generator_version),
        }
    }
}

/// The properties one page should end up with.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateIntent {
    pub page_id: PageId,
    pub seed: SprintSeed,
    pub slug: String,
    pub generator_version: String,
    pub desired_properties: PropertyPatch,
}

/// What [`UpdatePipeline::apply`] did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UpdateOutcome {
    /// No write was made.
    Skipped { reason: &'static str },
    /// The patch was written.
    Applied {
        slug: String,
        generator_version: String,
    },
}

impl UpdateOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, UpdateOutcome::Skipped { .. })
    }
}

/// Errors from [`UpdatePipeline::apply`].
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("cannot generate name: {0}")]
    InvalidInput(#[from] NameError),

    #[error(transparent)]
    Upstream(#[from] NotionApiError),
}

/// Generates a sprint name and writes it to a page at most once per
/// generator version.
pub struct UpdatePipeline<C> {
    generator: Arc<NameGenerator>,
    client: Arc<C>,
    mapping: PropertyMapping,
}

impl<C> Clone for UpdatePipeline<C> {
    fn clone(&self) -> Self {
        UpdatePipeline {
            generator: Arc::clone(&self.generator),
            client: Arc::clone(&self.client),
            mapping: self.mapping.clone(),
        }
    }
}

impl<C: RemoteDocumentClient> UpdatePipeline<C> {
    pub fn new(generator: Arc<NameGenerator>, client: Arc<C>, mapping: PropertyMapping) -> Self {
        UpdatePipeline {
            generator,
            client,
            mapping,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn mapping(&self) -> &PropertyMapping {
        &self.mapping
    }

    /// Plans the update for a page without touching Notion.
    pub fn intent(&self, page_id: &PageId, seed: &SprintSeed) -> Result<UpdateIntent, NameError> {
        let generated = self.generator.generate(seed.as_str())?;

        let mut desired = PropertyPatch::new();
        if let Some(title) = &self.mapping.title {
            desired.insert(
                title.clone(),
                PropertyValue::Title(format!("{} - {}", generated.name, seed)),
            );
        }
        if let Some(slug) = &self.mapping.slug {
            desired.insert(slug.clone(), PropertyValue::RichText(generated.slug.clone()));
        }
        if let Some(version) = &self.mapping.generator_version {
            desired.insert(
                version.clone(),
                PropertyValue::RichText(generated.generator_version.clone()),
            );
        }

        Ok(UpdateIntent {
            page_id: page_id.clone(),
            seed: seed.clone(),
            slug: generated.slug,
            generator_version: generated.generator_version,
            desired_properties: desired,
        })
    }

    /// Returns true when `snapshot` already carries the current generator
    /// version. Always false without a version mapping.
    pub fn already_processed(&self, snapshot: &PageSnapshot) -> bool {
        let Some(property) = &self.mapping.generator_version else {
            return false;
        };
        snapshot.plain_text(property).as_deref() == Some(self.generator.version())
    }

    /// Names the page, skipping the write when `existing_snapshot` shows it is
    /// already done.
    pub async fn apply(
        &self,
        page_id: &PageId,
        seed: &SprintSeed,
        existing_snapshot: Option<&PageSnapshot>,
    ) -> Result<UpdateOutcome, PipelineError> {
        let intent = self.intent(page_id, seed)?;

        if existing_snapshot.is_some_and(|s| self.already_processed(s)) {
            debug!(
                page_id = %page_id,
                generator_version = %intent.generator_version,
                "Page already carries current generator version"
            );
            return Ok(UpdateOutcome::Skipped {
                reason: ALREADY_PROCESSED,
            });
        }

        self.client
            .patch(&intent.page_id, &intent.desired_properties)
            .await?;

        info!(
            page_id = %page_id,
            seed = %seed,
            slug = %intent.slug,
            properties = intent.desired_properties.len(),
            "Sprint name written"
        );

        Ok(UpdateOutcome::Applied {
            slug: intent.slug,
            generator_version: intent.generator_version,
        })
    }
}
