//! Notion API access.
//!
//! This module provides the page client used by the update pipeline:
//! - [`RemoteDocumentClient`]: the read/patch seam the pipeline depends on
//! - [`NotionClient`]: the HTTPS implementation
//! - [`PropertyValue`] / [`PageSnapshot`] / [`PropertyPatch`]: typed page properties
//! - [`NotionApiError`]: transient vs permanent API failures

mod client;
mod error;
mod property;

pub use client::{
    DEFAULT_BASE_URL, DEFAULT_NOTION_VERSION, NotionClient, NotionConfig, RemoteDocumentClient,
};
pub use error::{NotionApiError, NotionErrorKind};
pub use property::{PageSnapshot, PropertyPatch, PropertyValue};
