//! Shared test utilities: an in-memory Notion and proptest generators.

use std::collections::HashMap;
use std::sync::Mutex;

use proptest::prelude::*;

use crate::notion::{
    NotionApiError, PageSnapshot, PropertyPatch, PropertyValue, RemoteDocumentClient,
};
use crate::types::{PageId, SprintSeed};

/// In-memory [`RemoteDocumentClient`].
///
/// Patches are recorded and merged into the stored page, so a second fetch
/// sees what the first update wrote.
#[derive(Debug, Default)]
pub struct FakeDocumentClient {
    state: Mutex<FakeState>,
}

#[derive(Debug, Default)]
struct FakeState {
    pages: HashMap<String, PageSnapshot>,
    patches: Vec<(PageId, PropertyPatch)>,
    gets: usize,
    fail_with_status: Option<u16>,
}

impl FakeDocumentClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a page with the given properties.
    pub fn with_page(self, page_id: &str, properties: Vec<(&str, PropertyValue)>) -> Self {
        let id = PageId::parse(page_id).unwrap();
        let snapshot = PageSnapshot {
            id: id.clone(),
            properties: properties
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        };
        self.state
            .lock()
            .unwrap()
            .pages
            .insert(id.as_str().to_string(), snapshot);
        self
    }

    /// Makes every subsequent call fail with an HTTP error.
    pub fn fail_with_status(&self, status: u16) {
        self.state.lock().unwrap().fail_with_status = Some(status);
    }

    pub fn patches(&self) -> Vec<(PageId, PropertyPatch)> {
        self.state.lock().unwrap().patches.clone()
    }

    pub fn get_count(&self) -> usize {
        self.state.lock().unwrap().gets
    }

    pub fn page(&self, page_id: &str) -> Option<PageSnapshot> {
        self.state.lock().unwrap().pages.get(page_id).cloned()
    }
}

impl RemoteDocumentClient for FakeDocumentClient {
    async fn get(&self, page_id: &PageId) -> Result<PageSnapshot, NotionApiError> {
        let mut state = self.state.lock().unwrap();
        state.gets += 1;
        if let Some(status) = state.fail_with_status {
            return Err(NotionApiError::from_status(status, "injected failure"));
        }
        state
            .pages
            .get(page_id.as_str())
            .cloned()
            .ok_or_else(|| NotionApiError::from_status(404, r#"{"code":"object_not_found"}"#))
    }

    async fn patch(
        &self,
        page_id: &PageId,
        properties: &PropertyPatch,
    ) -> Result<(), NotionApiError> {
        let mut state = self.state.lock().unwrap();
        if let Some(status) = state.fail_with_status {
            return Err(NotionApiError::from_status(status, "injected failure"));
        }
        state.patches.push((page_id.clone(), properties.clone()));

        let page = state
            .pages
            .entry(page_id.as_str().to_string())
            .or_insert_with(|| PageSnapshot {
                id: page_id.clone(),
                properties: Default::default(),
            });
        for (name, value) in properties.iter() {
            page.properties.insert(name.clone(), value.clone());
        }
        Ok(())
    }
}

pub fn arb_sprint_seed() -> impl Strategy<Value = SprintSeed> {
    (1000u32..=9999, 1u32..=53)
        .prop_map(|(year, week)| SprintSeed::parse(&format!("{year}_W{week:02}")).unwrap())
}

pub fn arb_page_id() -> impl Strategy<Value = PageId> {
    "[0-9a-f]{32}".prop_map(|s| PageId::parse(&s).unwrap())
}
