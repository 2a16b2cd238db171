//! Core domain types shared across the service.

pub mod ids;
pub mod seed;

pub use ids::{EventId, PageId, RequestId, normalize_notion_id};
pub use seed::{InvalidSeed, SprintSeed};
