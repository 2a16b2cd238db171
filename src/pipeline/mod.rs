//! Page naming: the idempotent update and the jobs that run it.

mod page_job;
mod update;

pub use page_job::{PageJobs, resolve_seed, seed_from_page};
pub use update::{
    ALREADY_PROCESSED, PipelineError, PropertyMapping, UpdateIntent, UpdateOutcome,
    UpdatePipeline,
};
