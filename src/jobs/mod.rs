//! Background job execution.
//!
//! Request handlers hand work to the [`JobDispatcher`] and respond immediately;
//! the dispatcher bounds how much work may be outstanding at once.

mod dispatcher;

pub use dispatcher::{Job, JobDispatcher, Submission};
