//! Sprint Namer - A Notion integration that gives sprint pages stable, human-readable names.
//!
//! This library provides the name generator, the webhook ingress, the bounded
//! job dispatcher, and the idempotent page update that the service binary
//! wires together.

pub mod config;
pub mod jobs;
pub mod naming;
pub mod notion;
pub mod pipeline;
pub mod server;
pub mod types;
pub mod webhooks;

#[cfg(test)]
pub(crate) mod test_utils;
