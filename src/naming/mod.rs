//! Sprint name generation.

pub mod generator;
pub mod wordlists;

pub use generator::{GeneratedName, NAME_PREFIX, NameError, NameGenerator};
