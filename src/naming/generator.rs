//! Deterministic seed → sprint name mapping.
//!
//! The mapping is `SHA-256(seed ‖ generator_version)`: the first four digest
//! bytes (big-endian) pick the adjective and the next four pick the noun. Any
//! runtime with SHA-256 can reproduce it, and the stored generator version is
//! what the update pipeline uses to recognise already-named pages, so the
//! byte order and concatenation order here are part of the contract.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Fixed prefix of every generated name.
pub const NAME_PREFIX: &str = "Sprint ";

/// Errors from constructing or running the generator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    /// The seed was empty or whitespace.
    #[error("seed must be a non-empty string")]
    InvalidInput,

    /// The generator was configured with unusable inputs.
    #[error("name generator misconfigured: {0}")]
    Configuration(String),
}

/// The output of [`NameGenerator::generate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedName {
    /// `"Sprint " + slug`.
    pub name: String,
    /// `adjective-noun`.
    pub slug: String,
    /// The generator version that produced this name.
    pub generator_version: String,
}

/// Maps seeds to stable human-readable sprint names.
#[derive(Debug, Clone)]
pub struct NameGenerator {
    adjectives: Vec<String>,
    nouns: Vec<String>,
    version: String,
}

impl NameGenerator {
    /// Creates a generator.
    ///
    /// Fails when either list is empty, when a word is not made of lowercase
    /// ASCII letters (slugs must stay `adjective-noun`), or when the version is
    /// blank.
    pub fn new(
        adjectives: Vec<String>,
        nouns: Vec<String>,
        version: impl Into<String>,
    ) -> Result<Self, NameError> {
        validate_list("adjectives", &adjectives)?;
        validate_list("nouns", &nouns)?;

        let version = version.into();
        if version.trim().is_empty() {
            return Err(NameError::Configuration(
                "generator version must be a non-empty string".to_string(),
            ));
        }

        Ok(NameGenerator {
            adjectives,
            nouns,
            version,
        })
    }

    /// Creates a generator over the built-in word lists.
    pub fn with_default_words(version: impl Into<String>) -> Result<Self, NameError> {
        Self::new(
            super::wordlists::default_adjectives(),
            super::wordlists::default_nouns(),
            version,
        )
    }

    /// Returns the generator version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Generates the name for `seed`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sprint_namer::naming::NameGenerator;
    ///
    /// let generator = NameGenerator::with_default_words("1.0.0").unwrap();
    /// let first = generator.generate("2026_W04").unwrap();
    /// let second = generator.generate("2026_W04").unwrap();
    ///
    /// assert_eq!(first, second);
    /// assert_eq!(first.name, format!("Sprint {}", first.slug));
    /// ```
    pub fn generate(&self, seed: &str) -> Result<GeneratedName, NameError> {
        if seed.trim().is_empty() {
            return Err(NameError::InvalidInput);
        }

        let digest = Sha256::new()
            .chain_update(seed.as_bytes())
            .chain_update(self.version.as_bytes())
            .finalize();

        let adjective_index = read_u32(&digest[0..4]) as usize % self.adjectives.len();
        let noun_index = read_u32(&digest[4..8]) as usize % self.nouns.len();

        let slug = format!(
            "{}-{}",
            self.adjectives[adjective_index], self.nouns[noun_index]
        );

        Ok(GeneratedName {
            name: format!("{NAME_PREFIX}{slug}"),
            slug,
            generator_version: self.version.clone(),
        })
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn validate_list(label: &str, words: &[String]) -> Result<(), NameError> {
    if words.is_empty() {
        return Err(NameError::Configuration(format!(
            "{label} wordlist must be non-empty"
        )));
    }
    if let Some(bad) = words
        .iter()
        .find(|w| w.is_empty() || !w.bytes().all(|b| b.is_ascii_lowercase()))
    {
        return Err(NameError::Configuration(format!(
            "{label} wordlist contains {bad:?}; words must be lowercase ASCII letters"
        )));
    }
    Ok(())
}
