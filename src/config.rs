//! Service configuration from environment variables.
//!
//! Blank variables are treated as unset. Everything that can be checked
//! before serving traffic is checked here, so a bad deployment fails at
//! startup rather than on the first webhook.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::Semaphore;

use crate::naming::wordlists::{default_adjectives, default_nouns};
use crate::naming::{NameError, NameGenerator};
use crate::notion::{DEFAULT_BASE_URL, DEFAULT_NOTION_VERSION, NotionConfig};
use crate::pipeline::PropertyMapping;
use crate::webhooks::{IngressConfig, TargetCollection};

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default dispatcher capacity.
pub const DEFAULT_MAX_PENDING: usize = 50;

/// Default generator version.
pub const DEFAULT_GENERATOR_VERSION: &str = "1.0.0";

/// Default title property written by the update pipeline.
pub const DEFAULT_NAME_PROPERTY: &str = "Sprint Name";

/// Default time allowed for background jobs to finish on shutdown.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error(transparent)]
    Generator(#[from] NameError),
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Complete service configuration.
#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub notion: NotionConfig,
    pub automations_token: String,
    pub ingress: IngressConfig,
    pub seed_property: Option<String>,
    pub mapping: PropertyMapping,
    pub generator_version: String,
    pub adjectives: Vec<String>,
    pub nouns: Vec<String>,
    pub max_pending: usize,
    pub shutdown_grace: Duration,
    pub log_format: LogFormat,
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let port = parse_or(get("PORT"), "PORT", "a port number", DEFAULT_PORT)?;
        let max_pending = parse_or(
            get("ASYNC_MAX_PENDING"),
            "ASYNC_MAX_PENDING",
            "a non-negative integer",
            DEFAULT_MAX_PENDING,
        )?;
        if max_pending > Semaphore::MAX_PERMITS {
            return Err(ConfigError::Invalid {
                name: "ASYNC_MAX_PENDING",
                expected: "at most the dispatcher's permit limit",
                value: max_pending.to_string(),
            });
        }
        let grace_secs = parse_or(
            get("SHUTDOWN_GRACE_SECS"),
            "SHUTDOWN_GRACE_SECS",
            "a whole number of seconds",
            DEFAULT_SHUTDOWN_GRACE.as_secs(),
        )?;

        let log_format = match get("LOG_FORMAT").as_deref().map(str::to_ascii_lowercase) {
            None => LogFormat::default(),
            Some(f) if f == "pretty" => LogFormat::Pretty,
            Some(f) if f == "json" => LogFormat::Json,
            Some(f) => {
                return Err(ConfigError::Invalid {
                    name: "LOG_FORMAT",
                    expected: "\"pretty\" or \"json\"",
                    value: f,
                });
            }
        };

        let notion = NotionConfig {
            api_token: require("NOTION_API_TOKEN")?,
            notion_version: get("NOTION_VERSION")
                .unwrap_or_else(|| DEFAULT_NOTION_VERSION.to_string()),
            base_url: get("NOTION_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        };

        let ingress = IngressConfig {
            verification_secret: get("NOTION_WEBHOOK_VERIFICATION_TOKEN"),
            target: TargetCollection::new(
                get("NOTION_SPRINT_DATABASE_ID"),
                get("NOTION_SPRINT_DATA_SOURCE_ID"),
            ),
        };

        let mapping = PropertyMapping::new(
            Some(
                get("NOTION_SPRINT_NAME_PROPERTY")
                    .unwrap_or_else(|| DEFAULT_NAME_PROPERTY.to_string()),
            ),
            get("NOTION_SPRINT_SLUG_PROPERTY"),
            get("NOTION_SPRINT_GENERATOR_VERSION_PROPERTY"),
        );

        let config = Config {
            port,
            notion,
            automations_token: require("NOTION_AUTOMATIONS_TOKEN")?,
            ingress,
            seed_property: get("NOTION_SPRINT_SEED_PROPERTY"),
            mapping,
            generator_version: get("GENERATOR_VERSION")
                .unwrap_or_else(|| DEFAULT_GENERATOR_VERSION.to_string()),
            adjectives: get("SPRINT_ADJECTIVES")
                .map(|v| split_words(&v))
                .unwrap_or_else(default_adjectives),
            nouns: get("SPRINT_NOUNS")
                .map(|v| split_words(&v))
                .unwrap_or_else(default_nouns),
            max_pending,
            shutdown_grace: Duration::from_secs(grace_secs),
            log_format,
        };

        // Word lists and version are validated by building a generator once.
        config.name_generator()?;
        Ok(config)
    }

    /// Builds the name generator described by this configuration.
    pub fn name_generator(&self) -> Result<NameGenerator, NameError> {
        NameGenerator::new(
            self.adjectives.clone(),
            self.nouns.clone(),
            self.generator_version.clone(),
        )
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("notion", &self.notion)
            .field("verify_signatures", &self.ingress.verification_secret.is_some())
            .field("target", &self.ingress.target)
            .field("seed_property", &self.seed_property)
            .field("mapping", &self.mapping)
            .field("generator_version", &self.generator_version)
            .field("adjectives", &self.adjectives.len())
            .field("nouns", &self.nouns.len())
            .field("max_pending", &self.max_pending)
            .field("shutdown_grace", &self.shutdown_grace)
            .field("log_format", &self.log_format)
            .finish_non_exhaustive()
    }
}

fn parse_or<T: std::str::FromStr>(
    value: Option<String>,
    name: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value: v,
        }),
    }
}

/// Splits a comma-separated list, dropping blank entries.
fn split_words(list: &str) -> Vec<String> {
    list.split(',')
        .map(|w| w.trim().to_string())
        .filter(|w| !w.is_empty())
        .collect()
}
