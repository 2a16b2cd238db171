//! Shared-token authentication for the naming endpoints.
//!
//! Notion automations send a fixed token in `X-Notion-Automations-Token`. The
//! provided value is trimmed and compared to the configured token in constant
//! time; the token itself is never logged.

use subtle::ConstantTimeEq;
use thiserror::Error;

/// Header carrying the automations token.
pub const HEADER_AUTOMATIONS_TOKEN: &str = "x-notion-automations-token";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Missing X-Notion-Automations-Token header")]
    MissingToken,

    #[error("Invalid X-Notion-Automations-Token")]
    InvalidToken,
}

/// Checks a provided token against the expected one.
///
/// A missing or blank token is [`AuthError::MissingToken`]; anything else that
/// differs from `expected` after trimming is [`AuthError::InvalidToken`].
pub fn check_token(expected: &str, provided: Option<&str>) -> Result<(), AuthError> {
    let provided = provided
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingToken)?;

    if bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
        Ok(())
    } else {
        Err(AuthError::InvalidToken)
    }
}
