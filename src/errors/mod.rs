//! Error types for the Mode API client.
//!
//! Every failure surfaced by this crate is a [`ModeApiError`]. The taxonomy
//! mirrors the API boundary: payload problems are `Validation`, credential
//! problems are `Authentication`, non-2xx outcomes are `Api`, and transport
//! failures are `Network`. Errors are never swallowed and never retried
//! silently, except for the single 401 retry performed by the dispatcher.

use thiserror::Error;

/// Type alias for Result using our error type.
pub type Result<T> = std::result::Result<T, ModeApiError>;

/// Errors raised by client operations.
#[derive(Error, Debug)]
pub enum ModeApiError {
    /// A payload field was malformed or violated a model invariant.
    /// Carries the offending field name and the rejected raw value.
    #[error("validation failed for `{field}`: {message} (rejected value: {value})")]
    Validation {
        /// Name of the offending field, qualified with its batch index
        /// when the failure occurred inside a collection.
        field: String,
        /// The rejected raw value, rendered as text.
        value: String,
        /// Description of the violated rule.
        message: String,
    },

    /// Credentials were rejected, the login response was malformed, or a
    /// request still returned 401 after the one re-authentication retry.
    #[error("authentication failed: {message}")]
    Authentication {
        /// Server-provided reason when available.
        message: String,
    },

    /// The server answered with a non-2xx status outside the auth flow.
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status code returned by the server.
        status: u16,
        /// Server-provided error message, or a truncated body excerpt.
        message: String,
    },

    /// Transport-level failure: host unreachable, timeout, broken stream.
    #[error("network error: {message}")]
    Network {
        /// Description of the transport failure.
        message: String,
    },
}

impl ModeApiError {
    pub(crate) fn validation(
        field: impl Into<String>,
        value: impl ToString,
        message: impl Into<String>,
    ) -> Self {
        Self::Validation {
            field: field.into(),
            value: value.to_string(),
            message: message.into(),
        }
    }

    /// Qualifies a validation error's field name with the position of the
    /// offending record inside a collection, e.g. `data_points[3].low`.
    pub(crate) fn at_index(self, collection: &str, index: usize) -> Self {
        match self {
            Self::Validation {
                field,
                value,
                message,
            } => Self::Validation {
                field: format!("{collection}[{index}].{field}"),
                value,
                message,
            },
            other => other,
        }
    }

    /// Whether an external retry could plausibly succeed.
    ///
    /// Only transport failures qualify. Validation and authentication
    /// failures are terminal, and the client deliberately applies no retry
    /// policy to `Api` errors; callers may wrap their own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

/// Error body shape used by the server: `{"error": ..., "message": ...}`.
#[derive(Debug, serde::Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Extracts a human-readable message from a server error body, if the body
/// parses as the conventional error shape.
pub(crate) fn server_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .filter(|m| !m.is_empty())
}

pub(crate) fn truncate_body(body: &str) -> String {
    body.chars().take(200).collect()
}

/// Builds an [`ModeApiError::Api`] from a non-2xx response.
pub(crate) fn api_error(status: u16, body: &str) -> ModeApiError {
    let message = server_message(body).unwrap_or_else(|| truncate_body(body));
    ModeApiError::Api { status, message }
}
