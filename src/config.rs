//! Client configuration.
//!
//! Configuration comes from explicit constructor parameters or from the
//! `MODE_API_*` environment variables. The password is held in memory only
//! and redacted from `Debug` output so it can never leak into logs.

use std::env;
use std::fmt;

use crate::errors::{ModeApiError, Result};

/// Default base URL when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Environment variable overriding the base URL.
pub const ENV_BASE_URL: &str = "MODE_API_BASE_URL";
/// Environment variable providing the account email.
pub const ENV_EMAIL: &str = "MODE_API_EMAIL";
/// Environment variable providing the account password.
pub const ENV_PASSWORD: &str = "MODE_API_PASSWORD";

/// Connection settings for a [`ModeApiClient`](crate::ModeApiClient).
#[derive(Clone)]
pub struct ClientConfig {
    base_url: String,
    email: String,
    password: String,
}

impl ClientConfig {
    /// Creates a configuration with explicit credentials and the default
    /// base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ModeApiError::Authentication`] if either credential is empty.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        Self::build(DEFAULT_BASE_URL.to_string(), email.into(), password.into())
    }

    /// Loads configuration from the `MODE_API_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ModeApiError::Authentication`] if email or password are not
    /// set.
    pub fn from_env() -> Result<Self> {
        let base_url =
            env::var(ENV_BASE_URL).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let email = env::var(ENV_EMAIL).unwrap_or_default();
        let password = env::var(ENV_PASSWORD).unwrap_or_default();
        Self::build(base_url, email, password)
    }

    /// Replaces the base URL, trimming any trailing slash.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn build(base_url: String, email: String, password: String) -> Result<Self> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ModeApiError::Authentication {
                message: format!(
                    "email and password must be provided or set via {ENV_EMAIL} / {ENV_PASSWORD}"
                ),
            });
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            email,
            password,
        })
    }

    /// The configured base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The configured account email.
    pub fn email(&self) -> &str {
        &self.email
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
