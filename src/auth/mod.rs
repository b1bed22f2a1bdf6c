//! Authentication and token lifecycle.
//!
//! The [`Authenticator`] owns the cached bearer token and is the only
//! component that ever sees credentials or token secrets. Resource callers
//! never receive an [`AuthToken`]; the dispatcher asks for a valid secret
//! per request via [`Authenticator::ensure_token`].

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::config::ClientConfig;
use crate::errors::{api_error, server_message, ModeApiError, Result};
use crate::models::parse_timestamp;
use crate::transport::{HttpRequest, HttpTransport};

#[derive(Debug, Deserialize)]
struct RawLoginResponse {
    token: String,
    #[serde(alias = "expiresAt")]
    expires_at: Value,
}

/// An opaque bearer credential with its expiry instant.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken {
    secret: String,
    expires_at: DateTime<Utc>,
}

impl AuthToken {
    fn from_raw(raw: RawLoginResponse) -> Result<Self> {
        let secret = raw.token.trim().to_string();
        if secret.is_empty() {
            return Err(ModeApiError::Authentication {
                message: "login response carried an empty token".to_string(),
            });
        }

        let expires_at =
            parse_timestamp("expires_at", &raw.expires_at).map_err(|e| {
                ModeApiError::Authentication {
                    message: format!("malformed login response: {e}"),
                }
            })?;

        Ok(Self { secret, expires_at })
    }

    /// The bearer secret. Guarded by the authenticator; handle with care.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Expiry instant as stated by the server.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// True when the expiry is at or before `now`. No client-side grace skew
    /// beyond what the server states.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("secret", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Manages the credential exchange and the in-memory token cache.
///
/// Explicitly owned by its client (no process-wide state), so multiple
/// clients with different credentials coexist safely. The token lives in
/// memory only; nothing is persisted.
pub struct Authenticator {
    config: ClientConfig,
    transport: Arc<dyn HttpTransport>,
    token: Mutex<Option<AuthToken>>,
}

impl Authenticator {
    pub fn new(config: ClientConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            config,
            transport,
            token: Mutex::new(None),
        }
    }

    /// Returns a currently valid bearer secret, logging in first if no token
    /// is cached or the cached one has expired.
    ///
    /// The cache lock is held across the login exchange, so at most one
    /// login call is ever outstanding; concurrent callers await its result
    /// instead of issuing their own.
    pub async fn ensure_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if !token.is_expired(Utc::now()) {
                return Ok(token.secret().to_string());
            }
            debug!(
                "[ModeApi] cached token expired at {}, re-authenticating",
                token.expires_at()
            );
        }

        let token = self.login().await?;
        let secret = token.secret().to_string();
        *cached = Some(token);
        Ok(secret)
    }

    /// Drops the cached token, forcing the next [`ensure_token`] call to
    /// re-authenticate. Used by the dispatcher after observing a 401 on an
    /// otherwise valid-looking token.
    ///
    /// [`ensure_token`]: Self::ensure_token
    pub async fn invalidate(&self) {
        let mut cached = self.token.lock().await;
        if cached.take().is_some() {
            debug!("[ModeApi] cached token invalidated");
        }
    }

    async fn login(&self) -> Result<AuthToken> {
        let url = format!("{}/api/v1/auth/login", self.config.base_url());
        debug!("[ModeApi] POST {} ({})", url, self.config.email());

        let request = HttpRequest::post(url).with_json(json!({
            "email": self.config.email(),
            "password": self.config.password(),
        }));

        let response = self.transport.execute(&request).await?;

        if (400..500).contains(&response.status) {
            let message = server_message(&response.body)
                .unwrap_or_else(|| format!("credentials rejected (HTTP {})", response.status));
            return Err(ModeApiError::Authentication { message });
        }
        if !response.is_success() {
            return Err(api_error(response.status, &response.body));
        }

        let raw: RawLoginResponse =
            serde_json::from_str(&response.body).map_err(|e| ModeApiError::Authentication {
                message: format!("malformed login response: {e}"),
            })?;

        let token = AuthToken::from_raw(raw)?;
        info!(
            "[ModeApi] authenticated, token valid until {}",
            token.expires_at()
        );
        Ok(token)
    }
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("config", &self.config)
            .finish()
    }
}
