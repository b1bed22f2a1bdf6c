//! The Mode API client: request dispatch and resource endpoints.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use log::{debug, warn};
use serde::de::DeserializeOwned;

use crate::auth::Authenticator;
use crate::config::ClientConfig;
use crate::errors::{api_error, truncate_body, ModeApiError, Result};
use crate::models::{
    normalize_symbol, Asset, HistoricalDataResponse, QuoteResponse, RawAsset,
    RawHistoricalDataResponse, RawQuoteResponse,
};
use crate::transport::{HttpRequest, HttpTransport, ReqwestTransport, DEFAULT_TIMEOUT};

/// Supported bar intervals for historical data.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Interval {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
    Hourly,
    Daily,
    Weekly,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneMinute => "1min",
            Self::FiveMinutes => "5min",
            Self::FifteenMinutes => "15min",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed client for the Mode Trading API.
///
/// Owns its [`Authenticator`], so multiple clients with different
/// credentials coexist safely. Every resource method performs exactly one
/// logical attempt, plus at most the single re-authentication retry on 401.
///
/// # Example
///
/// ```ignore
/// let client = ModeApiClient::from_env()?;
/// let quotes = client.get_quotes(&["AAPL", "GOOG"]).await?;
/// let bars = client
///     .get_historical_data("aapl", start, end, Interval::Daily)
///     .await?;
/// ```
pub struct ModeApiClient {
    config: ClientConfig,
    transport: Arc<dyn HttpTransport>,
    auth: Authenticator,
}

impl ModeApiClient {
    /// Creates a client over the production reqwest transport.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new(DEFAULT_TIMEOUT)?);
        Ok(Self::with_transport(config, transport))
    }

    /// Creates a client configured from the `MODE_API_*` environment
    /// variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Creates a client over a caller-supplied transport. The seam used by
    /// tests; also allows instrumented transports in production.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let auth = Authenticator::new(config.clone(), Arc::clone(&transport));
        Self {
            config,
            transport,
            auth,
        }
    }

    /// Fetches real-time quotes for the given symbols.
    ///
    /// An empty symbol list short-circuits to an empty response without
    /// touching the network.
    pub async fn get_quotes<S: AsRef<str>>(&self, symbols: &[S]) -> Result<QuoteResponse> {
        if symbols.is_empty() {
            return Ok(QuoteResponse::empty());
        }

        let mut normalized = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            normalized.push(normalize_symbol(symbol.as_ref())?);
        }

        let url = format!(
            "{}/api/v1/market-data/quotes?symbols={}",
            self.config.base_url(),
            normalized.join(",")
        );

        let raw: RawQuoteResponse = self.dispatch(HttpRequest::get(url)).await?;
        QuoteResponse::from_raw(raw)
    }

    /// Fetches historical OHLCV bars for one symbol over a date range.
    pub async fn get_historical_data(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<HistoricalDataResponse> {
        let symbol = normalize_symbol(symbol)?;
        let url = format!(
            "{}/api/v1/market-data/historical/{}?startTime={}&endTime={}&interval={}",
            self.config.base_url(),
            symbol,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d"),
            interval.as_str()
        );

        let raw: RawHistoricalDataResponse = self.dispatch(HttpRequest::get(url)).await?;
        HistoricalDataResponse::from_raw(raw)
    }

    /// Fetches reference data for one asset.
    pub async fn get_asset(&self, symbol: &str) -> Result<Asset> {
        let symbol = normalize_symbol(symbol)?;
        let url = format!("{}/api/v1/assets/{}", self.config.base_url(), symbol);

        let raw: RawAsset = self.dispatch(HttpRequest::get(url)).await?;
        Asset::from_raw(raw)
    }

    /// Performs one authenticated call.
    ///
    /// Two-step flow, kept explicit so the retry bound is auditable:
    /// attempt → on 401, invalidate the token and retry exactly once with a
    /// fresh one → terminal. A second 401 surfaces as
    /// [`ModeApiError::Authentication`]; any other non-2xx maps to
    /// [`ModeApiError::Api`] with no retry.
    async fn dispatch<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T> {
        debug!("[ModeApi] {:?} {}", request.method, request.url);

        let token = self.auth.ensure_token().await?;
        let mut response = self
            .transport
            .execute(&request.clone().with_bearer(token))
            .await?;

        if response.status == 401 {
            debug!(
                "[ModeApi] 401 from {}, re-authenticating and retrying once",
                request.url
            );
            self.auth.invalidate().await;
            let token = self.auth.ensure_token().await?;
            response = self
                .transport
                .execute(&request.clone().with_bearer(token))
                .await?;

            if response.status == 401 {
                return Err(ModeApiError::Authentication {
                    message: "request rejected with 401 after re-authentication".to_string(),
                });
            }
        }

        if !response.is_success() {
            warn!(
                "[ModeApi] {} answered HTTP {}",
                request.url, response.status
            );
            return Err(api_error(response.status, &response.body));
        }

        serde_json::from_str(&response.body).map_err(|e| {
            ModeApiError::validation(
                "body",
                truncate_body(&response.body),
                format!("malformed response body: {e}"),
            )
        })
    }
}

impl fmt::Debug for ModeApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModeApiClient")
            .field("config", &self.config)
            .finish()
    }
}
