//! Typed async client for the Mode Trading API.
//!
//! This crate handles authentication and provides typed access to the
//! market data and asset reference endpoints. Responses are validated at
//! the API boundary: a value either becomes a canonical entity or the call
//! fails with a typed error — partial or inconsistent data never reaches
//! the caller.
//!
//! # Architecture
//!
//! ```text
//! +------------------+      +------------------+
//! |  ModeApiClient   | ---> |  Authenticator   |  (token lifecycle)
//! +------------------+      +------------------+
//!          |                         |
//!          v                         v
//! +------------------+      +------------------+
//! |  HttpTransport   | <--- |   login exchange |
//! +------------------+      +------------------+
//!          |
//!          v
//! +------------------+
//! | models (validate)|  -> Quote / HistoricalDataResponse / Asset
//! +------------------+
//! ```
//!
//! # Core types
//!
//! - [`ModeApiClient`] - the client: dispatch, 401 recovery, endpoints
//! - [`Authenticator`] / [`AuthToken`] - credential exchange and token cache
//! - [`Quote`], [`HistoricalDataResponse`], [`Asset`] - validated entities
//! - [`ModeApiError`] - the error taxonomy all operations surface
//!
//! # Example
//!
//! ```ignore
//! use mode_api_client::{ClientConfig, Interval, ModeApiClient};
//!
//! let config = ClientConfig::new("user@example.com", "password")?
//!     .with_base_url("https://api.mode.example");
//! let client = ModeApiClient::new(config)?;
//!
//! let quotes = client.get_quotes(&["AAPL", "GOOG"]).await?;
//! if let Some(quote) = quotes.get("AAPL") {
//!     println!("mid: {:?}, spread: {:?}", quote.mid_price(), quote.spread());
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod models;
pub mod transport;

pub use auth::{AuthToken, Authenticator};
pub use client::{Interval, ModeApiClient};
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use errors::{ModeApiError, Result};
pub use models::{
    Asset, AssetDetails, AssetType, HistoricalDataPoint, HistoricalDataResponse, Quote,
    QuoteResponse, StockDetails,
};
pub use transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
