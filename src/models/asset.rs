//! Asset reference data.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ModeApiError, Result};

use super::timestamp::{normalize_symbol, parse_timestamp};

/// Classification of financial instruments.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AssetType {
    Stock,
    Etf,
    Option,
    Future,
    Index,
    Forex,
    Crypto,
    /// Catch-all for types this client does not know yet.
    #[default]
    #[serde(other)]
    Unknown,
}

/// Stock-specific reference fields.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct StockDetails {
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
}

/// Typed detail payload, dispatched on the asset type.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AssetDetails {
    Stock(StockDetails),
    /// Raw detail object for asset types without a typed model.
    Other(Value),
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawAsset {
    symbol: String,
    #[serde(alias = "assetType")]
    asset_type: AssetType,
    name: String,
    #[serde(default)]
    exchange: Option<String>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    identifiers: Option<HashMap<String, String>>,
    #[serde(default)]
    details: Option<Value>,
    #[serde(alias = "lastUpdated")]
    last_updated: Value,
}

/// Validated reference data for a tradable instrument.
///
/// Invariant: the symbol is non-empty and uppercase after construction.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Asset {
    symbol: String,
    asset_type: AssetType,
    name: String,
    exchange: Option<String>,
    currency: Option<String>,
    description: Option<String>,
    status: Option<String>,
    identifiers: Option<HashMap<String, String>>,
    details: Option<AssetDetails>,
    last_updated: DateTime<Utc>,
}

impl Asset {
    pub(crate) fn from_raw(raw: RawAsset) -> Result<Self> {
        let symbol = normalize_symbol(&raw.symbol)?;
        let last_updated = parse_timestamp("last_updated", &raw.last_updated)?;

        let details = match raw.details {
            None | Some(Value::Null) => None,
            Some(value) => Some(match (raw.asset_type, value.is_object()) {
                (AssetType::Stock, true) => {
                    let details: StockDetails =
                        serde_json::from_value(value.clone()).map_err(|e| {
                            ModeApiError::validation(
                                "details",
                                value,
                                format!("malformed stock details: {e}"),
                            )
                        })?;
                    AssetDetails::Stock(details)
                }
                _ => AssetDetails::Other(value),
            }),
        };

        Ok(Self {
            symbol,
            asset_type: raw.asset_type,
            name: raw.name,
            exchange: raw.exchange,
            currency: raw.currency,
            description: raw.description,
            status: raw.status,
            identifiers: raw.identifiers,
            details,
            last_updated,
        })
    }

    /// Uppercase ticker symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn asset_type(&self) -> AssetType {
        self.asset_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn exchange(&self) -> Option<&str> {
        self.exchange.as_deref()
    }

    pub fn currency(&self) -> Option<&str> {
        self.currency.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// External identifier map (ISIN, CUSIP, FIGI, ...).
    pub fn identifiers(&self) -> Option<&HashMap<String, String>> {
        self.identifiers.as_ref()
    }

    pub fn details(&self) -> Option<&AssetDetails> {
        self.details.as_ref()
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawAsset {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_stock_details_typed() {
        let asset = Asset::from_raw(raw(json!({
            "symbol": "aapl",
            "assetType": "STOCK",
            "name": "Apple Inc.",
            "exchange": "NASDAQ",
            "currency": "USD",
            "details": {"sector": "Technology", "industry": "Consumer Electronics"},
            "lastUpdated": "2023-01-02T00:00:00Z"
        })))
        .unwrap();

        assert_eq!(asset.symbol(), "AAPL");
        assert_eq!(asset.asset_type(), AssetType::Stock);
        match asset.details() {
            Some(AssetDetails::Stock(details)) => {
                assert_eq!(details.sector.as_deref(), Some("Technology"));
                assert_eq!(details.industry.as_deref(), Some("Consumer Electronics"));
            }
            other => panic!("unexpected details: {other:?}"),
        }
    }

    #[test]
    fn test_non_stock_details_kept_raw() {
        let asset = Asset::from_raw(raw(json!({
            "symbol": "BTC-USD",
            "assetType": "CRYPTO",
            "name": "Bitcoin",
            "details": {"network": "bitcoin"},
            "lastUpdated": "2023-01-02"
        })))
        .unwrap();

        match asset.details() {
            Some(AssetDetails::Other(value)) => {
                assert_eq!(value["network"], "bitcoin");
            }
            other => panic!("unexpected details: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_asset_type_tolerated() {
        let asset = Asset::from_raw(raw(json!({
            "symbol": "XYZ",
            "assetType": "WARRANT",
            "name": "Some Warrant",
            "lastUpdated": 1672617600
        })))
        .unwrap();

        assert_eq!(asset.asset_type(), AssetType::Unknown);
        assert!(asset.details().is_none());
    }

    #[test]
    fn test_empty_symbol_rejected() {
        let result = Asset::from_raw(raw(json!({
            "symbol": "  ",
            "assetType": "ETF",
            "name": "Broken",
            "lastUpdated": "2023-01-02T00:00:00Z"
        })));
        assert!(matches!(result, Err(ModeApiError::Validation { .. })));
    }

    #[test]
    fn test_malformed_last_updated_rejected() {
        let result = Asset::from_raw(raw(json!({
            "symbol": "AAPL",
            "assetType": "STOCK",
            "name": "Apple Inc.",
            "lastUpdated": "yesterday"
        })));
        match result {
            Err(ModeApiError::Validation { field, .. }) => assert_eq!(field, "last_updated"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
