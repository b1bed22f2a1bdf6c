//! Real-time quotes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ModeApiError, Result};

use super::timestamp::{normalize_symbol, parse_timestamp};

#[derive(Debug, Deserialize)]
pub(crate) struct RawQuote {
    #[serde(default)]
    symbol: Option<String>,
    price: Decimal,
    timestamp: Value,
    #[serde(default)]
    bid: Option<Decimal>,
    #[serde(default)]
    ask: Option<Decimal>,
    #[serde(default)]
    volume: Option<Decimal>,
    #[serde(default)]
    open: Option<Decimal>,
    #[serde(default)]
    change: Option<Decimal>,
    #[serde(default, alias = "changePercent")]
    change_percent: Option<Decimal>,
    #[serde(default, alias = "dayHigh")]
    day_high: Option<Decimal>,
    #[serde(default, alias = "dayLow")]
    day_low: Option<Decimal>,
    #[serde(default, alias = "previousClose")]
    previous_close: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawQuoteResponse {
    #[serde(default)]
    quotes: HashMap<String, RawQuote>,
    #[serde(default)]
    errors: HashMap<String, String>,
}

/// A validated real-time quote.
///
/// Invariants, enforced at construction: all prices are non-negative, and
/// when both sides are present `ask >= bid`. Bid and ask are independently
/// optional; one-sided books occur outside regular hours.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Quote {
    symbol: String,
    price: Decimal,
    timestamp: DateTime<Utc>,
    bid: Option<Decimal>,
    ask: Option<Decimal>,
    volume: Option<Decimal>,
    open: Option<Decimal>,
    change: Option<Decimal>,
    change_percent: Option<Decimal>,
    day_high: Option<Decimal>,
    day_low: Option<Decimal>,
    previous_close: Option<Decimal>,
}

impl Quote {
    /// Builds a validated quote from its core fields.
    ///
    /// # Errors
    ///
    /// Returns [`ModeApiError::Validation`] for an empty symbol, a negative
    /// price, or `ask < bid`.
    pub fn new(
        symbol: &str,
        price: Decimal,
        bid: Option<Decimal>,
        ask: Option<Decimal>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self> {
        let symbol = normalize_symbol(symbol)?;
        check_non_negative("price", Some(price))?;
        check_non_negative("bid", bid)?;
        check_non_negative("ask", ask)?;
        check_spread(bid, ask)?;

        Ok(Self {
            symbol,
            price,
            timestamp,
            bid,
            ask,
            volume: None,
            open: None,
            change: None,
            change_percent: None,
            day_high: None,
            day_low: None,
            previous_close: None,
        })
    }

    pub(crate) fn from_raw(key: &str, raw: RawQuote) -> Result<Self> {
        // The mapping key stands in when the quote object omits its symbol.
        let symbol = normalize_symbol(raw.symbol.as_deref().unwrap_or(key))?;
        let timestamp = parse_timestamp("timestamp", &raw.timestamp)?;

        check_non_negative("price", Some(raw.price))?;
        check_non_negative("bid", raw.bid)?;
        check_non_negative("ask", raw.ask)?;
        check_spread(raw.bid, raw.ask)?;
        check_non_negative("volume", raw.volume)?;
        check_non_negative("open", raw.open)?;
        check_non_negative("day_high", raw.day_high)?;
        check_non_negative("day_low", raw.day_low)?;
        check_non_negative("previous_close", raw.previous_close)?;

        Ok(Self {
            symbol,
            price: raw.price,
            timestamp,
            bid: raw.bid,
            ask: raw.ask,
            volume: raw.volume,
            open: raw.open,
            change: raw.change,
            change_percent: raw.change_percent,
            day_high: raw.day_high,
            day_low: raw.day_low,
            previous_close: raw.previous_close,
        })
    }

    /// Uppercase ticker symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Last trade price.
    pub fn price(&self) -> Decimal {
        self.price
    }

    /// Quote instant, in UTC.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn bid(&self) -> Option<Decimal> {
        self.bid
    }

    pub fn ask(&self) -> Option<Decimal> {
        self.ask
    }

    pub fn volume(&self) -> Option<Decimal> {
        self.volume
    }

    pub fn open(&self) -> Option<Decimal> {
        self.open
    }

    /// Absolute change since previous close; sign unconstrained.
    pub fn change(&self) -> Option<Decimal> {
        self.change
    }

    pub fn change_percent(&self) -> Option<Decimal> {
        self.change_percent
    }

    pub fn day_high(&self) -> Option<Decimal> {
        self.day_high
    }

    pub fn day_low(&self) -> Option<Decimal> {
        self.day_low
    }

    pub fn previous_close(&self) -> Option<Decimal> {
        self.previous_close
    }

    /// `(bid + ask) / 2`, when both sides are present.
    pub fn mid_price(&self) -> Option<Decimal> {
        match (self.bid, self.ask) {
            (Some(bid), Some(ask)) => Some((bid + ask) / Decimal::from(2)),
            _ => None,
        }
    }

    /// `ask - bid`, when both sides are present.
    pub fn spread(&self) -> Option<Decimal> {
        match (self.bid, self.ask) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }
}

fn check_non_negative(field: &str, value: Option<Decimal>) -> Result<()> {
    if let Some(v) = value {
        if v < Decimal::ZERO {
            return Err(ModeApiError::validation(field, v, "must be non-negative"));
        }
    }
    Ok(())
}

fn check_spread(bid: Option<Decimal>, ask: Option<Decimal>) -> Result<()> {
    if let (Some(bid), Some(ask)) = (bid, ask) {
        if ask < bid {
            return Err(ModeApiError::validation(
                "ask",
                ask,
                format!("ask is below bid ({bid})"),
            ));
        }
    }
    Ok(())
}

/// Validated quotes keyed by uppercase symbol, plus the server's per-symbol
/// error map passed through untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct QuoteResponse {
    quotes: HashMap<String, Quote>,
    errors: HashMap<String, String>,
}

impl QuoteResponse {
    /// A response with no quotes and no errors.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Promotes a raw response; any invalid quote rejects the whole response.
    pub(crate) fn from_raw(raw: RawQuoteResponse) -> Result<Self> {
        let mut quotes = HashMap::with_capacity(raw.quotes.len());
        for (key, raw_quote) in raw.quotes {
            let quote = Quote::from_raw(&key, raw_quote)?;
            quotes.insert(quote.symbol().to_string(), quote);
        }

        Ok(Self {
            quotes,
            errors: raw.errors,
        })
    }

    pub fn quotes(&self) -> &HashMap<String, Quote> {
        &self.quotes
    }

    /// Server-reported per-symbol failures (e.g. unknown symbols).
    pub fn errors(&self) -> &HashMap<String, String> {
        &self.errors
    }

    /// Looks up a quote, normalizing the symbol first.
    pub fn get(&self, symbol: &str) -> Option<&Quote> {
        self.quotes.get(&symbol.trim().to_uppercase())
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 2, 15, 30, 0).unwrap()
    }

    #[test]
    fn test_mid_price_and_spread() {
        let quote = Quote::new(
            "AAPL",
            dec!(150.10),
            Some(dec!(150.00)),
            Some(dec!(150.20)),
            ts(),
        )
        .unwrap();

        assert_eq!(quote.mid_price(), Some(dec!(150.10)));
        assert_eq!(quote.spread(), Some(dec!(0.20)));
    }

    #[test]
    fn test_one_sided_book_has_no_derived_metrics() {
        let quote = Quote::new("AAPL", dec!(150.10), Some(dec!(150.00)), None, ts()).unwrap();
        assert_eq!(quote.mid_price(), None);
        assert_eq!(quote.spread(), None);

        let quote = Quote::new("AAPL", dec!(150.10), None, None, ts()).unwrap();
        assert_eq!(quote.mid_price(), None);
        assert_eq!(quote.spread(), None);
    }

    #[test]
    fn test_crossed_quote_rejected() {
        let result = Quote::new(
            "AAPL",
            dec!(150.10),
            Some(dec!(150.20)),
            Some(dec!(150.00)),
            ts(),
        );
        match result {
            Err(ModeApiError::Validation { field, .. }) => assert_eq!(field, "ask"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_negative_bid_rejected() {
        let result = Quote::new("AAPL", dec!(150.10), Some(dec!(-1)), None, ts());
        assert!(matches!(result, Err(ModeApiError::Validation { .. })));
    }

    #[test]
    fn test_symbol_normalized() {
        let quote = Quote::new(" aapl ", dec!(1), None, None, ts()).unwrap();
        assert_eq!(quote.symbol(), "AAPL");
    }

    #[test]
    fn test_equal_bid_ask_is_valid() {
        let quote = Quote::new(
            "AAPL",
            dec!(150.00),
            Some(dec!(150.00)),
            Some(dec!(150.00)),
            ts(),
        )
        .unwrap();
        assert_eq!(quote.spread(), Some(dec!(0)));
    }

    #[test]
    fn test_response_from_raw_uses_key_as_symbol_fallback() {
        let raw: RawQuoteResponse = serde_json::from_value(serde_json::json!({
            "quotes": {
                "goog": {"price": 95.5, "bid": 95.4, "ask": 95.6,
                         "timestamp": "2023-01-02T15:30:00Z"}
            },
            "errors": {"BADSYM": "symbol not found"}
        }))
        .unwrap();

        let response = QuoteResponse::from_raw(raw).unwrap();
        assert_eq!(response.len(), 1);
        let quote = response.get("goog").unwrap();
        assert_eq!(quote.symbol(), "GOOG");
        assert_eq!(response.errors().get("BADSYM").unwrap(), "symbol not found");
    }

    #[test]
    fn test_response_rejected_on_invalid_quote() {
        let raw: RawQuoteResponse = serde_json::from_value(serde_json::json!({
            "quotes": {
                "AAPL": {"price": 150.1, "bid": 150.2, "ask": 150.0,
                         "timestamp": "2023-01-02T15:30:00Z"}
            },
            "errors": {}
        }))
        .unwrap();

        assert!(QuoteResponse::from_raw(raw).is_err());
    }

    #[test]
    fn test_descriptive_fields_parsed() {
        let raw: RawQuoteResponse = serde_json::from_value(serde_json::json!({
            "quotes": {
                "AAPL": {"symbol": "AAPL", "price": 150.1, "timestamp": 1672673400,
                         "volume": 500000, "change": -1.25, "changePercent": -0.82,
                         "dayHigh": 151.0, "dayLow": 148.5, "previousClose": 151.35}
            }
        }))
        .unwrap();

        let response = QuoteResponse::from_raw(raw).unwrap();
        let quote = response.get("AAPL").unwrap();
        assert_eq!(quote.volume(), Some(dec!(500000)));
        assert_eq!(quote.change(), Some(dec!(-1.25)));
        assert_eq!(quote.day_high(), Some(dec!(151.0)));
        assert_eq!(quote.previous_close(), Some(dec!(151.35)));
    }
}
