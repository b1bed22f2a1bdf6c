//! Historical OHLCV bars.
//!
//! Raw payloads are deserialized into loose `Raw*` structs, then promoted to
//! validated entities. Validation happens at construction; there is no way
//! to obtain an entity that violates its invariants.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ModeApiError, Result};

use super::timestamp::{normalize_symbol, parse_timestamp};

#[derive(Debug, Deserialize)]
pub(crate) struct RawHistoricalDataPoint {
    timestamp: Value,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: Decimal,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawHistoricalDataResponse {
    symbol: String,
    #[serde(alias = "dataPoints")]
    data_points: Vec<RawHistoricalDataPoint>,
}

/// One validated OHLCV observation.
///
/// Invariants, enforced at construction:
/// - all five fields are non-negative
/// - `low` is the minimum and `high` the maximum of the four price fields
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistoricalDataPoint {
    timestamp: DateTime<Utc>,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: Decimal,
}

impl HistoricalDataPoint {
    /// Builds a validated data point.
    ///
    /// # Errors
    ///
    /// Returns [`ModeApiError::Validation`] naming the offending field if any
    /// value is negative or the OHLC ordering invariant is violated.
    pub fn new(
        timestamp: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Result<Self> {
        for (field, value) in [
            ("open", open),
            ("high", high),
            ("low", low),
            ("close", close),
            ("volume", volume),
        ] {
            if value < Decimal::ZERO {
                return Err(ModeApiError::validation(field, value, "must be non-negative"));
            }
        }

        if low > high {
            return Err(ModeApiError::validation(
                "low",
                low,
                format!("low exceeds high ({high})"),
            ));
        }
        if open < low || open > high {
            return Err(ModeApiError::validation(
                "open",
                open,
                format!("open outside low/high range ({low}..{high})"),
            ));
        }
        if close < low || close > high {
            return Err(ModeApiError::validation(
                "close",
                close,
                format!("close outside low/high range ({low}..{high})"),
            ));
        }

        Ok(Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        })
    }

    pub(crate) fn from_raw(raw: RawHistoricalDataPoint) -> Result<Self> {
        let timestamp = parse_timestamp("timestamp", &raw.timestamp)?;
        Self::new(timestamp, raw.open, raw.high, raw.low, raw.close, raw.volume)
    }

    /// Observation instant, in UTC.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn open(&self) -> Decimal {
        self.open
    }

    pub fn high(&self) -> Decimal {
        self.high
    }

    pub fn low(&self) -> Decimal {
        self.low
    }

    pub fn close(&self) -> Decimal {
        self.close
    }

    pub fn volume(&self) -> Decimal {
        self.volume
    }
}

/// A validated historical data response: symbol plus bars in server order.
///
/// The sequence is kept exactly as returned (timestamp ascending per the API
/// contract); it is not re-sorted client-side.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistoricalDataResponse {
    symbol: String,
    data_points: Vec<HistoricalDataPoint>,
}

impl HistoricalDataResponse {
    /// Promotes a raw response to a validated one.
    ///
    /// Batch policy: the whole response is rejected on the first invalid
    /// point, so partial or inconsistent series never reach the caller. The
    /// error's field name carries the index of the offending point.
    pub(crate) fn from_raw(raw: RawHistoricalDataResponse) -> Result<Self> {
        let symbol = normalize_symbol(&raw.symbol)?;

        let mut data_points = Vec::with_capacity(raw.data_points.len());
        for (index, raw_point) in raw.data_points.into_iter().enumerate() {
            let point = HistoricalDataPoint::from_raw(raw_point)
                .map_err(|e| e.at_index("data_points", index))?;
            data_points.push(point);
        }

        Ok(Self {
            symbol,
            data_points,
        })
    }

    /// Uppercase symbol the series belongs to.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Bars in server order.
    pub fn data_points(&self) -> &[HistoricalDataPoint] {
        &self.data_points
    }

    pub fn len(&self) -> usize {
        self.data_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data_points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_valid_point_round_trips() {
        let point = HistoricalDataPoint::new(
            ts(),
            dec!(148.00),
            dec!(152.00),
            dec!(147.50),
            dec!(150.25),
            dec!(1000000),
        )
        .unwrap();

        assert_eq!(point.timestamp(), ts());
        assert_eq!(point.open(), dec!(148.00));
        assert_eq!(point.high(), dec!(152.00));
        assert_eq!(point.low(), dec!(147.50));
        assert_eq!(point.close(), dec!(150.25));
        assert_eq!(point.volume(), dec!(1000000));
    }

    #[test]
    fn test_low_above_high_rejected() {
        let result = HistoricalDataPoint::new(
            ts(),
            dec!(95),
            dec!(90),
            dec!(95),
            dec!(92),
            dec!(100),
        );
        assert!(matches!(result, Err(ModeApiError::Validation { .. })));
    }

    #[test]
    fn test_negative_field_rejected() {
        let result = HistoricalDataPoint::new(
            ts(),
            dec!(100),
            dec!(105),
            dec!(-1),
            dec!(102),
            dec!(100),
        );
        match result {
            Err(ModeApiError::Validation { field, .. }) => assert_eq!(field, "low"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_negative_volume_rejected() {
        let result = HistoricalDataPoint::new(
            ts(),
            dec!(100),
            dec!(105),
            dec!(95),
            dec!(102),
            dec!(-10),
        );
        match result {
            Err(ModeApiError::Validation { field, .. }) => assert_eq!(field, "volume"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_open_outside_range_rejected() {
        let result = HistoricalDataPoint::new(
            ts(),
            dec!(110),
            dec!(105),
            dec!(95),
            dec!(102),
            dec!(100),
        );
        match result {
            Err(ModeApiError::Validation { field, .. }) => assert_eq!(field, "open"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_close_outside_range_rejected() {
        let result = HistoricalDataPoint::new(
            ts(),
            dec!(100),
            dec!(105),
            dec!(95),
            dec!(94),
            dec!(100),
        );
        match result {
            Err(ModeApiError::Validation { field, .. }) => assert_eq!(field, "close"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_flat_bar_is_valid() {
        // Zero-range bars occur on illiquid symbols.
        let point = HistoricalDataPoint::new(
            ts(),
            dec!(100),
            dec!(100),
            dec!(100),
            dec!(100),
            dec!(0),
        );
        assert!(point.is_ok());
    }

    #[test]
    fn test_response_symbol_normalized_and_order_kept() {
        let raw: RawHistoricalDataResponse = serde_json::from_value(serde_json::json!({
            "symbol": "aapl",
            "dataPoints": [
                {"timestamp": "2023-01-03", "open": 130.28, "high": 130.90,
                 "low": 124.17, "close": 125.07, "volume": 112117500},
                {"timestamp": "2023-01-04", "open": 126.89, "high": 128.66,
                 "low": 125.08, "close": 126.36, "volume": 89113600}
            ]
        }))
        .unwrap();

        let response = HistoricalDataResponse::from_raw(raw).unwrap();
        assert_eq!(response.symbol(), "AAPL");
        assert_eq!(response.len(), 2);
        assert!(response.data_points()[0].timestamp() < response.data_points()[1].timestamp());
    }

    #[test]
    fn test_one_bad_point_rejects_whole_response() {
        let raw: RawHistoricalDataResponse = serde_json::from_value(serde_json::json!({
            "symbol": "AAPL",
            "data_points": [
                {"timestamp": "2023-01-03", "open": 130.28, "high": 130.90,
                 "low": 124.17, "close": 125.07, "volume": 112117500},
                {"timestamp": "2023-01-04", "open": 126.89, "high": 120.00,
                 "low": 125.08, "close": 126.36, "volume": 89113600}
            ]
        }))
        .unwrap();

        let error = HistoricalDataResponse::from_raw(raw).unwrap_err();
        match error {
            ModeApiError::Validation { field, .. } => {
                assert!(field.starts_with("data_points[1]."), "field was {field}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_series_is_valid() {
        let raw: RawHistoricalDataResponse = serde_json::from_value(serde_json::json!({
            "symbol": "AAPL",
            "data_points": []
        }))
        .unwrap();

        let response = HistoricalDataResponse::from_raw(raw).unwrap();
        assert!(response.is_empty());
    }
}
