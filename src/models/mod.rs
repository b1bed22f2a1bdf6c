//! Validated data models.
//!
//! Each entity has a raw wire-shape counterpart (`Raw*`, crate-private) that
//! derives `Deserialize`; validated entities are only reachable through
//! constructors that enforce their invariants, and are immutable afterwards.

mod asset;
mod historical;
mod quote;
mod timestamp;

pub use asset::{Asset, AssetDetails, AssetType, StockDetails};
pub use historical::{HistoricalDataPoint, HistoricalDataResponse};
pub use quote::{Quote, QuoteResponse};
pub use timestamp::{normalize_symbol, parse_timestamp};

pub(crate) use asset::RawAsset;
pub(crate) use historical::RawHistoricalDataResponse;
pub(crate) use quote::RawQuoteResponse;
