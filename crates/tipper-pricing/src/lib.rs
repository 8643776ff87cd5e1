//! Price discovery and tip sizing.
//!
//! Prices come from three independent HTTP quote sources (settlement token,
//! oracle token, network gas price). `PriceFeed` retries the whole fetch with
//! exponential backoff while the oracle token price is unavailable, and
//! `TipCalculator` turns a quote into the oracle-token amount a reporter needs
//! to cover gas plus a fixed USD margin.

use thiserror::Error;

pub mod calculator;
pub mod feed;
pub mod source;

pub use calculator::{TipCalculator, TipParameters};
pub use feed::{PriceFeed, RetrySchedule};
pub use source::{HttpPriceSource, PriceSource};

/// Failure of a single quote lookup.
#[derive(Debug, Error)]
pub enum PriceError {
	#[error("HTTP request to {source_name} failed: {reason}")]
	Http { source_name: String, reason: String },

	#[error("{source_name} response has no value at {selector}")]
	MissingField {
		source_name: String,
		selector: String,
	},

	#[error("{source_name} returned a non-numeric price: {value}")]
	InvalidNumber { source_name: String, value: String },
}
