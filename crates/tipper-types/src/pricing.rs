//! Price and tip values produced fresh for every decision cycle.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wei per whole token for 18-decimal tokens.
pub const WEI_PER_TOKEN: f64 = 1e18;

/// Prices fetched from the external quote sources.
///
/// An oracle token price of exactly zero means the fetch failed; it is never
/// treated as a real price.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PriceQuote {
	/// Settlement (native) token price in USD.
	pub base_token_price_usd: f64,
	/// Oracle token price in USD.
	pub oracle_token_price_usd: f64,
	/// Network fee price in gwei.
	pub fee_price_gwei: f64,
}

impl PriceQuote {
	/// The zero-priced quote returned when prices could not be fetched.
	pub fn unavailable() -> Self {
		Self::default()
	}

	pub fn is_available(&self) -> bool {
		self.oracle_token_price_usd > 0.0
	}
}

/// Amount of oracle token needed to cover gas plus the profit margin.
///
/// Zero is the "could not be computed" sentinel and must abort the cycle.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct TipRequirement(f64);

impl TipRequirement {
	pub fn new(tokens: f64) -> Self {
		Self(tokens)
	}

	pub fn unavailable() -> Self {
		Self(0.0)
	}

	pub fn is_unavailable(&self) -> bool {
		self.0 == 0.0
	}

	/// Requirement in whole tokens.
	pub fn tokens(&self) -> f64 {
		self.0
	}

	/// Requirement in wei, floored. Negative and NaN values clamp to zero.
	pub fn to_wei(&self) -> U256 {
		let wei = (self.0 * WEI_PER_TOKEN).floor();
		if wei.is_nan() || wei <= 0.0 {
			return U256::ZERO;
		}
		// `as` saturates at u128::MAX, far beyond any realistic tip.
		U256::from(wei as u128)
	}
}

impl fmt::Display for TipRequirement {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}
