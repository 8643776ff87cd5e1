//! Tip sizing.
//!
//! ```text
//! gas_cost_oracle = fee_gwei × gas_units × base_usd / oracle_usd / 1e9
//! requirement     = (gas_cost_oracle + margin_usd / oracle_usd) × multiplier^attempt
//! ```
//!
//! All intermediate math is `f64`; conversion to wei happens at the point of
//! comparison via `TipRequirement::to_wei`.

use crate::PriceFeed;
use tipper_config::TipConfig;
use tipper_types::{PriceQuote, TipRequirement};
use tracing::{error, info};

const GWEI_PER_TOKEN: f64 = 1e9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TipParameters {
	/// Gas for a reporter to submit a value and claim the tip.
	pub total_gas_units: u64,
	pub profit_margin_usd: f64,
	pub multiplier: f64,
}

impl From<&TipConfig> for TipParameters {
	fn from(config: &TipConfig) -> Self {
		Self {
			total_gas_units: config.total_gas_units,
			profit_margin_usd: config.profit_margin_usd,
			multiplier: config.multiplier,
		}
	}
}

pub struct TipCalculator {
	params: TipParameters,
}

impl TipCalculator {
	pub fn new(params: TipParameters) -> Self {
		Self { params }
	}

	pub fn gas_cost_usd(&self, quote: &PriceQuote) -> f64 {
		self.params.total_gas_units as f64 * quote.fee_price_gwei * quote.base_token_price_usd
			/ GWEI_PER_TOKEN
	}

	/// Gas cost expressed in oracle tokens. Zero when the quote is unavailable.
	pub fn gas_cost_in_oracle_token(&self, quote: &PriceQuote) -> f64 {
		if !quote.is_available() {
			return 0.0;
		}
		quote.fee_price_gwei * self.params.total_gas_units as f64 * quote.base_token_price_usd
			/ quote.oracle_token_price_usd
			/ GWEI_PER_TOKEN
	}

	/// Requirement for `attempt_index` given an already fetched quote.
	pub fn required_tip(&self, quote: &PriceQuote, attempt_index: u32) -> TipRequirement {
		if !quote.is_available() {
			return TipRequirement::unavailable();
		}

		let gas_cost_oracle_token = self.gas_cost_in_oracle_token(quote);
		let base_requirement =
			gas_cost_oracle_token + self.params.profit_margin_usd / quote.oracle_token_price_usd;
		let escalation = self.params.multiplier.powi(attempt_index as i32);

		TipRequirement::new(base_requirement * escalation)
	}

	/// Fetches prices (with retry) and computes the requirement.
	///
	/// Returns `TipRequirement::unavailable()` when prices could not be fetched.
	pub async fn compute_required_tip(&self, feed: &PriceFeed, attempt_index: u32) -> TipRequirement {
		let quote = feed.fetch_prices_with_retry().await;

		let requirement = self.required_tip(&quote, attempt_index);
		if requirement.is_unavailable() {
			error!("Could not compute required tip: prices unavailable");
			return requirement;
		}

		info!(
			gas_cost_usd = self.gas_cost_usd(&quote),
			gas_cost_oracle_token = self.gas_cost_in_oracle_token(&quote),
			profit_margin_usd = self.params.profit_margin_usd,
			oracle_token_price_usd = quote.oracle_token_price_usd,
			tip_multiplier = self.params.multiplier,
			attempt_index,
			required_tip = requirement.tokens(),
			"Computed required tip"
		);

		requirement
	}
}
