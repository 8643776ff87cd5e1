//! Gas pricing strategies.
//!
//! - `EstimatedGas`: gas limit from `eth_estimateGas`, fees filled at send time
//! - `LegacyGasPrice`: the network's suggested gas price with a percentage markup
//!   and a fixed gas limit, so nothing is estimated
//! - `Fallback`: tries one strategy and switches to another if it fails

use alloy::primitives::{Address, Bytes};
use async_trait::async_trait;
use tipper_types::{ChainAdapter, ChainError, GasParams};
use tracing::{debug, warn};

/// Decides the gas parameters of a transaction before it is signed.
#[async_trait]
pub trait GasStrategy: Send + Sync {
	/// Short name used in log lines.
	fn name(&self) -> &'static str;

	async fn gas_params(
		&self,
		chain: &dyn ChainAdapter,
		from: Address,
		to: Address,
		data: &Bytes,
	) -> Result<GasParams, ChainError>;
}

pub struct EstimatedGas;

#[async_trait]
impl GasStrategy for EstimatedGas {
	fn name(&self) -> &'static str {
		"estimated"
	}

	async fn gas_params(
		&self,
		chain: &dyn ChainAdapter,
		from: Address,
		to: Address,
		data: &Bytes,
	) -> Result<GasParams, ChainError> {
		let gas_limit = chain.estimate_gas(from, to, data.clone()).await?;
		debug!(gas_limit, "Estimated gas");
		Ok(GasParams::Estimated { gas_limit })
	}
}

/// Legacy pricing at `markup_percent` of the suggested gas price, sent with
/// a fixed `gas_limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyGasPrice {
	markup_percent: u64,
	gas_limit: u64,
}

impl LegacyGasPrice {
	pub fn new(markup_percent: u64, gas_limit: u64) -> Self {
		Self {
			markup_percent,
			gas_limit,
		}
	}

	/// The suggested gas price, unchanged.
	pub fn network(gas_limit: u64) -> Self {
		Self::new(100, gas_limit)
	}

	pub fn apply(&self, gas_price: u128) -> u128 {
		gas_price.saturating_mul(self.markup_percent as u128) / 100
	}
}

#[async_trait]
impl GasStrategy for LegacyGasPrice {
	fn name(&self) -> &'static str {
		"legacy"
	}

	async fn gas_params(
		&self,
		chain: &dyn ChainAdapter,
		_from: Address,
		_to: Address,
		_data: &Bytes,
	) -> Result<GasParams, ChainError> {
		let suggested = chain.gas_price().await?;
		let gas_price = self.apply(suggested);
		debug!(
			suggested,
			gas_price,
			markup_percent = self.markup_percent,
			gas_limit = self.gas_limit,
			"Priced legacy transaction"
		);
		Ok(GasParams::Legacy {
			gas_price,
			gas_limit: self.gas_limit,
		})
	}
}

/// Uses `primary`, switching to `secondary` when `primary` fails.
pub struct Fallback<P, S> {
	primary: P,
	secondary: S,
}

impl<P: GasStrategy, S: GasStrategy> Fallback<P, S> {
	pub fn new(primary: P, secondary: S) -> Self {
		Self { primary, secondary }
	}
}

impl Fallback<EstimatedGas, LegacyGasPrice> {
	/// Estimation first, legacy pricing at the suggested gas price with
	/// `legacy_gas_limit` otherwise.
	pub fn estimate_or_legacy(legacy_gas_limit: u64) -> Self {
		Self::new(EstimatedGas, LegacyGasPrice::network(legacy_gas_limit))
	}
}

#[async_trait]
impl<P: GasStrategy, S: GasStrategy> GasStrategy for Fallback<P, S> {
	fn name(&self) -> &'static str {
		"fallback"
	}

	async fn gas_params(
		&self,
		chain: &dyn ChainAdapter,
		from: Address,
		to: Address,
		data: &Bytes,
	) -> Result<GasParams, ChainError> {
		match self.primary.gas_params(chain, from, to, data).await {
			Ok(params) => Ok(params),
			Err(e) => {
				warn!(
					error = %e,
					primary = self.primary.name(),
					secondary = self.secondary.name(),
					"Gas strategy failed, falling back"
				);
				self.secondary.gas_params(chain, from, to, data).await
			}
		}
	}
}
