//! Quote sources.

use crate::PriceError;
use async_trait::async_trait;
use serde_json::Value;
use tipper_config::{PriceEndpoint, PricingConfig};
use tipper_types::PriceQuote;
use tracing::{debug, info};

/// Fetches one complete price quote.
///
/// Any failed lookup fails the whole quote.
#[async_trait]
pub trait PriceSource: Send + Sync {
	async fn fetch_quote(&self) -> Result<PriceQuote, PriceError>;
}

/// Quote source backed by three JSON HTTP endpoints.
pub struct HttpPriceSource {
	client: reqwest::Client,
	base_token: PriceEndpoint,
	oracle_token: PriceEndpoint,
	gas_price: PriceEndpoint,
}

impl HttpPriceSource {
	pub fn new(base_token: PriceEndpoint, oracle_token: PriceEndpoint, gas_price: PriceEndpoint) -> Self {
		Self {
			client: reqwest::Client::new(),
			base_token,
			oracle_token,
			gas_price,
		}
	}

	pub fn from_config(config: &PricingConfig) -> Self {
		Self::new(
			config.base_token.clone(),
			config.oracle_token.clone(),
			config.gas_price.clone(),
		)
	}

	async fn fetch_value(&self, endpoint: &PriceEndpoint) -> Result<f64, PriceError> {
		debug!(source = %endpoint.name, url = %endpoint.url, "Fetching quote");

		let http_error = |e: reqwest::Error| PriceError::Http {
			source_name: endpoint.name.clone(),
			reason: e.to_string(),
		};

		let body: Value = self
			.client
			.get(&endpoint.url)
			.send()
			.await
			.map_err(http_error)?
			.error_for_status()
			.map_err(http_error)?
			.json()
			.await
			.map_err(http_error)?;

		let value = body
			.pointer(&endpoint.selector)
			.ok_or_else(|| PriceError::MissingField {
				source_name: endpoint.name.clone(),
				selector: endpoint.selector.clone(),
			})?;

		parse_price(&endpoint.name, value)
	}
}

#[async_trait]
impl PriceSource for HttpPriceSource {
	async fn fetch_quote(&self) -> Result<PriceQuote, PriceError> {
		let base_token_price_usd = self.fetch_value(&self.base_token).await?;
		info!(price = base_token_price_usd, "{} price (usd)", self.base_token.name);

		let oracle_token_price_usd = self.fetch_value(&self.oracle_token).await?;
		info!(price = oracle_token_price_usd, "{} price (usd)", self.oracle_token.name);

		let fee_price_gwei = self.fetch_value(&self.gas_price).await?;
		info!(price = fee_price_gwei, "gas price (gwei)");

		Ok(PriceQuote {
			base_token_price_usd,
			oracle_token_price_usd,
			fee_price_gwei,
		})
	}
}

/// Accepts JSON numbers and numeric strings; gas oracles quote as strings.
fn parse_price(source_name: &str, value: &Value) -> Result<f64, PriceError> {
	let invalid = || PriceError::InvalidNumber {
		source_name: source_name.to_string(),
		value: value.to_string(),
	};

	let price = match value {
		Value::Number(n) => n.as_f64().ok_or_else(invalid)?,
		Value::String(s) => s.trim().parse::<f64>().map_err(|_| invalid())?,
		_ => return Err(invalid()),
	};

	if !price.is_finite() || price < 0.0 {
		return Err(invalid());
	}

	Ok(price)
}
