//! Price feed with bounded exponential-backoff retry.

use crate::PriceSource;
use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use std::time::Duration;
use tipper_config::PricingConfig;
use tipper_types::PriceQuote;
use tracing::{error, warn};

/// Retry policy for price lookups.
///
/// The wait before retry `i` (0-indexed) is `initial × 2^i` with no jitter.
/// Individual waits are only bounded by the number of retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySchedule {
	pub max_attempts: u32,
	pub initial_interval: Duration,
}

impl RetrySchedule {
	pub fn new(max_attempts: u32, initial_interval: Duration) -> Self {
		Self {
			max_attempts,
			initial_interval,
		}
	}

	pub fn from_config(config: &PricingConfig) -> Self {
		Self::new(
			config.max_attempts,
			Duration::from_secs(config.initial_backoff_secs),
		)
	}

	/// A fresh backoff sequence for one retry loop.
	pub fn backoff(&self) -> ExponentialBackoff {
		// Large enough that no wait within max_attempts is ever capped.
		let max_interval = self
			.initial_interval
			.saturating_mul(1u32 << self.max_attempts.min(31));

		let mut backoff = ExponentialBackoff {
			current_interval: self.initial_interval,
			initial_interval: self.initial_interval,
			randomization_factor: 0.0,
			multiplier: 2.0,
			max_interval,
			max_elapsed_time: None,
			..Default::default()
		};
		backoff.reset();
		backoff
	}

	/// The waits the retry loop will use, in order.
	pub fn delays(&self) -> Vec<Duration> {
		let mut backoff = self.backoff();
		(0..self.max_attempts)
			.map(|_| backoff.next_backoff().unwrap_or(max_wait()))
			.collect()
	}
}

impl Default for RetrySchedule {
	fn default() -> Self {
		Self::from_config(&PricingConfig::default())
	}
}

fn max_wait() -> Duration {
	Duration::from_secs(u64::MAX / 2)
}

/// Fetches price quotes from a `PriceSource`.
pub struct PriceFeed {
	source: Box<dyn PriceSource>,
	schedule: RetrySchedule,
}

impl PriceFeed {
	pub fn new(source: Box<dyn PriceSource>, schedule: RetrySchedule) -> Self {
		Self { source, schedule }
	}

	/// One fetch of all three values. Failures yield the zero-priced quote.
	pub async fn fetch_prices(&self) -> PriceQuote {
		match self.source.fetch_quote().await {
			Ok(quote) => quote,
			Err(e) => {
				error!(error = %e, "Failed to fetch price quote");
				PriceQuote::unavailable()
			}
		}
	}

	/// Fetches prices, retrying while the oracle token price is unavailable.
	///
	/// Returns the zero-priced quote once every retry is exhausted; callers
	/// must treat that as "cannot compute this cycle".
	pub async fn fetch_prices_with_retry(&self) -> PriceQuote {
		let mut quote = self.fetch_prices().await;
		let mut backoff = self.schedule.backoff();
		let mut attempt = 0;

		while !quote.is_available() && attempt < self.schedule.max_attempts {
			let delay = backoff.next_backoff().unwrap_or_else(max_wait);
			warn!(
				attempt,
				delay_secs = delay.as_secs(),
				"Oracle token price is 0, trying again in {} seconds",
				delay.as_secs()
			);
			tokio::time::sleep(delay).await;
			quote = self.fetch_prices().await;
			attempt += 1;
		}

		if !quote.is_available() {
			error!(
				attempts = attempt,
				"Price quote unavailable after exhausting retries"
			);
		}

		quote
	}
}
