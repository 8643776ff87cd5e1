//! Entry point for one scheduled invocation.

use crate::orchestrator::TippingOrchestrator;
use crate::retip::RetipEscalation;
use crate::{CycleOutcome, TipperError};
use std::sync::Arc;
use std::time::Duration;
use tipper_account::{resolve_identity, SecretProvider};
use tipper_chain::AlloyAdapter;
use tipper_config::TipperConfig;
use tipper_pricing::HttpPriceSource;
use tracing::info;

/// Resolves the signing identity, connects to the settlement network and
/// runs one tipping cycle.
///
/// With `escalate` set (or `retip.enabled` in config) the cycle is followed by
/// the bounded re-tip sequence. The identity lives only for this call.
pub async fn run_invocation(
	config: &TipperConfig,
	secrets: &dyn SecretProvider,
	escalate: bool,
) -> Result<Vec<CycleOutcome>, TipperError> {
	let identity = resolve_identity(secrets, &config.account.secret).await?;

	let chain = AlloyAdapter::connect(&config.network.rpc_url, config.network.chain_id)
		.await?
		.with_poll_interval(Duration::from_secs(config.network.poll_interval_secs));
	let prices = HttpPriceSource::from_config(&config.pricing);
	let orchestrator = TippingOrchestrator::new(Arc::new(chain), config, Box::new(prices))?;

	let outcomes = if escalate || config.retip.enabled {
		RetipEscalation::new(&orchestrator, &config.retip)
			.run(&identity)
			.await?
	} else {
		vec![orchestrator.run_tipping_cycle(&identity).await?]
	};

	info!(attempts = outcomes.len(), "Invocation finished");
	Ok(outcomes)
}
