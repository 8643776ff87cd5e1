//! Bounded re-tip escalation.
//!
//! After an attempt that found a tip warranted (whether it sent one or the
//! pooled tip already covered the requirement), waits, checks whether a report
//! has landed since the cycle's baseline and, if not, tries again one attempt
//! index higher so the requirement grows by the multiplier. Off unless enabled in `[retip]` or
//! requested on the command line.

use crate::orchestrator::TippingOrchestrator;
use crate::{CycleOutcome, TipperError};
use std::time::Duration;
use tipper_config::RetipConfig;
use tipper_types::SigningIdentity;
use tracing::info;

pub struct RetipEscalation<'a> {
	orchestrator: &'a TippingOrchestrator,
	max_retips: u32,
	wait: Duration,
}

impl<'a> RetipEscalation<'a> {
	pub fn new(orchestrator: &'a TippingOrchestrator, config: &RetipConfig) -> Self {
		Self {
			orchestrator,
			max_retips: config.max_retips,
			wait: Duration::from_secs(config.wait_secs),
		}
	}

	/// Runs a tipping cycle followed by up to `max_retips` escalations.
	///
	/// Returns the outcome of every attempt in order. Stops as soon as an
	/// attempt finds no tip warranted or a report lands.
	pub async fn run(&self, identity: &SigningIdentity) -> Result<Vec<CycleOutcome>, TipperError> {
		let mut outcomes = vec![self.orchestrator.run_tipping_cycle(identity).await?];
		let mut retips = 0;

		while retips < self.max_retips {
			let Some(context) = outcomes.last().and_then(CycleOutcome::warranted_context) else {
				break;
			};

			info!(
				wait_secs = self.wait.as_secs(),
				"Waiting before checking for a new report"
			);
			tokio::time::sleep(self.wait).await;

			let query_id = self.orchestrator.query_id();
			let latest = self.orchestrator.contracts().last_report_time(query_id).await;
			if latest > context.last_report_timestamp {
				info!(latest, "New report arrived, no re-tip needed");
				break;
			}

			retips += 1;
			info!(
				retip = retips,
				max_retips = self.max_retips,
				"No new report since the last attempt, escalating"
			);

			let balances = self.orchestrator.refresh_balances(identity).await?;
			if let Some(outcome) = self.orchestrator.check_balances(&balances) {
				outcomes.push(outcome);
				break;
			}

			let outcome = self
				.orchestrator
				.run_attempt(identity, context.next_attempt(balances))
				.await?;
			outcomes.push(outcome);
		}

		Ok(outcomes)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::{identity, reference_quote, test_config, tokens, ScriptedPrices};
	use alloy::primitives::U256;
	use std::sync::Arc;
	use tipper_chain::mock::MockChain;
	use tipper_config::RetipConfig;

	fn retip_config(max_retips: u32) -> RetipConfig {
		RetipConfig {
			enabled: true,
			max_retips,
			wait_secs: 300,
		}
	}

	fn orchestrator(chain: &Arc<MockChain>) -> TippingOrchestrator {
		TippingOrchestrator::new(
			chain.clone(),
			&test_config(),
			Box::new(ScriptedPrices::always(reference_quote())),
		)
		.unwrap()
	}

	#[tokio::test(start_paused = true)]
	async fn test_escalates_while_no_report_lands() {
		let chain = Arc::new(MockChain::funded());
		let orchestrator = orchestrator(&chain);

		let outcomes = RetipEscalation::new(&orchestrator, &retip_config(2))
			.run(&identity())
			.await
			.unwrap();

		assert_eq!(outcomes.len(), 3);
		for (i, outcome) in outcomes.iter().enumerate() {
			match outcome {
				CycleOutcome::Tipped { context, .. } => {
					assert_eq!(context.attempt_index, i as u32)
				}
				other => panic!("attempt {} did not tip: {:?}", i, other),
			}
		}
		assert_eq!(chain.snapshot().sent.len(), 3);
	}

	#[tokio::test(start_paused = true)]
	async fn test_stops_when_report_lands() {
		let chain = Arc::new(MockChain::funded());
		// baseline, latest, then the post-tip check
		chain.update(|s| s.report_script.extend([Some(100), Some(100), Some(200)]));
		let orchestrator = orchestrator(&chain);

		let outcomes = RetipEscalation::new(&orchestrator, &retip_config(3))
			.run(&identity())
			.await
			.unwrap();

		assert_eq!(outcomes.len(), 1);
		assert!(outcomes[0].is_tipped());
		assert_eq!(chain.snapshot().sent.len(), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn test_waits_between_attempts() {
		let chain = Arc::new(MockChain::funded());
		let orchestrator = orchestrator(&chain);
		let start = tokio::time::Instant::now();

		RetipEscalation::new(&orchestrator, &retip_config(1))
			.run(&identity())
			.await
			.unwrap();

		let elapsed = start.elapsed();
		assert!(elapsed >= Duration::from_secs(300));
		assert!(elapsed < Duration::from_secs(301));
	}

	#[tokio::test(start_paused = true)]
	async fn test_escalates_after_pooled_tip_covered_requirement() {
		let chain = Arc::new(MockChain::funded());
		// Requirement is 4.4, then 4.84, then 5.324 tokens.
		chain.update(|s| s.current_tip = tokens(5));
		let orchestrator = orchestrator(&chain);

		let outcomes = RetipEscalation::new(&orchestrator, &retip_config(2))
			.run(&identity())
			.await
			.unwrap();

		assert_eq!(outcomes.len(), 3);
		assert!(matches!(
			outcomes[0],
			CycleOutcome::NothingToTip { context } if context.attempt_index == 0
		));
		assert!(matches!(
			outcomes[1],
			CycleOutcome::NothingToTip { context } if context.attempt_index == 1
		));
		match &outcomes[2] {
			CycleOutcome::Tipped { amount, context, .. } => {
				assert_eq!(context.attempt_index, 2);
				assert!(*amount > U256::ZERO && *amount < tokens(1));
			}
			other => panic!("expected the last attempt to tip, got {:?}", other),
		}
		assert_eq!(chain.snapshot().sent.len(), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn test_retip_stops_on_zero_balance() {
		let chain = Arc::new(MockChain::funded());
		// Spending the whole balance on the first tip leaves nothing for a retip.
		chain.update(|s| s.oracle_token_balance = tokens(1));
		let orchestrator = orchestrator(&chain);

		let outcomes = RetipEscalation::new(&orchestrator, &retip_config(3))
			.run(&identity())
			.await
			.unwrap();

		assert_eq!(outcomes.len(), 2);
		assert!(outcomes[0].is_tipped());
		assert_eq!(
			outcomes[1],
			CycleOutcome::ZeroBalance {
				oracle_token: true,
				settlement_token: false
			}
		);
	}

	#[tokio::test]
	async fn test_no_retips_when_disabled_by_count() {
		let chain = Arc::new(MockChain::funded());
		let orchestrator = orchestrator(&chain);

		let outcomes = RetipEscalation::new(&orchestrator, &retip_config(0))
			.run(&identity())
			.await
			.unwrap();

		assert_eq!(outcomes.len(), 1);
	}
}
