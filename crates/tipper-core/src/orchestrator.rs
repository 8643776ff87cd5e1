//! One tipping cycle: balance preconditions, requirement, decision, tip.

use crate::balance::BalanceManager;
use crate::decision::{amount_to_tip, tip_warranted, TipPlan};
use crate::{CycleOutcome, TipperError};
use alloy::primitives::{Bytes, B256};
use std::sync::Arc;
use tipper_chain::OracleContracts;
use tipper_config::TipperConfig;
use tipper_delivery::{LegacyGasPrice, TransactionSubmitter};
use tipper_pricing::{PriceFeed, PriceSource, RetrySchedule, TipCalculator, TipParameters};
use tipper_types::{Balances, ChainAdapter, SigningIdentity, TipDecisionContext};
use tracing::{error, info, warn};

pub struct TippingOrchestrator {
	contracts: OracleContracts,
	balances: BalanceManager,
	submitter: TransactionSubmitter,
	feed: PriceFeed,
	calculator: TipCalculator,
	query_id: B256,
	query_data: Bytes,
	tip_gas: LegacyGasPrice,
	oracle_token_name: String,
	base_token_name: String,
}

impl TippingOrchestrator {
	pub fn new(
		chain: Arc<dyn ChainAdapter>,
		config: &TipperConfig,
		prices: Box<dyn PriceSource>,
	) -> Result<Self, TipperError> {
		let query_id = config.query.id.ok_or_else(|| {
			TipperError::Configuration("query.id must be set for this deployment".to_string())
		})?;

		let contracts = OracleContracts::new(chain.clone(), &config.contracts);
		let submitter = TransactionSubmitter::new(chain, config.network.confirmations);

		Ok(Self {
			balances: BalanceManager::new(
				contracts.clone(),
				submitter.clone(),
				config.tip.approval_amount,
				config.tip.legacy_gas_limit,
			),
			contracts,
			submitter,
			feed: PriceFeed::new(prices, RetrySchedule::from_config(&config.pricing)),
			calculator: TipCalculator::new(TipParameters::from(&config.tip)),
			query_id,
			query_data: config.query.data.clone(),
			tip_gas: LegacyGasPrice::new(
				config.tip.gas_price_markup_percent,
				config.tip.legacy_gas_limit,
			),
			oracle_token_name: config.pricing.oracle_token.name.clone(),
			base_token_name: config.pricing.base_token.name.clone(),
		})
	}

	pub fn contracts(&self) -> &OracleContracts {
		&self.contracts
	}

	pub fn query_id(&self) -> B256 {
		self.query_id
	}

	/// Tops up allowance and reads fresh balances.
	pub async fn refresh_balances(
		&self,
		identity: &SigningIdentity,
	) -> Result<Balances, TipperError> {
		self.balances.ensure_allowance_and_get_balances(identity).await
	}

	/// Runs one full cycle at attempt index 0.
	pub async fn run_tipping_cycle(
		&self,
		identity: &SigningIdentity,
	) -> Result<CycleOutcome, TipperError> {
		let balances = self.refresh_balances(identity).await?;
		if let Some(outcome) = self.check_balances(&balances) {
			return Ok(outcome);
		}

		let baseline = self.contracts.last_report_time(self.query_id).await;
		let context = TipDecisionContext::new(baseline, balances);

		self.run_attempt(identity, context).await
	}

	/// Evaluates the decision for `context` and sends the tip if one is due.
	pub async fn run_attempt(
		&self,
		identity: &SigningIdentity,
		context: TipDecisionContext,
	) -> Result<CycleOutcome, TipperError> {
		let amount = match self.plan_tip(&context).await? {
			TipPlan::PriceUnavailable => {
				error!("Error calculating required tip, aborting cycle");
				return Ok(CycleOutcome::PriceUnavailable);
			}
			TipPlan::NotWarranted => {
				info!("Current tip is sufficient and a new report has arrived");
				return Ok(CycleOutcome::NotWarranted);
			}
			TipPlan::NothingToTip => {
				info!("Tip warranted but nothing left to add");
				return Ok(CycleOutcome::NothingToTip { context });
			}
			TipPlan::Tip { amount } => amount,
		};

		info!(
			%amount,
			attempt_index = context.attempt_index,
			query_id = %self.query_id,
			"Tipping"
		);

		let calldata = self
			.contracts
			.tip_calldata(self.query_id, amount, &self.query_data);
		let receipt = self
			.submitter
			.submit(
				identity,
				self.contracts.autopay_address(),
				calldata,
				&self.tip_gas,
			)
			.await
			.map_err(TipperError::Tip)?;

		info!(tx_hash = %receipt.hash, %amount, "Tip confirmed");

		Ok(CycleOutcome::Tipped {
			amount,
			tx_hash: receipt.hash,
			context,
		})
	}

	/// Reads prices and on-chain state and decides what, if anything, to tip.
	///
	/// Sends nothing, so two calls against unchanged state agree.
	pub async fn plan_tip(&self, context: &TipDecisionContext) -> Result<TipPlan, TipperError> {
		let requirement = self
			.calculator
			.compute_required_tip(&self.feed, context.attempt_index)
			.await;
		if requirement.is_unavailable() {
			return Ok(TipPlan::PriceUnavailable);
		}
		let required_tip = requirement.to_wei();

		let current_tip = self.contracts.current_tip(self.query_id).await?;
		let latest_report = self.contracts.last_report_time(self.query_id).await;

		info!(
			%current_tip,
			%required_tip,
			baseline = context.last_report_timestamp,
			latest_report,
			"Evaluating tip"
		);

		if !tip_warranted(
			current_tip,
			required_tip,
			context.last_report_timestamp,
			latest_report,
		) {
			return Ok(TipPlan::NotWarranted);
		}

		let amount = amount_to_tip(required_tip, current_tip, context.balances.oracle_token);
		if amount < required_tip.saturating_sub(current_tip) {
			warn!(
				balance = %context.balances.oracle_token,
				"Oracle token balance below shortfall, tipping full balance"
			);
		}

		if amount.is_zero() {
			Ok(TipPlan::NothingToTip)
		} else {
			Ok(TipPlan::Tip { amount })
		}
	}

	/// Logs each zero balance and reports them; `None` when both are funded.
	pub(crate) fn check_balances(&self, balances: &Balances) -> Option<CycleOutcome> {
		if balances.is_fundable() {
			return None;
		}

		for message in
			zero_balance_messages(balances, &self.oracle_token_name, &self.base_token_name)
		{
			error!("{}", message);
		}

		Some(CycleOutcome::ZeroBalance {
			oracle_token: balances.oracle_token.is_zero(),
			settlement_token: balances.settlement_token.is_zero(),
		})
	}
}

/// One line per empty balance, named after the configured price endpoints.
fn zero_balance_messages(
	balances: &Balances,
	oracle_token: &str,
	base_token: &str,
) -> Vec<String> {
	let mut messages = Vec::new();
	if balances.oracle_token.is_zero() {
		messages.push(format!("zero {} oracle token balance", oracle_token));
	}
	if balances.settlement_token.is_zero() {
		messages.push(format!("zero {} base token balance", base_token));
	}
	messages
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::{
		identity, reference_quote, test_config, tenths, tokens, ScriptedPrices,
	};
	use alloy::primitives::U256;
	use alloy::sol_types::SolCall;
	use tipper_chain::contracts::IAutopay;
	use tipper_chain::mock::MockChain;
	use tipper_types::GasParams;

	fn orchestrator(chain: &Arc<MockChain>, prices: ScriptedPrices) -> TippingOrchestrator {
		TippingOrchestrator::new(chain.clone(), &test_config(), Box::new(prices)).unwrap()
	}

	/// `f64` requirements are not exact in wei.
	fn assert_close(amount: U256, expected: U256) {
		let diff = if amount > expected {
			amount - expected
		} else {
			expected - amount
		};
		assert!(diff < U256::from(10_000u64), "{} vs {}", amount, expected);
	}

	#[tokio::test]
	async fn test_tips_shortfall() {
		let chain = Arc::new(MockChain::funded());
		chain.update(|s| s.current_tip = tokens(1));

		let outcome = orchestrator(&chain, ScriptedPrices::always(reference_quote()))
			.run_tipping_cycle(&identity())
			.await
			.unwrap();

		let CycleOutcome::Tipped { amount, context, .. } = outcome else {
			panic!("expected a tip, got {:?}", outcome);
		};
		assert_close(amount, tenths(34));
		assert_eq!(context.attempt_index, 0);
		assert_eq!(context.last_report_timestamp, 1_700_000_000);

		let state = chain.snapshot();
		assert_eq!(state.sent.len(), 1);
		let tx = &state.sent[0];
		assert_eq!(tx.to, MockChain::contracts().autopay);
		// 120% of the 20 gwei suggested price
		assert_eq!(
			tx.gas,
			GasParams::Legacy {
				gas_price: 24_000_000_000,
				gas_limit: 300_000,
			}
		);

		let tip = IAutopay::tipCall::abi_decode(&tx.data).unwrap();
		assert_eq!(tip._queryId, test_config().query.id.unwrap());
		assert_eq!(tip._amount, amount);
		assert_eq!(tip._queryData, test_config().query.data);
	}

	#[tokio::test]
	async fn test_tip_clamped_to_balance() {
		let chain = Arc::new(MockChain::funded());
		chain.update(|s| {
			s.current_tip = tokens(1);
			s.oracle_token_balance = tokens(2);
		});

		let outcome = orchestrator(&chain, ScriptedPrices::always(reference_quote()))
			.run_tipping_cycle(&identity())
			.await
			.unwrap();

		assert!(matches!(outcome, CycleOutcome::Tipped { amount, .. } if amount == tokens(2)));
		assert_eq!(chain.snapshot().oracle_token_balance, U256::ZERO);
	}

	#[tokio::test(start_paused = true)]
	async fn test_price_failure_aborts_without_transactions() {
		let chain = Arc::new(MockChain::funded());
		let prices = ScriptedPrices::failing();
		let calls = prices.calls();

		let outcome = orchestrator(&chain, prices)
			.run_tipping_cycle(&identity())
			.await
			.unwrap();

		assert_eq!(outcome, CycleOutcome::PriceUnavailable);
		assert!(chain.snapshot().sent.is_empty());
		// first fetch plus ten retries
		assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 11);
	}

	#[tokio::test]
	async fn test_no_new_report_warrants_tip_even_when_pooled_tip_suffices() {
		let chain = Arc::new(MockChain::funded());
		chain.update(|s| s.current_tip = tokens(5));
		let orchestrator = orchestrator(&chain, ScriptedPrices::always(reference_quote()));
		let context = TipDecisionContext::new(
			1_700_000_000,
			Balances::new(tokens(10), tokens(1)),
		);

		// Warranted by the stale report, but 4.4 - 5 clamps to zero.
		let plan = orchestrator.plan_tip(&context).await.unwrap();
		assert_eq!(plan, TipPlan::NothingToTip);

		let outcome = orchestrator.run_attempt(&identity(), context).await.unwrap();
		assert_eq!(outcome, CycleOutcome::NothingToTip { context });
		assert!(chain.snapshot().sent.is_empty());
	}

	#[tokio::test]
	async fn test_new_report_with_sufficient_tip_is_not_warranted() {
		let chain = Arc::new(MockChain::funded());
		chain.update(|s| {
			s.current_tip = tokens(5);
			s.report_script.extend([Some(100), Some(200)]);
		});

		let outcome = orchestrator(&chain, ScriptedPrices::always(reference_quote()))
			.run_tipping_cycle(&identity())
			.await
			.unwrap();

		assert_eq!(outcome, CycleOutcome::NotWarranted);
		assert_eq!(chain.snapshot().data_before_calls, 2);
	}

	#[tokio::test]
	async fn test_zero_balance_skips_pricing() {
		let chain = Arc::new(MockChain::funded());
		chain.update(|s| s.native_balance = U256::ZERO);
		let prices = ScriptedPrices::always(reference_quote());
		let calls = prices.calls();

		let outcome = orchestrator(&chain, prices)
			.run_tipping_cycle(&identity())
			.await
			.unwrap();

		assert_eq!(
			outcome,
			CycleOutcome::ZeroBalance {
				oracle_token: false,
				settlement_token: true
			}
		);
		assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
		assert_eq!(chain.snapshot().data_before_calls, 0);
	}

	#[test]
	fn test_zero_balance_messages_name_each_token() {
		let both = Balances::new(U256::ZERO, U256::ZERO);
		assert_eq!(
			zero_balance_messages(&both, "tellor", "ethereum"),
			vec![
				"zero tellor oracle token balance".to_string(),
				"zero ethereum base token balance".to_string(),
			]
		);

		let gas_only = Balances::new(tokens(1), U256::ZERO);
		assert_eq!(
			zero_balance_messages(&gas_only, "tellor", "matic"),
			vec!["zero matic base token balance".to_string()]
		);

		assert!(zero_balance_messages(&Balances::new(tokens(1), tokens(1)), "a", "b").is_empty());
	}

	#[tokio::test]
	async fn test_zero_oracle_token_balance_is_reported() {
		let chain = Arc::new(MockChain::funded());
		chain.update(|s| s.oracle_token_balance = U256::ZERO);
		let orchestrator = orchestrator(&chain, ScriptedPrices::always(reference_quote()));

		let outcome = orchestrator.run_tipping_cycle(&identity()).await.unwrap();

		assert_eq!(
			outcome,
			CycleOutcome::ZeroBalance {
				oracle_token: true,
				settlement_token: false
			}
		);
		assert!(chain.snapshot().sent.is_empty());
	}

	#[tokio::test]
	async fn test_plan_is_idempotent_without_new_data() {
		let chain = Arc::new(MockChain::funded());
		chain.update(|s| s.current_tip = tokens(1));
		let orchestrator = orchestrator(&chain, ScriptedPrices::always(reference_quote()));
		let context = TipDecisionContext::new(
			1_700_000_000,
			Balances::new(tokens(10), tokens(1)),
		);

		let first = orchestrator.plan_tip(&context).await.unwrap();
		let second = orchestrator.plan_tip(&context).await.unwrap();

		assert!(matches!(first, TipPlan::Tip { .. }));
		assert_eq!(first, second);
	}

	#[tokio::test]
	async fn test_tip_send_failure_propagates() {
		let chain = Arc::new(MockChain::funded());
		chain.update(|s| s.fail_sends = true);

		let result = orchestrator(&chain, ScriptedPrices::always(reference_quote()))
			.run_tipping_cycle(&identity())
			.await;

		assert!(matches!(result, Err(TipperError::Tip(_))));
	}

	#[tokio::test]
	async fn test_missing_query_id_is_rejected() {
		let chain = Arc::new(MockChain::funded());
		let mut config = test_config();
		config.query.id = None;

		let result = TippingOrchestrator::new(
			chain,
			&config,
			Box::new(ScriptedPrices::always(reference_quote())),
		);
		assert!(matches!(result, Err(TipperError::Configuration(_))));
	}
}
