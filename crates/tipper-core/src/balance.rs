//! Allowance maintenance and balance reads.

use crate::decision::needs_allowance_top_up;
use crate::TipperError;
use alloy::primitives::U256;
use tipper_chain::OracleContracts;
use tipper_delivery::{Fallback, TransactionSubmitter};
use tipper_types::{Balances, SigningIdentity};
use tracing::info;

pub struct BalanceManager {
	contracts: OracleContracts,
	submitter: TransactionSubmitter,
	approval_amount: U256,
	legacy_gas_limit: u64,
}

impl BalanceManager {
	pub fn new(
		contracts: OracleContracts,
		submitter: TransactionSubmitter,
		approval_amount: U256,
		legacy_gas_limit: u64,
	) -> Self {
		Self {
			contracts,
			submitter,
			approval_amount,
			legacy_gas_limit,
		}
	}

	/// Tops up the autopay allowance if it is running low, then reads both
	/// balances.
	///
	/// The top-up approves the full configured amount. Read and approval
	/// failures are returned as-is; nothing is retried here.
	pub async fn ensure_allowance_and_get_balances(
		&self,
		identity: &SigningIdentity,
	) -> Result<Balances, TipperError> {
		let owner = identity.address();

		let allowance = self.contracts.allowance(owner).await?;
		info!(%allowance, "Current allowance");

		if needs_allowance_top_up(allowance, self.approval_amount) {
			info!(
				amount = %self.approval_amount,
				spender = %self.contracts.autopay_address(),
				"Allowance is low, approving"
			);
			let calldata = self.contracts.approve_calldata(self.approval_amount);
			let receipt = self
				.submitter
				.submit(
					identity,
					self.contracts.token_address(),
					calldata,
					&Fallback::estimate_or_legacy(self.legacy_gas_limit),
				)
				.await
				.map_err(TipperError::Approval)?;
			info!(tx_hash = %receipt.hash, "Approval confirmed");
		}

		let oracle_token = self.contracts.oracle_token_balance(owner).await?;
		let settlement_token = self.contracts.settlement_token_balance(owner).await?;
		info!(%oracle_token, %settlement_token, "Read balances");

		Ok(Balances::new(oracle_token, settlement_token))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::{identity, tokens};
	use alloy::sol_types::SolCall;
	use std::sync::Arc;
	use tipper_chain::contracts::IERC20;
	use tipper_chain::mock::MockChain;
	use tipper_types::GasParams;

	fn manager(chain: &Arc<MockChain>) -> BalanceManager {
		let contracts = OracleContracts::new(chain.clone(), &MockChain::contracts());
		let submitter = TransactionSubmitter::new(chain.clone(), 1);
		BalanceManager::new(contracts, submitter, tokens(1000), 250_000)
	}

	#[tokio::test]
	async fn test_no_approval_when_allowance_sufficient() {
		let chain = Arc::new(MockChain::funded());
		chain.update(|s| s.allowance = tokens(100));

		let balances = manager(&chain)
			.ensure_allowance_and_get_balances(&identity())
			.await
			.unwrap();

		assert!(chain.snapshot().sent.is_empty());
		assert_eq!(balances.oracle_token, tokens(10));
		assert_eq!(balances.settlement_token, tokens(1));
	}

	#[tokio::test]
	async fn test_approves_full_target_below_threshold() {
		let chain = Arc::new(MockChain::funded());
		chain.update(|s| s.allowance = tokens(100) - U256::from(1u8));

		manager(&chain)
			.ensure_allowance_and_get_balances(&identity())
			.await
			.unwrap();

		let state = chain.snapshot();
		assert_eq!(state.sent.len(), 1);
		let tx = &state.sent[0];
		assert_eq!(tx.to, MockChain::contracts().token);
		assert_eq!(tx.gas, GasParams::Estimated { gas_limit: 60_000 });

		let approve = IERC20::approveCall::abi_decode(&tx.data).unwrap();
		assert_eq!(approve.spender, MockChain::contracts().autopay);
		assert_eq!(approve.amount, tokens(1000));
		assert_eq!(state.allowance, tokens(1000));
	}

	#[tokio::test]
	async fn test_approval_falls_back_to_legacy_pricing() {
		let chain = Arc::new(MockChain::funded());
		chain.update(|s| {
			s.allowance = U256::ZERO;
			s.gas_estimate = None;
		});

		manager(&chain)
			.ensure_allowance_and_get_balances(&identity())
			.await
			.unwrap();

		let state = chain.snapshot();
		assert_eq!(
			state.sent[0].gas,
			GasParams::Legacy {
				gas_price: state.gas_price,
				gas_limit: 250_000,
			}
		);
	}

	#[tokio::test]
	async fn test_approval_send_failure_is_fatal() {
		let chain = Arc::new(MockChain::funded());
		chain.update(|s| {
			s.allowance = U256::ZERO;
			s.fail_sends = true;
		});

		let result = manager(&chain)
			.ensure_allowance_and_get_balances(&identity())
			.await;

		assert!(matches!(result, Err(TipperError::Approval(_))));
	}
}
