//! In-memory `ChainAdapter` for tests.
//!
//! Decodes the calldata produced by `OracleContracts`, answers reads from a
//! mutable state snapshot and applies `approve`/`tip` effects when those
//! transactions are sent. `rpc` serves the same role one level lower, as an
//! HTTP JSON-RPC node for the Alloy adapter.

use crate::contracts::{IAutopay, ITellorOracle, IERC20};
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use tipper_config::ContractsConfig;
use tipper_types::{
	ChainAdapter, ChainError, PendingTransaction, SigningIdentity, TransactionReceipt, TxHash,
};

pub mod rpc;

pub const QUERY_ID: B256 = B256::repeat_byte(0xab);

const ONE_TOKEN: u128 = 1_000_000_000_000_000_000;

#[derive(Debug, Clone)]
pub struct MockChainState {
	pub allowance: U256,
	pub oracle_token_balance: U256,
	pub native_balance: U256,
	pub current_tip: U256,
	/// Answer to `getDataBefore`; `None` makes the call fail.
	pub latest_report: Option<u64>,
	/// Answers consumed before `latest_report`, one per `getDataBefore` call.
	pub report_script: VecDeque<Option<u64>>,
	/// Gas estimate; `None` makes estimation fail.
	pub gas_estimate: Option<u64>,
	pub gas_price: u128,
	pub nonce: u64,
	pub fail_sends: bool,
	pub revert_sends: bool,
	pub sent: Vec<PendingTransaction>,
	pub data_before_calls: usize,
}

impl Default for MockChainState {
	fn default() -> Self {
		Self {
			allowance: U256::from(1_000u128 * ONE_TOKEN),
			oracle_token_balance: U256::from(10 * ONE_TOKEN),
			native_balance: U256::from(ONE_TOKEN),
			current_tip: U256::ZERO,
			latest_report: Some(1_700_000_000),
			report_script: VecDeque::new(),
			gas_estimate: Some(60_000),
			gas_price: 20_000_000_000,
			nonce: 7,
			fail_sends: false,
			revert_sends: false,
			sent: Vec::new(),
			data_before_calls: 0,
		}
	}
}

pub struct MockChain {
	state: Mutex<MockChainState>,
}

impl MockChain {
	/// A chain where the caller holds tokens, gas money and full allowance.
	pub fn funded() -> Self {
		Self {
			state: Mutex::new(MockChainState::default()),
		}
	}

	pub fn contracts() -> ContractsConfig {
		ContractsConfig {
			autopay: Address::repeat_byte(0xa1),
			oracle: Address::repeat_byte(0x0c),
			token: Address::repeat_byte(0x70),
		}
	}

	pub fn update(&self, f: impl FnOnce(&mut MockChainState)) {
		f(&mut self.lock());
	}

	pub fn snapshot(&self) -> MockChainState {
		self.lock().clone()
	}

	fn lock(&self) -> MutexGuard<'_, MockChainState> {
		self.state.lock().unwrap_or_else(|e| e.into_inner())
	}

	fn apply_effects(state: &mut MockChainState, data: &Bytes) {
		if let Ok(approve) = IERC20::approveCall::abi_decode(data) {
			state.allowance = approve.amount;
		} else if let Ok(tip) = IAutopay::tipCall::abi_decode(data) {
			state.current_tip += tip._amount;
			state.oracle_token_balance = state.oracle_token_balance.saturating_sub(tip._amount);
		}
	}
}

#[async_trait]
impl ChainAdapter for MockChain {
	async fn call(&self, _to: Address, data: Bytes) -> Result<Bytes, ChainError> {
		let mut state = self.lock();
		let selector: [u8; 4] = data
			.get(..4)
			.and_then(|s| s.try_into().ok())
			.ok_or_else(|| ChainError::Rpc("calldata too short".to_string()))?;

		let output = if selector == IERC20::allowanceCall::SELECTOR {
			state.allowance.abi_encode()
		} else if selector == IERC20::balanceOfCall::SELECTOR {
			state.oracle_token_balance.abi_encode()
		} else if selector == IAutopay::getCurrentTipCall::SELECTOR {
			state.current_tip.abi_encode()
		} else if selector == ITellorOracle::getDataBeforeCall::SELECTOR {
			state.data_before_calls += 1;
			let answer = match state.report_script.pop_front() {
				Some(scripted) => scripted,
				None => state.latest_report,
			};
			let timestamp =
				answer.ok_or_else(|| ChainError::Rpc("execution reverted".to_string()))?;
			(true, Bytes::from(vec![0u8; 32]), U256::from(timestamp)).abi_encode_params()
		} else {
			return Err(ChainError::Rpc("unknown selector".to_string()));
		};

		Ok(output.into())
	}

	async fn estimate_gas(
		&self,
		_from: Address,
		_to: Address,
		_data: Bytes,
	) -> Result<u64, ChainError> {
		self.lock()
			.gas_estimate
			.ok_or_else(|| ChainError::Rpc("gas required exceeds allowance".to_string()))
	}

	async fn gas_price(&self) -> Result<u128, ChainError> {
		Ok(self.lock().gas_price)
	}

	async fn transaction_count(&self, _address: Address) -> Result<u64, ChainError> {
		Ok(self.lock().nonce)
	}

	async fn native_balance(&self, _address: Address) -> Result<U256, ChainError> {
		Ok(self.lock().native_balance)
	}

	async fn send_transaction(
		&self,
		_identity: &SigningIdentity,
		tx: PendingTransaction,
	) -> Result<TxHash, ChainError> {
		let mut state = self.lock();
		if state.fail_sends {
			return Err(ChainError::Rpc("nonce too low".to_string()));
		}

		if !state.revert_sends {
			Self::apply_effects(&mut state, &tx.data);
		}
		state.nonce += 1;
		state.sent.push(tx);

		Ok(B256::with_last_byte(state.sent.len() as u8))
	}

	async fn wait_for_confirmation(
		&self,
		hash: TxHash,
		_confirmations: u64,
	) -> Result<TransactionReceipt, ChainError> {
		let state = self.lock();
		Ok(TransactionReceipt {
			hash,
			block_number: 100 + state.sent.len() as u64,
			success: !state.revert_sends,
		})
	}
}
