//! Alloy-backed `ChainAdapter` over HTTP JSON-RPC.
//!
//! Transactions are built locally, signed with the invocation's identity and
//! broadcast as raw envelopes, so the provider itself carries no wallet or
//! fillers.

use alloy::network::{Ethereum, TransactionBuilder};
use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::{Provider, RootProvider};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use std::time::Duration;
use tipper_types::{
	ChainAdapter, ChainError, GasParams, PendingTransaction, SigningIdentity, TransactionReceipt,
	TxHash,
};
use tracing::{debug, info};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Shortens a hash for log lines.
fn truncate_hash(hash: &TxHash) -> String {
	format!("0x{}..", hex::encode(&hash[..4]))
}

pub struct AlloyAdapter {
	provider: RootProvider<Ethereum>,
	chain_id: u64,
	poll_interval: Duration,
}

impl AlloyAdapter {
	/// Connects to `rpc_url` and checks the node serves `expected_chain_id`.
	pub async fn connect(rpc_url: &str, expected_chain_id: u64) -> Result<Self, ChainError> {
		let url = rpc_url
			.parse()
			.map_err(|e| ChainError::Config(format!("Invalid RPC URL: {}", e)))?;
		let provider = RootProvider::<Ethereum>::new_http(url);

		let chain_id = provider
			.get_chain_id()
			.await
			.map_err(|e| ChainError::Rpc(format!("Failed to get chain ID: {}", e)))?;

		if chain_id != expected_chain_id {
			return Err(ChainError::Config(format!(
				"Chain ID mismatch: expected {}, got {}",
				expected_chain_id, chain_id
			)));
		}

		debug!(chain_id, "Connected to settlement network");

		Ok(Self {
			provider,
			chain_id,
			poll_interval: DEFAULT_POLL_INTERVAL,
		})
	}

	pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
		self.poll_interval = poll_interval;
		self
	}

	async fn build_request(
		&self,
		tx: &PendingTransaction,
	) -> Result<TransactionRequest, ChainError> {
		let base = TransactionRequest::default()
			.with_from(tx.from)
			.with_to(tx.to)
			.with_input(tx.data.clone())
			.with_nonce(tx.nonce)
			.with_chain_id(self.chain_id);

		let request = match tx.gas {
			GasParams::Estimated { gas_limit } => {
				let fees = self
					.provider
					.estimate_eip1559_fees()
					.await
					.map_err(|e| ChainError::Rpc(format!("Failed to estimate fees: {}", e)))?;
				base.with_gas_limit(gas_limit)
					.with_max_fee_per_gas(fees.max_fee_per_gas)
					.with_max_priority_fee_per_gas(fees.max_priority_fee_per_gas)
			}
			GasParams::Legacy {
				gas_price,
				gas_limit,
			} => base.with_gas_limit(gas_limit).with_gas_price(gas_price),
		};

		Ok(request)
	}
}

#[async_trait]
impl ChainAdapter for AlloyAdapter {
	async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
		let request = TransactionRequest::default().with_to(to).with_input(data);
		self.provider
			.call(request)
			.await
			.map_err(|e| ChainError::Rpc(format!("eth_call failed: {}", e)))
	}

	async fn estimate_gas(
		&self,
		from: Address,
		to: Address,
		data: Bytes,
	) -> Result<u64, ChainError> {
		let request = TransactionRequest::default()
			.with_from(from)
			.with_to(to)
			.with_input(data);
		self.provider
			.estimate_gas(request)
			.await
			.map_err(|e| ChainError::Rpc(format!("Gas estimation failed: {}", e)))
	}

	async fn gas_price(&self) -> Result<u128, ChainError> {
		self.provider
			.get_gas_price()
			.await
			.map_err(|e| ChainError::Rpc(format!("Failed to get gas price: {}", e)))
	}

	async fn transaction_count(&self, address: Address) -> Result<u64, ChainError> {
		self.provider
			.get_transaction_count(address)
			.await
			.map_err(|e| ChainError::Rpc(format!("Failed to get nonce: {}", e)))
	}

	async fn native_balance(&self, address: Address) -> Result<U256, ChainError> {
		self.provider
			.get_balance(address)
			.await
			.map_err(|e| ChainError::Rpc(format!("Failed to get balance: {}", e)))
	}

	async fn send_transaction(
		&self,
		identity: &SigningIdentity,
		tx: PendingTransaction,
	) -> Result<TxHash, ChainError> {
		let request = self.build_request(&tx).await?;
		let envelope = <TransactionRequest as TransactionBuilder<Ethereum>>::build(
			request,
			&identity.wallet(),
		)
		.await
		.map_err(|e| ChainError::Signing(e.to_string()))?;

		let pending = self
			.provider
			.send_tx_envelope(envelope)
			.await
			.map_err(|e| ChainError::Rpc(format!("Failed to send transaction: {}", e)))?;

		let hash = *pending.tx_hash();
		info!(tx_hash = %truncate_hash(&hash), gas = %tx.gas, nonce = tx.nonce, "Submitted transaction");
		Ok(hash)
	}

	async fn wait_for_confirmation(
		&self,
		hash: TxHash,
		confirmations: u64,
	) -> Result<TransactionReceipt, ChainError> {
		info!(
			tx_hash = %truncate_hash(&hash),
			"Waiting for {} confirmations",
			confirmations
		);

		loop {
			let receipt = match self.provider.get_transaction_receipt(hash).await {
				Ok(Some(receipt)) => receipt,
				Ok(None) => {
					tokio::time::sleep(self.poll_interval).await;
					continue;
				}
				Err(e) => {
					return Err(ChainError::Rpc(format!("Failed to get receipt: {}", e)));
				}
			};

			let current_block = self
				.provider
				.get_block_number()
				.await
				.map_err(|e| ChainError::Rpc(format!("Failed to get block number: {}", e)))?;

			let tx_block = receipt.block_number.unwrap_or(current_block);
			let depth = current_block.saturating_sub(tx_block) + 1;

			if depth >= confirmations {
				return Ok(TransactionReceipt {
					hash: receipt.transaction_hash,
					block_number: tx_block,
					success: receipt.status(),
				});
			}

			debug!(
				"Waiting for {} more confirmations...",
				confirmations.saturating_sub(depth)
			);
			tokio::time::sleep(self.poll_interval).await;
		}
	}
}
