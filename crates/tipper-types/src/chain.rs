//! Chain-facing types and the adapter trait.
//!
//! `ChainAdapter` is the narrow RPC surface the tipper needs from the
//! settlement network. Contract calls are ABI-encoded above this layer, so an
//! adapter only ever sees addresses and raw calldata.

use crate::{ChainError, SigningIdentity};
use alloy::primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type TxHash = B256;

/// Gas parameters attached to a transaction before it is signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GasParams {
	/// Gas limit obtained from `eth_estimateGas`; fees are filled at send time.
	Estimated { gas_limit: u64 },
	/// Legacy transaction with a fixed gas price in wei and a configured gas
	/// limit. Nothing is estimated for it at send time.
	Legacy { gas_price: u128, gas_limit: u64 },
}

impl fmt::Display for GasParams {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			GasParams::Estimated { gas_limit } => write!(f, "estimated(gas_limit={})", gas_limit),
			GasParams::Legacy {
				gas_price,
				gas_limit,
			} => write!(f, "legacy(gas_price={}, gas_limit={})", gas_price, gas_limit),
		}
	}
}

/// A transaction that has been built but not yet signed.
///
/// Built, submitted and dropped within a single invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransaction {
	pub from: Address,
	pub to: Address,
	pub data: Bytes,
	pub gas: GasParams,
	pub nonce: u64,
}

/// Transaction receipt containing execution details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
	/// The hash of the transaction.
	pub hash: TxHash,
	/// The block number where the transaction was included.
	pub block_number: u64,
	/// Whether the transaction executed successfully.
	pub success: bool,
}

/// RPC operations against the settlement network.
#[async_trait]
pub trait ChainAdapter: Send + Sync {
	/// Read-only contract call at the latest block.
	async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError>;

	/// Estimates the gas limit for a call sent from `from`.
	async fn estimate_gas(&self, from: Address, to: Address, data: Bytes)
		-> Result<u64, ChainError>;

	/// Network's current suggested gas price in wei.
	async fn gas_price(&self) -> Result<u128, ChainError>;

	/// Number of transactions sent from `address`, used as the next nonce.
	async fn transaction_count(&self, address: Address) -> Result<u64, ChainError>;

	/// Native currency balance in wei.
	async fn native_balance(&self, address: Address) -> Result<U256, ChainError>;

	/// Signs `tx` with `identity` and broadcasts it.
	async fn send_transaction(
		&self,
		identity: &SigningIdentity,
		tx: PendingTransaction,
	) -> Result<TxHash, ChainError>;

	/// Blocks until `hash` is mined with the requested confirmation depth.
	async fn wait_for_confirmation(
		&self,
		hash: TxHash,
		confirmations: u64,
	) -> Result<TransactionReceipt, ChainError>;
}
