//! Transaction submission for the autotipper.
//!
//! `TransactionSubmitter` builds a transaction from calldata, prices it with a
//! `GasStrategy`, resolves the nonce, signs and broadcasts it through the
//! `ChainAdapter`, then waits for confirmation. Gas pricing is a strategy so
//! the estimate-then-legacy fallback can be composed and tested on its own.

use alloy::primitives::{Address, Bytes};
use std::sync::Arc;
use thiserror::Error;
use tipper_types::{
	ChainAdapter, ChainError, PendingTransaction, SigningIdentity, TransactionReceipt, TxHash,
};
use tracing::{error, info};

pub mod strategies;

pub use strategies::{EstimatedGas, Fallback, GasStrategy, LegacyGasPrice};

/// Failures of a single submission. All of them are fatal for the cycle.
#[derive(Debug, Error)]
pub enum SubmitError {
	#[error("Gas pricing failed: {0}")]
	Gas(#[source] ChainError),

	#[error("Transaction send failed: {0}")]
	Send(#[source] ChainError),

	#[error("Waiting for confirmation failed: {0}")]
	Confirmation(#[source] ChainError),

	#[error("Transaction {hash} reverted")]
	Reverted { hash: TxHash },
}

/// Sends transactions and waits for them to be mined.
#[derive(Clone)]
pub struct TransactionSubmitter {
	chain: Arc<dyn ChainAdapter>,
	confirmations: u64,
}

impl TransactionSubmitter {
	pub fn new(chain: Arc<dyn ChainAdapter>, confirmations: u64) -> Self {
		Self {
			chain,
			confirmations: confirmations.max(1),
		}
	}

	/// Submits a call to `to` and blocks until it is confirmed.
	///
	/// A mined but reverted transaction is reported as `SubmitError::Reverted`.
	pub async fn submit(
		&self,
		identity: &SigningIdentity,
		to: Address,
		data: Bytes,
		strategy: &dyn GasStrategy,
	) -> Result<TransactionReceipt, SubmitError> {
		let from = identity.address();

		let gas = strategy
			.gas_params(self.chain.as_ref(), from, to, &data)
			.await
			.map_err(SubmitError::Gas)?;

		let nonce = self
			.chain
			.transaction_count(from)
			.await
			.map_err(SubmitError::Send)?;

		let tx = PendingTransaction {
			from,
			to,
			data,
			gas,
			nonce,
		};

		let hash = self
			.chain
			.send_transaction(identity, tx)
			.await
			.map_err(|e| {
				error!(error = %e, "Failed to send transaction");
				SubmitError::Send(e)
			})?;

		let receipt = self
			.chain
			.wait_for_confirmation(hash, self.confirmations)
			.await
			.map_err(SubmitError::Confirmation)?;

		if !receipt.success {
			error!(tx_hash = %hash, block = receipt.block_number, "Transaction reverted");
			return Err(SubmitError::Reverted { hash });
		}

		info!(
			tx_hash = %hash,
			block = receipt.block_number,
			%gas,
			"Transaction confirmed"
		);
		Ok(receipt)
	}
}
