use alloy::primitives::U256;
use thiserror::Error;
use tipper_types::{AccountError, ChainError, TipDecisionContext, TxHash};
use tipper_delivery::SubmitError;

/// Failures that end an invocation.
///
/// Recoverable conditions (missing prices, zero balances, failed report-time
/// reads) are not errors; they surface as a `CycleOutcome` or a default value.
#[derive(Error, Debug)]
pub enum TipperError {
	#[error("Configuration error: {0}")]
	Configuration(String),

	#[error("Account error: {0}")]
	Account(#[from] AccountError),

	#[error("Chain error: {0}")]
	Chain(#[from] ChainError),

	#[error("Allowance top-up failed: {0}")]
	Approval(#[source] SubmitError),

	#[error("Tip submission failed: {0}")]
	Tip(#[source] SubmitError),
}

/// How a tipping attempt ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
	/// A tip transaction was confirmed.
	Tipped {
		amount: U256,
		tx_hash: TxHash,
		context: TipDecisionContext,
	},
	/// The pooled tip is sufficient and a new report has arrived.
	NotWarranted,
	/// A tip was warranted but the amount came to zero.
	NothingToTip { context: TipDecisionContext },
	/// One of the balances is zero; nothing was priced or sent.
	ZeroBalance {
		oracle_token: bool,
		settlement_token: bool,
	},
	/// Prices could not be fetched after all retries.
	PriceUnavailable,
}

impl CycleOutcome {
	pub fn is_tipped(&self) -> bool {
		matches!(self, CycleOutcome::Tipped { .. })
	}

	/// Context of an attempt that found a tip warranted, whether or not it
	/// sent one.
	pub fn warranted_context(&self) -> Option<TipDecisionContext> {
		match self {
			CycleOutcome::Tipped { context, .. } | CycleOutcome::NothingToTip { context } => {
				Some(*context)
			}
			_ => None,
		}
	}
}
