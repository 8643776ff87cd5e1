//! Per-cycle tipping state.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

/// Balances read fresh from chain at the start of every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Balances {
	/// Oracle token balance in wei.
	pub oracle_token: U256,
	/// Native settlement token balance in wei.
	pub settlement_token: U256,
}

impl Balances {
	pub fn new(oracle_token: U256, settlement_token: U256) -> Self {
		Self {
			oracle_token,
			settlement_token,
		}
	}

	/// Both balances must be non-zero before a cycle may tip.
	pub fn is_fundable(&self) -> bool {
		!self.oracle_token.is_zero() && !self.settlement_token.is_zero()
	}
}

/// Context threaded through one tipping attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TipDecisionContext {
	/// Zero for the first attempt; escalates the requirement by the multiplier.
	pub attempt_index: u32,
	/// Timestamp of the latest report seen when the cycle began.
	pub last_report_timestamp: u64,
	pub balances: Balances,
}

impl TipDecisionContext {
	pub fn new(last_report_timestamp: u64, balances: Balances) -> Self {
		Self {
			attempt_index: 0,
			last_report_timestamp,
			balances,
		}
	}

	/// Context for the next escalation step with refreshed balances.
	pub fn next_attempt(&self, balances: Balances) -> Self {
		Self {
			attempt_index: self.attempt_index + 1,
			last_report_timestamp: self.last_report_timestamp,
			balances,
		}
	}
}
