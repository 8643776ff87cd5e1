//! Pure decision rules for a tipping attempt.

use alloy::primitives::U256;

/// A tip is warranted when the pooled tip is below the requirement, or when
/// no report has landed since the cycle's baseline.
pub fn tip_warranted(
	current_tip: U256,
	required_tip: U256,
	baseline_report_time: u64,
	latest_report_time: u64,
) -> bool {
	current_tip < required_tip || latest_report_time <= baseline_report_time
}

/// `min(balance, max(0, required - current))`.
pub fn amount_to_tip(required_tip: U256, current_tip: U256, balance: U256) -> U256 {
	required_tip.saturating_sub(current_tip).min(balance)
}

/// Allowance is topped up once it falls below a tenth of the approval target.
pub fn needs_allowance_top_up(allowance: U256, approval_target: U256) -> bool {
	allowance < approval_target / U256::from(10u8)
}

/// Result of evaluating on-chain state against a tip requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TipPlan {
	PriceUnavailable,
	NotWarranted,
	NothingToTip,
	Tip { amount: U256 },
}
