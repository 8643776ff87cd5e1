//! Tipping engine.
//!
//! Each invocation is a single sequential pass: resolve the signing identity,
//! top up the autopay allowance if needed, check balances, price the tip,
//! compare against the pooled tip and the latest report, and send at most one
//! tip. All state is re-read from chain every time.

pub mod balance;
pub mod decision;
pub mod error;
pub mod invocation;
pub mod orchestrator;
pub mod retip;

pub use balance::BalanceManager;
pub use decision::{amount_to_tip, needs_allowance_top_up, tip_warranted, TipPlan};
pub use error::{CycleOutcome, TipperError};
pub use invocation::run_invocation;
pub use orchestrator::TippingOrchestrator;
pub use retip::RetipEscalation;
