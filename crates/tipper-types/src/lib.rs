//! Shared types for the autotipper workspace.
//!
//! Everything that crosses a crate boundary lives here: the price and tip
//! values produced per decision cycle, the on-chain balances, the transaction
//! shapes handed to the chain adapter, the signing identity, and the errors
//! those seams can return.

pub mod account;
pub mod chain;
pub mod errors;
pub mod pricing;
pub mod tipping;

pub use account::*;
pub use chain::*;
pub use errors::*;
pub use pricing::*;
pub use tipping::*;
