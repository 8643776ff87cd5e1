//! Settlement network access for the autotipper.
//!
//! - `contracts`: `sol!` bindings and the `OracleContracts` facade exposing the
//!   named contract calls the tipper makes
//! - `implementations`: the Alloy-backed `ChainAdapter`
//! - `mock`: an in-memory chain and a JSON-RPC node for tests (feature `testing`)

pub mod contracts;
pub mod implementations;

#[cfg(any(test, feature = "testing"))]
pub mod mock;

pub use contracts::{DataBefore, OracleContracts};
pub use implementations::evm::AlloyAdapter;
