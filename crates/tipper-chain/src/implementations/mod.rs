//! Chain adapter implementations.

pub mod evm;
