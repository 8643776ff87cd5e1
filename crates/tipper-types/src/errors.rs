//! Error types shared across the autotipper crates.

use thiserror::Error;

/// Failures talking to the settlement network.
#[derive(Debug, Error)]
pub enum ChainError {
	#[error("RPC error: {0}")]
	Rpc(String),

	#[error("Failed to decode {call} result: {reason}")]
	Decode { call: &'static str, reason: String },

	#[error("Signing failed: {0}")]
	Signing(String),

	#[error("Invalid chain configuration: {0}")]
	Config(String),
}

/// Failures resolving the signing identity.
#[derive(Debug, Error)]
pub enum AccountError {
	#[error("Secret not found: {0}")]
	SecretNotFound(String),

	#[error("Invalid key: {0}")]
	InvalidKey(String),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}
