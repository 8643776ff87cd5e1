//! Signing identity for a single invocation.
//!
//! The identity is resolved once from the secret store when an invocation
//! starts and is handed by reference to every component that signs. It is
//! never stored globally and never printed.

use crate::AccountError;
use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use std::fmt;

/// Private key owned by one invocation.
#[derive(Clone)]
pub struct SigningIdentity {
	signer: PrivateKeySigner,
}

impl SigningIdentity {
	/// Parses a hex-encoded private key, with or without the `0x` prefix.
	///
	/// Surrounding whitespace is ignored so keys read from secret files with a
	/// trailing newline are accepted.
	pub fn from_private_key(private_key_hex: &str) -> Result<Self, AccountError> {
		let key = private_key_hex.trim();
		let key_without_prefix = key.strip_prefix("0x").unwrap_or(key);

		if key_without_prefix.len() != 64 {
			return Err(AccountError::InvalidKey(
				"private key must be 64 hex characters (32 bytes)".to_string(),
			));
		}

		if hex::decode(key_without_prefix).is_err() {
			return Err(AccountError::InvalidKey(
				"private key must be valid hexadecimal".to_string(),
			));
		}

		let signer = key_without_prefix
			.parse::<PrivateKeySigner>()
			.map_err(|e| AccountError::InvalidKey(e.to_string()))?;

		Ok(Self { signer })
	}

	pub fn address(&self) -> Address {
		self.signer.address()
	}

	/// Wallet used to sign transaction envelopes.
	pub fn wallet(&self) -> EthereumWallet {
		EthereumWallet::from(self.signer.clone())
	}
}

impl fmt::Debug for SigningIdentity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SigningIdentity")
			.field("address", &self.address())
			.finish_non_exhaustive()
	}
}
