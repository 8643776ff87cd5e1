//! Secret retrieval and signing identity resolution.
//!
//! The signing key is the only secret the tipper needs. It is fetched once
//! per invocation through a `SecretProvider` and immediately turned into a
//! `SigningIdentity`; the raw string is not kept.

use async_trait::async_trait;
use tipper_config::{AccountConfig, SecretSource};
use tipper_types::{AccountError, SigningIdentity};
use tracing::info;

pub mod implementations;

pub use implementations::{EnvSecretProvider, FileSecretProvider};

/// Accessor for named secrets supplied by the invocation harness.
#[async_trait]
pub trait SecretProvider: Send + Sync {
	async fn get(&self, name: &str) -> Result<String, AccountError>;
}

/// Builds the secret provider selected in configuration.
pub fn create_secret_provider(config: &AccountConfig) -> Box<dyn SecretProvider> {
	match config.source {
		SecretSource::Env => Box::new(EnvSecretProvider),
		SecretSource::File => Box::new(FileSecretProvider::new(config.secrets_dir.clone())),
	}
}

/// Resolves the signing identity for one invocation.
pub async fn resolve_identity(
	secrets: &dyn SecretProvider,
	secret_name: &str,
) -> Result<SigningIdentity, AccountError> {
	let private_key = secrets.get(secret_name).await?;
	let identity = SigningIdentity::from_private_key(&private_key)?;
	info!(address = %identity.address(), "Resolved signing account");
	Ok(identity)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	struct StaticSecrets(HashMap<String, String>);

	#[async_trait]
	impl SecretProvider for StaticSecrets {
		async fn get(&self, name: &str) -> Result<String, AccountError> {
			self.0
				.get(name)
				.cloned()
				.ok_or_else(|| AccountError::SecretNotFound(name.to_string()))
		}
	}

	#[tokio::test]
	async fn test_resolve_identity() {
		let secrets = StaticSecrets(HashMap::from([(
			"RAFT_ACCOUNT".to_string(),
			"0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d".to_string(),
		)]));

		let identity = resolve_identity(&secrets, "RAFT_ACCOUNT").await.unwrap();
		assert_eq!(
			identity.address().to_string().to_lowercase(),
			"0x70997970c51812dc3a010c7d01b50e0d17dc79c8"
		);
	}

	#[tokio::test]
	async fn test_missing_secret() {
		let secrets = StaticSecrets(HashMap::new());
		assert!(matches!(
			resolve_identity(&secrets, "RAFT_ACCOUNT").await,
			Err(AccountError::SecretNotFound(name)) if name == "RAFT_ACCOUNT"
		));
	}

	#[tokio::test]
	async fn test_invalid_secret_value() {
		let secrets = StaticSecrets(HashMap::from([(
			"RAFT_ACCOUNT".to_string(),
			"not-a-key".to_string(),
		)]));
		assert!(matches!(
			resolve_identity(&secrets, "RAFT_ACCOUNT").await,
			Err(AccountError::InvalidKey(_))
		));
	}
}
