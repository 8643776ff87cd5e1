use crate::SecretProvider;
use async_trait::async_trait;
use tipper_types::AccountError;

/// Reads secrets from environment variables named after the secret.
pub struct EnvSecretProvider;

#[async_trait]
impl SecretProvider for EnvSecretProvider {
	async fn get(&self, name: &str) -> Result<String, AccountError> {
		match std::env::var(name) {
			Ok(value) if !value.trim().is_empty() => Ok(value),
			_ => Err(AccountError::SecretNotFound(name.to_string())),
		}
	}
}
