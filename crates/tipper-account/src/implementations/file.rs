use crate::SecretProvider;
use async_trait::async_trait;
use std::path::PathBuf;
use tipper_types::AccountError;

/// Reads secrets from files in a directory, one file per secret.
///
/// Matches the layout of mounted container secrets such as `/run/secrets`.
pub struct FileSecretProvider {
	dir: PathBuf,
}

impl FileSecretProvider {
	pub fn new(dir: PathBuf) -> Self {
		Self { dir }
	}
}

#[async_trait]
impl SecretProvider for FileSecretProvider {
	async fn get(&self, name: &str) -> Result<String, AccountError> {
		if name.contains('/') || name.contains("..") {
			return Err(AccountError::SecretNotFound(name.to_string()));
		}

		let path = self.dir.join(name);
		match tokio::fs::read_to_string(&path).await {
			Ok(value) => Ok(value.trim().to_string()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				Err(AccountError::SecretNotFound(name.to_string()))
			}
			Err(e) => Err(AccountError::Io(e)),
		}
	}
}
