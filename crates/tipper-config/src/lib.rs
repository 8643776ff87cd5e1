//! Configuration loading for the autotipper.
//!
//! Configuration is read from a TOML file, `${VAR}` placeholders are
//! substituted from the environment, `TIPPER_`-prefixed overrides are applied
//! and the result is validated before anything touches the network.

use regex::Regex;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

pub mod serde_helpers;
pub mod types;

pub use types::*;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

/// Configuration loader with environment variable substitution
pub struct ConfigLoader {
	file_path: Option<String>,
	env_prefix: String,
}

impl Default for ConfigLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "TIPPER_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_string_lossy().to_string());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	pub async fn load(&self) -> Result<TipperConfig, ConfigError> {
		let file_path = self.file_path.as_ref().ok_or_else(|| {
			ConfigError::FileNotFound("No configuration file specified".to_string())
		})?;

		if !Path::new(file_path).exists() {
			return Err(ConfigError::FileNotFound(file_path.clone()));
		}

		let content = tokio::fs::read_to_string(file_path).await?;
		self.load_from_str(&content)
	}

	/// Parses, overrides and validates configuration from a TOML string.
	pub fn load_from_str(&self, content: &str) -> Result<TipperConfig, ConfigError> {
		let substituted_content = self.substitute_env_vars(content)?;

		let mut config: TipperConfig = toml::from_str(&substituted_content)
			.map_err(|e| ConfigError::ParseError(e.to_string()))?;

		self.apply_env_overrides(&mut config)?;
		validate_config(&config)?;

		Ok(config)
	}

	fn substitute_env_vars(&self, content: &str) -> Result<String, ConfigError> {
		let mut result = content.to_string();

		// Find and replace ${VAR_NAME} patterns
		let re = Regex::new(r"\$\{([^}]+)\}")
			.map_err(|e| ConfigError::ParseError(format!("Invalid placeholder pattern: {}", e)))?;

		for cap in re.captures_iter(content) {
			let full_match = &cap[0];
			let var_name = &cap[1];

			let env_value = env::var(var_name)
				.map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;

			result = result.replace(full_match, &env_value);
		}

		Ok(result)
	}

	fn apply_env_overrides(&self, config: &mut TipperConfig) -> Result<(), ConfigError> {
		if let Ok(rpc_url) = env::var(format!("{}RPC_URL", self.env_prefix)) {
			debug!("Overriding RPC URL from environment");
			config.network.rpc_url = rpc_url;
		}

		if let Ok(chain_id) = env::var(format!("{}CHAIN_ID", self.env_prefix)) {
			config.network.chain_id = chain_id
				.parse()
				.map_err(|e| ConfigError::ValidationError(format!("Invalid chain id: {}", e)))?;
		}

		if let Ok(secret) = env::var(format!("{}SECRET_NAME", self.env_prefix)) {
			debug!("Overriding secret name from environment");
			config.account.secret = secret;
		}

		Ok(())
	}
}

/// Checks the invariants the tipping engine relies on.
pub fn validate_config(config: &TipperConfig) -> Result<(), ConfigError> {
	let rpc_url = &config.network.rpc_url;
	if !(rpc_url.starts_with("http://") || rpc_url.starts_with("https://")) {
		return Err(ConfigError::ValidationError(
			"network.rpc_url must start with http:// or https://".to_string(),
		));
	}

	if config.network.chain_id == 0 {
		return Err(ConfigError::ValidationError(
			"network.chain_id must be positive".to_string(),
		));
	}

	if config.network.poll_interval_secs == 0 {
		return Err(ConfigError::ValidationError(
			"network.poll_interval_secs must be positive".to_string(),
		));
	}

	if config.query.id.is_none() {
		return Err(ConfigError::ValidationError(
			"query.id must be set for this deployment".to_string(),
		));
	}

	for endpoint in [
		&config.pricing.base_token,
		&config.pricing.oracle_token,
		&config.pricing.gas_price,
	] {
		if !endpoint.selector.starts_with('/') {
			return Err(ConfigError::ValidationError(format!(
				"pricing selector for {} must be a JSON pointer starting with '/'",
				endpoint.name
			)));
		}
	}

	let tip = &config.tip;
	if !(tip.multiplier.is_finite() && tip.multiplier > 0.0) {
		return Err(ConfigError::ValidationError(
			"tip.multiplier must be positive".to_string(),
		));
	}

	if !(tip.profit_margin_usd.is_finite() && tip.profit_margin_usd >= 0.0) {
		return Err(ConfigError::ValidationError(
			"tip.profit_margin_usd must not be negative".to_string(),
		));
	}

	if tip.total_gas_units == 0 {
		return Err(ConfigError::ValidationError(
			"tip.total_gas_units must be positive".to_string(),
		));
	}

	if tip.approval_amount.is_zero() {
		return Err(ConfigError::ValidationError(
			"tip.approval_amount must be positive".to_string(),
		));
	}

	if tip.gas_price_markup_percent < 100 {
		return Err(ConfigError::ValidationError(
			"tip.gas_price_markup_percent must be at least 100".to_string(),
		));
	}

	if tip.legacy_gas_limit == 0 {
		return Err(ConfigError::ValidationError(
			"tip.legacy_gas_limit must be positive".to_string(),
		));
	}

	if config.account.secret.is_empty() {
		return Err(ConfigError::ValidationError(
			"account.secret must name a secret".to_string(),
		));
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy::primitives::Address;
	use std::io::Write;

	const VALID_CONFIG: &str = r#"
[network]
rpc_url = "http://localhost:8545"
chain_id = 1

[contracts]
autopay = "0x9be9b0cfa89ea800556c6efba67b455d336db1d0"
oracle = "0x8cfc184c877154a8f9ffe0fe75649dbe5e2dbebf"
token = "0x88df592f8eb5d7bd38bfef7deb0fbc02cf3778a0"

[query]
id = "0x83a7f3d48786ac2667503a61e8c415438ed2922eb86a2906e4ee66d9a2ce4992"
data = "0x"
"#;

	fn loader() -> ConfigLoader {
		// Isolated prefix so real TIPPER_* variables never leak into tests.
		ConfigLoader::new().with_env_prefix("TIPPER_CONFIG_TEST_UNUSED_")
	}

	#[test]
	fn test_minimal_config_uses_defaults() {
		let config = loader().load_from_str(VALID_CONFIG).unwrap();

		assert_eq!(config.network.confirmations, 1);
		assert_eq!(config.network.poll_interval_secs, 5);
		assert_eq!(config.tip.legacy_gas_limit, 300_000);
		assert_eq!(config.pricing.max_attempts, 10);
		assert_eq!(config.tip.multiplier, 1.10);
		assert!(!config.retip.enabled);
		assert_eq!(config.account.secret, "RAFT_ACCOUNT");
		assert_eq!(
			config.contracts.token,
			"0x88df592f8eb5d7bd38bfef7deb0fbc02cf3778a0"
				.parse::<Address>()
				.unwrap()
		);
	}

	#[test]
	fn test_placeholder_query_id_is_rejected() {
		let content = VALID_CONFIG.replace(
			"0x83a7f3d48786ac2667503a61e8c415438ed2922eb86a2906e4ee66d9a2ce4992",
			"",
		);

		match loader().load_from_str(&content) {
			Err(ConfigError::ValidationError(msg)) => assert!(msg.contains("query.id")),
			other => panic!("expected validation error, got {:?}", other),
		}
	}

	#[test]
	fn test_env_substitution() {
		env::set_var("TIPPER_CONFIG_TEST_RPC", "https://rpc.example.org");
		let content = VALID_CONFIG.replace(
			"http://localhost:8545",
			"${TIPPER_CONFIG_TEST_RPC}",
		);

		let config = loader().load_from_str(&content).unwrap();
		assert_eq!(config.network.rpc_url, "https://rpc.example.org");
	}

	#[test]
	fn test_missing_env_var_is_reported() {
		let content = VALID_CONFIG.replace(
			"http://localhost:8545",
			"${TIPPER_CONFIG_TEST_DEFINITELY_UNSET}",
		);

		assert!(matches!(
			loader().load_from_str(&content),
			Err(ConfigError::EnvVarNotFound(name)) if name == "TIPPER_CONFIG_TEST_DEFINITELY_UNSET"
		));
	}

	#[test]
	fn test_env_override_rpc_url() {
		env::set_var("TIPPER_OVERRIDE_TEST_RPC_URL", "https://override.example.org");
		let config = ConfigLoader::new()
			.with_env_prefix("TIPPER_OVERRIDE_TEST_")
			.load_from_str(VALID_CONFIG)
			.unwrap();

		assert_eq!(config.network.rpc_url, "https://override.example.org");
	}

	#[test]
	fn test_rejects_low_markup() {
		let content = format!("{}\n[tip]\ngas_price_markup_percent = 90\n", VALID_CONFIG);
		assert!(matches!(
			loader().load_from_str(&content),
			Err(ConfigError::ValidationError(_))
		));
	}

	#[test]
	fn test_rejects_zero_legacy_gas_limit() {
		let content = format!("{}\n[tip]\nlegacy_gas_limit = 0\n", VALID_CONFIG);
		match loader().load_from_str(&content) {
			Err(ConfigError::ValidationError(msg)) => assert!(msg.contains("legacy_gas_limit")),
			other => panic!("expected validation error, got {:?}", other),
		}
	}

	#[test]
	fn test_rejects_non_http_rpc() {
		let content = VALID_CONFIG.replace("http://localhost:8545", "ws://localhost:8546");
		assert!(matches!(
			loader().load_from_str(&content),
			Err(ConfigError::ValidationError(_))
		));
	}

	#[tokio::test]
	async fn test_load_from_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(VALID_CONFIG.as_bytes()).unwrap();

		let config = loader().with_file(file.path()).load().await.unwrap();
		assert_eq!(config.network.chain_id, 1);
	}

	#[tokio::test]
	async fn test_missing_file() {
		let result = loader()
			.with_file("/definitely/not/here/autotipper.toml")
			.load()
			.await;
		assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
	}
}
