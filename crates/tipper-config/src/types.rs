//! Configuration types for the autotipper.

use crate::serde_helpers::{deserialize_optional_b256, deserialize_u256, serialize_u256};
use alloy::primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete autotipper configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TipperConfig {
	/// Settlement network connection
	pub network: NetworkConfig,
	/// Contract addresses on the settlement network
	pub contracts: ContractsConfig,
	/// The data feed being tipped
	pub query: QueryConfig,
	/// Price and gas quote sources
	#[serde(default)]
	pub pricing: PricingConfig,
	/// Tip sizing
	#[serde(default)]
	pub tip: TipConfig,
	/// Optional re-tip escalation
	#[serde(default)]
	pub retip: RetipConfig,
	/// Where the signing key comes from
	#[serde(default)]
	pub account: AccountConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
	/// HTTP JSON-RPC endpoint
	pub rpc_url: String,
	/// Expected chain id; checked against the node on connect
	pub chain_id: u64,
	/// Confirmations to wait for after each submitted transaction
	#[serde(default = "default_confirmations")]
	pub confirmations: u64,
	/// Seconds between receipt polls while waiting for confirmations
	#[serde(default = "default_poll_interval_secs")]
	pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContractsConfig {
	/// Autopay contract holding the tip pools
	pub autopay: Address,
	/// Oracle contract answering `getDataBefore`
	pub oracle: Address,
	/// Oracle token (ERC-20) used to fund tips
	pub token: Address,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QueryConfig {
	/// Query identifier; must be supplied per deployment
	#[serde(default, deserialize_with = "deserialize_optional_b256")]
	pub id: Option<B256>,
	/// ABI-encoded query data passed along with every tip
	#[serde(default)]
	pub data: Bytes,
}

/// A JSON quote endpoint and the JSON pointer selecting the value.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PriceEndpoint {
	/// Display name used in log lines
	pub name: String,
	pub url: String,
	/// JSON pointer (RFC 6901), e.g. `/ethereum/usd`
	pub selector: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PricingConfig {
	/// Retries after the first failed fetch
	#[serde(default = "default_max_attempts")]
	pub max_attempts: u32,
	/// Wait before the first retry; doubles for each later retry
	#[serde(default = "default_initial_backoff_secs")]
	pub initial_backoff_secs: u64,
	#[serde(default = "default_base_token_endpoint")]
	pub base_token: PriceEndpoint,
	#[serde(default = "default_oracle_token_endpoint")]
	pub oracle_token: PriceEndpoint,
	#[serde(default = "default_gas_price_endpoint")]
	pub gas_price: PriceEndpoint,
}

impl Default for PricingConfig {
	fn default() -> Self {
		Self {
			max_attempts: default_max_attempts(),
			initial_backoff_secs: default_initial_backoff_secs(),
			base_token: default_base_token_endpoint(),
			oracle_token: default_oracle_token_endpoint(),
			gas_price: default_gas_price_endpoint(),
		}
	}
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TipConfig {
	/// Profit on top of gas cost, in USD
	#[serde(default = "default_profit_margin_usd")]
	pub profit_margin_usd: f64,
	/// Requirement multiplier applied once per escalation step
	#[serde(default = "default_tip_multiplier")]
	pub multiplier: f64,
	/// Gas used by a reporter to submit a value and claim the tip
	#[serde(default = "default_total_gas_units")]
	pub total_gas_units: u64,
	/// Allowance granted to the autopay contract on top-up, in wei
	#[serde(
		default = "default_approval_amount",
		deserialize_with = "deserialize_u256",
		serialize_with = "serialize_u256"
	)]
	pub approval_amount: U256,
	/// Gas price used for the tip transaction, as a percentage of the
	/// network's suggested price
	#[serde(default = "default_gas_price_markup_percent")]
	pub gas_price_markup_percent: u64,
	/// Gas limit for legacy-priced transactions: the tip, and an approval
	/// whose gas estimate failed
	#[serde(default = "default_legacy_gas_limit")]
	pub legacy_gas_limit: u64,
}

impl Default for TipConfig {
	fn default() -> Self {
		Self {
			profit_margin_usd: default_profit_margin_usd(),
			multiplier: default_tip_multiplier(),
			total_gas_units: default_total_gas_units(),
			approval_amount: default_approval_amount(),
			gas_price_markup_percent: default_gas_price_markup_percent(),
			legacy_gas_limit: default_legacy_gas_limit(),
		}
	}
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetipConfig {
	#[serde(default)]
	pub enabled: bool,
	#[serde(default = "default_max_retips")]
	pub max_retips: u32,
	/// Wait after a tip before checking whether a report landed
	#[serde(default = "default_retip_wait_secs")]
	pub wait_secs: u64,
}

impl Default for RetipConfig {
	fn default() -> Self {
		Self {
			enabled: false,
			max_retips: default_max_retips(),
			wait_secs: default_retip_wait_secs(),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretSource {
	/// The secret name is an environment variable
	Env,
	/// The secret name is a file under `secrets_dir`
	File,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
	/// Name of the secret holding the private key
	#[serde(default = "default_secret_name")]
	pub secret: String,
	#[serde(default = "default_secret_source")]
	pub source: SecretSource,
	#[serde(default = "default_secrets_dir")]
	pub secrets_dir: PathBuf,
}

impl Default for AccountConfig {
	fn default() -> Self {
		Self {
			secret: default_secret_name(),
			source: default_secret_source(),
			secrets_dir: default_secrets_dir(),
		}
	}
}

fn default_confirmations() -> u64 {
	1
}

fn default_poll_interval_secs() -> u64 {
	5
}

fn default_max_attempts() -> u32 {
	10
}

fn default_initial_backoff_secs() -> u64 {
	5
}

fn default_base_token_endpoint() -> PriceEndpoint {
	PriceEndpoint {
		name: "ethereum".to_string(),
		url: "https://api.coingecko.com/api/v3/simple/price?ids=ethereum&vs_currencies=usd"
			.to_string(),
		selector: "/ethereum/usd".to_string(),
	}
}

fn default_oracle_token_endpoint() -> PriceEndpoint {
	PriceEndpoint {
		name: "tellor".to_string(),
		url: "https://api.coingecko.com/api/v3/simple/price?ids=tellor&vs_currencies=usd"
			.to_string(),
		selector: "/tellor/usd".to_string(),
	}
}

fn default_gas_price_endpoint() -> PriceEndpoint {
	PriceEndpoint {
		name: "gas".to_string(),
		url: "https://api.etherscan.io/api?module=gastracker&action=gasoracle&apikey=".to_string(),
		selector: "/result/FastGasPrice".to_string(),
	}
}

fn default_profit_margin_usd() -> f64 {
	2.0
}

fn default_tip_multiplier() -> f64 {
	1.10
}

fn default_total_gas_units() -> u64 {
	700_000
}

fn default_approval_amount() -> U256 {
	U256::from(10u64).pow(U256::from(21u64))
}

fn default_gas_price_markup_percent() -> u64 {
	120
}

fn default_legacy_gas_limit() -> u64 {
	300_000
}

fn default_max_retips() -> u32 {
	3
}

fn default_retip_wait_secs() -> u64 {
	300
}

fn default_secret_name() -> String {
	"RAFT_ACCOUNT".to_string()
}

fn default_secret_source() -> SecretSource {
	SecretSource::Env
}

fn default_secrets_dir() -> PathBuf {
	PathBuf::from("/run/secrets")
}
