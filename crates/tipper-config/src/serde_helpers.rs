//! Serde helpers for configuration values TOML cannot express natively.

use alloy::primitives::{B256, U256};
use serde::{Deserialize, Deserializer, Serializer};
use std::str::FromStr;

/// Deserializes a U256 from a decimal or `0x`-prefixed string.
///
/// TOML integers stop at i64, which is too small for 18-decimal amounts.
pub fn deserialize_u256<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
	D: Deserializer<'de>,
{
	let value = String::deserialize(deserializer)?;
	U256::from_str(value.trim())
		.map_err(|e| serde::de::Error::custom(format!("Invalid amount '{}': {}", value, e)))
}

/// Serializes a U256 as a decimal string.
pub fn serialize_u256<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	serializer.serialize_str(&value.to_string())
}

/// Deserializes an optional bytes32, treating an empty string as unset.
pub fn deserialize_optional_b256<'de, D>(deserializer: D) -> Result<Option<B256>, D::Error>
where
	D: Deserializer<'de>,
{
	let value = String::deserialize(deserializer)?;
	let trimmed = value.trim();
	if trimmed.is_empty() || trimmed == "0x" {
		return Ok(None);
	}

	B256::from_str(trimmed)
		.map(Some)
		.map_err(|e| serde::de::Error::custom(format!("Invalid bytes32 '{}': {}", value, e)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde::Deserialize;

	#[derive(Debug, Deserialize)]
	struct TestStruct {
		#[serde(deserialize_with = "deserialize_u256")]
		amount: U256,
		#[serde(default, deserialize_with = "deserialize_optional_b256")]
		id: Option<B256>,
	}

	#[test]
	fn test_deserialize_decimal_amount() {
		let parsed: TestStruct = toml::from_str(
			r#"
			amount = "1000000000000000000000"
			id = ""
			"#,
		)
		.unwrap();

		assert_eq!(parsed.amount, U256::from(10u64).pow(U256::from(21u64)));
		assert!(parsed.id.is_none());
	}

	#[test]
	fn test_deserialize_hex_amount_and_id() {
		let parsed: TestStruct = toml::from_str(
			r#"
			amount = "0x10"
			id = "0x83a7f3d48786ac2667503a61e8c415438ed2922eb86a2906e4ee66d9a2ce4992"
			"#,
		)
		.unwrap();

		assert_eq!(parsed.amount, U256::from(16u64));
		assert!(parsed.id.is_some());
	}

	#[test]
	fn test_rejects_garbage_amount() {
		let parsed: Result<TestStruct, _> = toml::from_str(r#"amount = "lots""#);
		assert!(parsed.is_err());
	}
}
