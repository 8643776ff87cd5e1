//! Contract bindings and named calls.
//!
//! Calldata is encoded with `sol!` bindings and executed through whatever
//! `ChainAdapter` the facade was built with, so the same code runs against a
//! live node or the mock chain.

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use chrono::Utc;
use std::sync::Arc;
use tipper_config::ContractsConfig;
use tipper_types::{ChainAdapter, ChainError};
use tracing::{info, warn};

sol! {
	/// ERC-20 surface of the oracle token.
	interface IERC20 {
		function allowance(address owner, address spender) external view returns (uint256);
		function approve(address spender, uint256 amount) external returns (bool);
		function balanceOf(address account) external view returns (uint256);
	}

	/// Autopay contract holding per-query tip pools.
	interface IAutopay {
		function getCurrentTip(bytes32 _queryId) external view returns (uint256);
		function tip(bytes32 _queryId, uint256 _amount, bytes calldata _queryData) external;
	}

	/// Oracle lookup of the latest report at or before a timestamp.
	interface ITellorOracle {
		function getDataBefore(bytes32 _queryId, uint256 _timestamp)
			external
			view
			returns (bool _ifRetrieve, bytes memory _value, uint256 _timestampRetrieved);
	}
}

/// Result of a `getDataBefore` lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataBefore {
	pub retrieved: bool,
	pub value: Bytes,
	pub timestamp: u64,
}

/// Named calls against the token, autopay and oracle contracts.
#[derive(Clone)]
pub struct OracleContracts {
	chain: Arc<dyn ChainAdapter>,
	autopay: Address,
	oracle: Address,
	token: Address,
}

impl OracleContracts {
	pub fn new(chain: Arc<dyn ChainAdapter>, addresses: &ContractsConfig) -> Self {
		Self {
			chain,
			autopay: addresses.autopay,
			oracle: addresses.oracle,
			token: addresses.token,
		}
	}

	pub fn autopay_address(&self) -> Address {
		self.autopay
	}

	pub fn token_address(&self) -> Address {
		self.token
	}

	/// Allowance `owner` has granted the autopay contract over the oracle token.
	pub async fn allowance(&self, owner: Address) -> Result<U256, ChainError> {
		let call = IERC20::allowanceCall {
			owner,
			spender: self.autopay,
		};
		let output = self.chain.call(self.token, call.abi_encode().into()).await?;
		IERC20::allowanceCall::abi_decode_returns(&output).map_err(|e| ChainError::Decode {
			call: "allowance",
			reason: e.to_string(),
		})
	}

	pub async fn oracle_token_balance(&self, owner: Address) -> Result<U256, ChainError> {
		let call = IERC20::balanceOfCall { account: owner };
		let output = self.chain.call(self.token, call.abi_encode().into()).await?;
		IERC20::balanceOfCall::abi_decode_returns(&output).map_err(|e| ChainError::Decode {
			call: "balanceOf",
			reason: e.to_string(),
		})
	}

	/// Native currency balance used to pay for gas.
	pub async fn settlement_token_balance(&self, owner: Address) -> Result<U256, ChainError> {
		self.chain.native_balance(owner).await
	}

	/// Tip currently pooled for `query_id`.
	pub async fn current_tip(&self, query_id: B256) -> Result<U256, ChainError> {
		let call = IAutopay::getCurrentTipCall { _queryId: query_id };
		let output = self.chain.call(self.autopay, call.abi_encode().into()).await?;
		IAutopay::getCurrentTipCall::abi_decode_returns(&output).map_err(|e| ChainError::Decode {
			call: "getCurrentTip",
			reason: e.to_string(),
		})
	}

	pub async fn data_before(&self, query_id: B256, timestamp: u64) -> Result<DataBefore, ChainError> {
		let call = ITellorOracle::getDataBeforeCall {
			_queryId: query_id,
			_timestamp: U256::from(timestamp),
		};
		let output = self.chain.call(self.oracle, call.abi_encode().into()).await?;
		let decoded = ITellorOracle::getDataBeforeCall::abi_decode_returns(&output).map_err(|e| {
			ChainError::Decode {
				call: "getDataBefore",
				reason: e.to_string(),
			}
		})?;

		let timestamp = u64::try_from(decoded._timestampRetrieved).map_err(|e| ChainError::Decode {
			call: "getDataBefore",
			reason: format!("timestamp out of range: {}", e),
		})?;

		Ok(DataBefore {
			retrieved: decoded._ifRetrieve,
			value: decoded._value,
			timestamp,
		})
	}

	/// Timestamp of the latest report for `query_id` at or before now.
	///
	/// A failed lookup is logged and reported as 0, meaning "no prior report
	/// known".
	pub async fn last_report_time(&self, query_id: B256) -> u64 {
		let now = Utc::now().timestamp().max(0) as u64;
		match self.data_before(query_id, now).await {
			Ok(data) => {
				info!(last_report_time = data.timestamp, "Read last report time");
				data.timestamp
			}
			Err(e) => {
				warn!(error = %e, "Error getting data before, assuming no prior report");
				0
			}
		}
	}

	pub fn approve_calldata(&self, amount: U256) -> Bytes {
		IERC20::approveCall {
			spender: self.autopay,
			amount,
		}
		.abi_encode()
		.into()
	}

	pub fn tip_calldata(&self, query_id: B256, amount: U256, query_data: &Bytes) -> Bytes {
		IAutopay::tipCall {
			_queryId: query_id,
			_amount: amount,
			_queryData: query_data.clone(),
		}
		.abi_encode()
		.into()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::mock::{MockChain, QUERY_ID};

	fn contracts(chain: Arc<MockChain>) -> OracleContracts {
		OracleContracts::new(chain, &MockChain::contracts())
	}

	#[tokio::test]
	async fn test_reads_round_trip_through_abi() {
		let chain = Arc::new(MockChain::funded());
		chain.update(|s| {
			s.allowance = U256::from(42u64);
			s.oracle_token_balance = U256::from(7u64);
			s.current_tip = U256::from(3u64);
			s.latest_report = Some(1_700_000_123);
		});
		let contracts = contracts(chain.clone());
		let owner = Address::repeat_byte(0x11);

		assert_eq!(contracts.allowance(owner).await.unwrap(), U256::from(42u64));
		assert_eq!(contracts.oracle_token_balance(owner).await.unwrap(), U256::from(7u64));
		assert_eq!(contracts.current_tip(QUERY_ID).await.unwrap(), U256::from(3u64));

		let data = contracts.data_before(QUERY_ID, 1_800_000_000).await.unwrap();
		assert!(data.retrieved);
		assert_eq!(data.timestamp, 1_700_000_123);
	}

	#[tokio::test]
	async fn test_last_report_time_defaults_to_zero_on_error() {
		let chain = Arc::new(MockChain::funded());
		chain.update(|s| s.latest_report = None);

		assert_eq!(contracts(chain).last_report_time(QUERY_ID).await, 0);
	}

	#[test]
	fn test_calldata_selectors() {
		let chain = Arc::new(MockChain::funded());
		let contracts = contracts(chain);

		let approve = contracts.approve_calldata(U256::from(1u64));
		assert_eq!(&approve[..4], IERC20::approveCall::SELECTOR.as_slice());

		let tip = contracts.tip_calldata(QUERY_ID, U256::from(1u64), &Bytes::new());
		assert_eq!(&tip[..4], IAutopay::tipCall::SELECTOR.as_slice());

		let decoded = IAutopay::tipCall::abi_decode(&tip).unwrap();
		assert_eq!(decoded._queryId, QUERY_ID);
		assert_eq!(decoded._amount, U256::from(1u64));
	}
}
