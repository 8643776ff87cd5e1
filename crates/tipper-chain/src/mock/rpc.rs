//! HTTP JSON-RPC node for exercising `AlloyAdapter` end to end.
//!
//! Answers the handful of methods the adapter uses from a mutable state,
//! records every method called and keeps the raw transactions it was sent.

use alloy::consensus::TxEnvelope;
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{keccak256, Address, Bytes, B256};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, MutexGuard};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

#[derive(Debug, Clone)]
pub struct RpcNodeState {
	pub chain_id: u64,
	/// Answer to `eth_estimateGas`; `None` reverts the estimate.
	pub gas_estimate: Option<u64>,
	pub gas_price: u128,
	pub nonce: u64,
	/// Receipt polls answered with `null` before the receipt shows up.
	pub pending_polls: usize,
	pub receipt_block: u64,
	pub receipt_success: bool,
	/// Next `eth_blockNumber` answer; advances by one per call.
	pub block_number: u64,
	pub methods: Vec<String>,
	pub raw_transactions: Vec<Bytes>,
}

impl Default for RpcNodeState {
	fn default() -> Self {
		Self {
			chain_id: 1,
			gas_estimate: Some(60_000),
			gas_price: 20_000_000_000,
			nonce: 7,
			pending_polls: 0,
			receipt_block: 100,
			receipt_success: true,
			block_number: 100,
			methods: Vec::new(),
			raw_transactions: Vec::new(),
		}
	}
}

pub struct RpcNode {
	server: MockServer,
	state: Arc<Mutex<RpcNodeState>>,
}

impl RpcNode {
	pub async fn start() -> Self {
		let server = MockServer::start().await;
		let state = Arc::new(Mutex::new(RpcNodeState::default()));

		Mock::given(method("POST"))
			.respond_with(JsonRpcResponder {
				state: state.clone(),
			})
			.mount(&server)
			.await;

		Self { server, state }
	}

	pub fn url(&self) -> String {
		self.server.uri()
	}

	pub fn update(&self, f: impl FnOnce(&mut RpcNodeState)) {
		f(&mut lock(&self.state));
	}

	pub fn snapshot(&self) -> RpcNodeState {
		lock(&self.state).clone()
	}

	/// Methods called so far, in order.
	pub fn methods(&self) -> Vec<String> {
		lock(&self.state).methods.clone()
	}

	pub fn calls(&self, rpc_method: &str) -> usize {
		lock(&self.state)
			.methods
			.iter()
			.filter(|m| m.as_str() == rpc_method)
			.count()
	}

	/// Decoded envelopes of every `eth_sendRawTransaction`.
	pub fn sent_transactions(&self) -> Vec<TxEnvelope> {
		lock(&self.state)
			.raw_transactions
			.iter()
			.filter_map(|raw| TxEnvelope::decode_2718(&mut raw.as_ref()).ok())
			.collect()
	}
}

fn lock(state: &Mutex<RpcNodeState>) -> MutexGuard<'_, RpcNodeState> {
	state.lock().unwrap_or_else(|e| e.into_inner())
}

fn quantity(n: impl Into<u128>) -> String {
	format!("{:#x}", n.into())
}

struct JsonRpcResponder {
	state: Arc<Mutex<RpcNodeState>>,
}

impl JsonRpcResponder {
	fn answer(&self, rpc_method: &str, params: &Value) -> Result<Value, Value> {
		let mut state = lock(&self.state);
		state.methods.push(rpc_method.to_string());

		match rpc_method {
			"eth_chainId" => Ok(json!(quantity(state.chain_id))),
			"eth_estimateGas" => match state.gas_estimate {
				Some(gas) => Ok(json!(quantity(gas))),
				None => Err(json!({"code": 3, "message": "execution reverted"})),
			},
			"eth_gasPrice" => Ok(json!(quantity(state.gas_price))),
			"eth_getTransactionCount" => Ok(json!(quantity(state.nonce))),
			"eth_blockNumber" => {
				let current = state.block_number;
				state.block_number += 1;
				Ok(json!(quantity(current)))
			}
			"eth_sendRawTransaction" => {
				let raw = params[0]
					.as_str()
					.and_then(|s| hex::decode(s.trim_start_matches("0x")).ok())
					.ok_or_else(|| json!({"code": -32602, "message": "invalid raw transaction"}))?;
				let hash = keccak256(&raw);
				state.raw_transactions.push(raw.into());
				state.nonce += 1;
				Ok(json!(hash))
			}
			"eth_getTransactionReceipt" => {
				if state.pending_polls > 0 {
					state.pending_polls -= 1;
					return Ok(Value::Null);
				}
				Ok(receipt(&params[0], &state))
			}
			other => Err(json!({"code": -32601, "message": format!("method {} not found", other)})),
		}
	}
}

fn receipt(hash: &Value, state: &RpcNodeState) -> Value {
	json!({
		"transactionHash": hash,
		"transactionIndex": "0x0",
		"blockHash": B256::repeat_byte(0xbb),
		"blockNumber": quantity(state.receipt_block),
		"from": Address::repeat_byte(0xf0),
		"to": Address::repeat_byte(0x70),
		"cumulativeGasUsed": "0xea60",
		"gasUsed": "0xea60",
		"effectiveGasPrice": quantity(state.gas_price),
		"contractAddress": null,
		"logs": [],
		"logsBloom": format!("0x{}", "00".repeat(256)),
		"type": "0x0",
		"status": if state.receipt_success { "0x1" } else { "0x0" },
	})
}

impl Respond for JsonRpcResponder {
	fn respond(&self, request: &Request) -> ResponseTemplate {
		let body: Value = match serde_json::from_slice(&request.body) {
			Ok(body) => body,
			Err(_) => return ResponseTemplate::new(400),
		};
		let id = body["id"].clone();
		let rpc_method = body["method"].as_str().unwrap_or_default();

		let response = match self.answer(rpc_method, &body["params"]) {
			Ok(result) => json!({"jsonrpc": "2.0", "id": id, "result": result}),
			Err(error) => json!({"jsonrpc": "2.0", "id": id, "error": error}),
		};
		ResponseTemplate::new(200).set_body_json(response)
	}
}
