//! In-process JSON-RPC node answering the subset of `eth_*` methods tokend uses.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use serde_json::{json, Value};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Chain id a fresh mock node reports
pub const MOCK_CHAIN_ID: u64 = 31337;

#[derive(Debug)]
struct NodeState {
    chain_id: u64,
    accounts: Vec<Address>,
    balances: HashMap<Address, U256>,
    call_results: HashMap<(Address, [u8; 4]), Bytes>,
    failures: HashMap<String, (i64, String)>,
    delay: Option<Duration>,
    block_number: u64,
    mine: bool,
    receipt_status: bool,
    transactions: Vec<(B256, Value)>,
    calls: Vec<Value>,
    request_counts: HashMap<String, usize>,
}

impl NodeState {
    fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            accounts: vec![crate::DEFAULT_ACCOUNT],
            balances: HashMap::new(),
            call_results: HashMap::new(),
            failures: HashMap::new(),
            delay: None,
            block_number: 1,
            mine: true,
            receipt_status: true,
            transactions: Vec::new(),
            calls: Vec::new(),
            request_counts: HashMap::new(),
        }
    }
}

/// A wiremock server speaking JSON-RPC with scripted chain state.
///
/// Unset balances read as zero; unscripted `eth_call`s return one zero word.
pub struct MockNode {
    server: MockServer,
    state: Arc<Mutex<NodeState>>,
}

impl MockNode {
    /// Starts a node reporting [`MOCK_CHAIN_ID`]
    pub async fn start() -> Self {
        Self::with_chain_id(MOCK_CHAIN_ID).await
    }

    /// Starts a node reporting `chain_id`
    pub async fn with_chain_id(chain_id: u64) -> Self {
        let server = MockServer::start().await;
        let state = Arc::new(Mutex::new(NodeState::new(chain_id)));

        Mock::given(method("POST"))
            .respond_with(RpcResponder {
                state: Arc::clone(&state),
            })
            .mount(&server)
            .await;

        Self { server, state }
    }

    /// HTTP endpoint of the node
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Replaces the accounts returned by `eth_accounts`
    pub fn set_accounts(&self, accounts: Vec<Address>) {
        self.lock().accounts = accounts;
    }

    /// Sets the native balance of `owner`
    pub fn set_balance(&self, owner: Address, balance: U256) {
        self.lock().balances.insert(owner, balance);
    }

    /// Scripts the return data of `eth_call` to `to` with `selector`
    pub fn set_call_result(&self, to: Address, selector: [u8; 4], data: impl Into<Bytes>) {
        self.lock().call_results.insert((to, selector), data.into());
    }

    /// Scripts an `eth_call` returning a single uint256 word
    pub fn set_call_uint(&self, to: Address, selector: [u8; 4], value: U256) {
        self.set_call_result(to, selector, value.to_be_bytes::<32>().to_vec());
    }

    /// Makes every request for `rpc_method` fail with a JSON-RPC error
    pub fn fail_method(&self, rpc_method: &str, code: i64, message: &str) {
        self.lock()
            .failures
            .insert(rpc_method.to_string(), (code, message.to_string()));
    }

    /// Delays every response by `delay`
    pub fn set_delay(&self, delay: Duration) {
        self.lock().delay = Some(delay);
    }

    /// Sets the head reported by `eth_blockNumber` and used for new receipts
    pub fn set_block_number(&self, block: u64) {
        self.lock().block_number = block;
    }

    /// When false, receipts stay unavailable as if transactions were never mined
    pub fn set_mining(&self, mine: bool) {
        self.lock().mine = mine;
    }

    /// Status reported in receipts; false marks mined transactions as failed
    pub fn set_receipt_status(&self, success: bool) {
        self.lock().receipt_status = success;
    }

    /// Transaction objects received through `eth_sendTransaction`
    pub fn sent_transactions(&self) -> Vec<Value> {
        self.lock().transactions.iter().map(|(_, tx)| tx.clone()).collect()
    }

    /// Call objects received through `eth_call`
    pub fn calls(&self) -> Vec<Value> {
        self.lock().calls.clone()
    }

    /// Number of requests received for `rpc_method`
    pub fn request_count(&self, rpc_method: &str) -> usize {
        self.lock().request_counts.get(rpc_method).copied().unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, NodeState> {
        lock(&self.state)
    }
}

fn lock(state: &Mutex<NodeState>) -> MutexGuard<'_, NodeState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct RpcResponder {
    state: Arc<Mutex<NodeState>>,
}

impl Respond for RpcResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = match serde_json::from_slice(&request.body) {
            Ok(body) => body,
            Err(e) => return ResponseTemplate::new(400).set_body_string(e.to_string()),
        };

        let mut state = lock(&self.state);
        let response = match &body {
            Value::Array(batch) => Value::Array(batch.iter().map(|req| dispatch(&mut state, req)).collect()),
            single => dispatch(&mut state, single),
        };

        let template = ResponseTemplate::new(200).set_body_json(response);
        match state.delay {
            Some(delay) => template.set_delay(delay),
            None => template,
        }
    }
}

fn dispatch(state: &mut NodeState, request: &Value) -> Value {
    let id = request.get("id").cloned().unwrap_or(Value::Null);
    let rpc_method = request.get("method").and_then(Value::as_str).unwrap_or_default();
    let params = request.get("params").cloned().unwrap_or(Value::Null);

    *state.request_counts.entry(rpc_method.to_string()).or_default() += 1;

    if let Some((code, message)) = state.failures.get(rpc_method) {
        return json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": code, "message": message },
        });
    }

    let result = match rpc_method {
        "eth_chainId" => json!(format!("{:#x}", state.chain_id)),
        "eth_accounts" => json!(state.accounts),
        "eth_blockNumber" => json!(format!("{:#x}", state.block_number)),
        "eth_getBalance" => {
            let balance = param_address(&params, 0, None)
                .and_then(|owner| state.balances.get(&owner).copied())
                .unwrap_or_default();
            json!(balance)
        }
        "eth_call" => {
            let call = params.get(0).cloned().unwrap_or(Value::Null);
            let to = param_address(&params, 0, Some("to")).unwrap_or_default();
            let input = call_input(&call);
            state.calls.push(call);

            let selector = input
                .get(..4)
                .and_then(|s| <[u8; 4]>::try_from(s).ok())
                .unwrap_or_default();
            let data = state
                .call_results
                .get(&(to, selector))
                .cloned()
                .unwrap_or_else(|| Bytes::from(vec![0u8; 32]));
            json!(data)
        }
        "eth_sendTransaction" => {
            let tx = params.get(0).cloned().unwrap_or(Value::Null);
            let nonce = state.transactions.len() as u64;
            let hash = keccak256(nonce.to_be_bytes());
            state.transactions.push((hash, tx));
            json!(hash)
        }
        "eth_getTransactionReceipt" => {
            let hash = params
                .get(0)
                .and_then(|h| serde_json::from_value::<B256>(h.clone()).ok());
            let tx = hash.and_then(|hash| {
                state
                    .transactions
                    .iter()
                    .find(|(known, _)| *known == hash)
                    .map(|(_, tx)| tx.clone())
            });
            match (hash, tx, state.mine) {
                (Some(hash), Some(tx), true) => receipt(hash, &tx, state.block_number, state.receipt_status),
                _ => Value::Null,
            }
        }
        other => {
            return json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": -32601, "message": format!("method {other} not found") },
            });
        }
    };

    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn param_address(params: &Value, index: usize, field: Option<&str>) -> Option<Address> {
    let value = params.get(index)?;
    let value = match field {
        Some(field) => value.get(field)?,
        None => value,
    };
    serde_json::from_value(value.clone()).ok()
}

fn call_input(call: &Value) -> Bytes {
    call.get("input")
        .or_else(|| call.get("data"))
        .and_then(|input| serde_json::from_value(input.clone()).ok())
        .unwrap_or_default()
}

fn receipt(hash: B256, tx: &Value, block: u64, success: bool) -> Value {
    let from = tx.get("from").cloned().unwrap_or_else(|| json!(Address::ZERO));
    let to = tx.get("to").cloned().unwrap_or(Value::Null);

    json!({
        "type": "0x2",
        "status": if success { "0x1" } else { "0x0" },
        "cumulativeGasUsed": "0xb411",
        "logs": [],
        "logsBloom": format!("0x{}", "0".repeat(512)),
        "transactionHash": hash,
        "transactionIndex": "0x0",
        "blockHash": B256::with_last_byte(0xbb),
        "blockNumber": format!("{block:#x}"),
        "gasUsed": "0xb411",
        "effectiveGasPrice": "0x3b9aca00",
        "from": from,
        "to": to,
        "contractAddress": null,
    })
}
