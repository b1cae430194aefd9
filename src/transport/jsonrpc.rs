// JSON-RPC transport layer implementation
// This file implements a batch executor that packs quoter calls into a single
// multicall eth_call against an EVM node over HTTP
//
// Numan Thabit 2025 Nov

use crate::metrics::{REQ_ERRORS, REQ_LATENCY};
use crate::transport::executor::{
    BatchExecutor, BatchRequest, BatchResponse, CallResult, ExecutorError, ExecutorErrorCode,
};
use alloy_primitives::{Address, U256};
use alloy_sol_types::{sol, SolCall};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::{Duration, Instant};
use tracing::debug;

sol! {
    interface IUniswapInterfaceMulticall {
        struct Call {
            address target;
            uint256 gasLimit;
            bytes callData;
        }

        struct CallOutcome {
            bool success;
            uint256 gasUsed;
            bytes returnData;
        }

        function multicall(Call[] memory calls)
            external
            returns (uint256 blockNumber, CallOutcome[] memory returnData);
    }
}

/// Gas granted to the multicall wrapper itself on top of the per-call limits.
const MULTICALL_OVERHEAD_GAS: u64 = 200_000;

#[derive(Debug, Clone)]
pub struct JsonRpcMulticall {
    http: Client,
    url: String,
    multicall: Address,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

impl JsonRpcMulticall {
    pub fn new(url: impl Into<String>, multicall: Address, timeout: Duration) -> Result<Self, ExecutorError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExecutorError::message(format!("http client: {e}")))?;
        Ok(Self {
            http,
            url: url.into(),
            multicall,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.url
    }

    async fn call(&self, method: &'static str, params: serde_json::Value) -> Result<String, ExecutorError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let started = Instant::now();
        let result = self.send(&payload).await;
        REQ_LATENCY
            .with_label_values(&["jsonrpc", method])
            .observe(started.elapsed().as_secs_f64());
        if result.is_err() {
            REQ_ERRORS.with_label_values(&["jsonrpc", method]).inc();
        }
        result
    }

    async fn send(&self, payload: &serde_json::Value) -> Result<String, ExecutorError> {
        let resp = self
            .http
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(transport_error)?;
        if !resp.status().is_success() {
            return Err(ExecutorError::message(format!("http {}", resp.status())));
        }
        let body: RpcResponse = resp.json().await.map_err(transport_error)?;
        if let Some(err) = body.error {
            return Err(rpc_error(err));
        }
        body.result
            .ok_or_else(|| ExecutorError::message("rpc response missing result"))
    }
}

impl BatchExecutor for JsonRpcMulticall {
    async fn latest_block_number(&self) -> Result<u64, ExecutorError> {
        let raw = self.call("eth_blockNumber", json!([])).await?;
        u64::from_str_radix(raw.trim_start_matches("0x"), 16)
            .map_err(|e| ExecutorError::message(format!("decode block number {raw}: {e}")))
    }

    async fn execute_batch(&self, request: BatchRequest<'_>) -> Result<BatchResponse, ExecutorError> {
        let calls: Vec<IUniswapInterfaceMulticall::Call> = request
            .calls
            .iter()
            .map(|data| IUniswapInterfaceMulticall::Call {
                target: request.target,
                gasLimit: U256::from(request.gas_limit_per_call),
                callData: data.clone(),
            })
            .collect();
        let data = IUniswapInterfaceMulticall::multicallCall { calls }.abi_encode();
        let total_gas = request
            .gas_limit_per_call
            .saturating_mul(request.calls.len() as u64)
            .saturating_add(MULTICALL_OVERHEAD_GAS);

        debug!(
            function = request.function_name,
            calls = request.calls.len(),
            block = request.block_number,
            gas_limit_per_call = request.gas_limit_per_call,
            "sending multicall batch"
        );

        let raw = self
            .call(
                "eth_call",
                json!([
                    {
                        "to": format!("{:#x}", self.multicall),
                        "data": format!("0x{}", hex::encode(&data)),
                        "gas": format!("0x{total_gas:x}"),
                    },
                    format!("0x{:x}", request.block_number),
                ]),
            )
            .await?;

        let bytes = hex::decode(raw.trim_start_matches("0x"))
            .map_err(|e| ExecutorError::message(format!("decode eth_call hex: {e}")))?;
        let decoded = IUniswapInterfaceMulticall::multicallCall::abi_decode_returns(&bytes)
            .map_err(|e| ExecutorError::message(format!("decode multicall result: {e}")))?;

        let block_number = u64::try_from(decoded.blockNumber)
            .map_err(|_| ExecutorError::message("multicall block number overflows u64"))?;
        let mut approx_gas_used = 0u64;
        let results = decoded
            .returnData
            .into_iter()
            .map(|outcome| {
                approx_gas_used =
                    approx_gas_used.saturating_add(u64::try_from(outcome.gasUsed).unwrap_or(u64::MAX));
                CallResult {
                    success: outcome.success,
                    gas_used: outcome.gasUsed,
                    return_data: outcome.returnData,
                }
            })
            .collect();

        Ok(BatchResponse {
            block_number,
            results,
            approx_gas_used,
        })
    }
}

fn transport_error(err: reqwest::Error) -> ExecutorError {
    if err.is_timeout() {
        ExecutorError::new(ExecutorErrorCode::Timeout, err.to_string())
    } else {
        ExecutorError::message(format!("jsonrpc send: {err}"))
    }
}

/// Geth-style nodes report these conditions only through the message text.
fn rpc_error(err: RpcErrorBody) -> ExecutorError {
    let lowered = err.message.to_ascii_lowercase();
    let code = if lowered.contains("header not found") {
        Some(ExecutorErrorCode::HeaderNotFound)
    } else if lowered.contains("out of gas") {
        Some(ExecutorErrorCode::OutOfGas)
    } else if lowered.contains("timeout") || lowered.contains("timed out") {
        Some(ExecutorErrorCode::Timeout)
    } else {
        None
    };
    ExecutorError {
        code,
        message: format!("rpc error {}: {}", err.code, err.message),
    }
}
