// Remote batch executor interface
// The quote engine's only network dependency: anything able to run a batch of
// calls against one contract at a given block satisfies it
//
// Numan Thabit 2025 Nov

use alloy_primitives::{Address, Bytes, U256};
use std::fmt;

/// Structured failure reasons an executor can report without string matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorErrorCode {
    HeaderNotFound,
    Timeout,
    OutOfGas,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorError {
    pub code: Option<ExecutorErrorCode>,
    pub message: String,
}

impl ExecutorError {
    pub fn new(code: ExecutorErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{code:?}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ExecutorError {}

/// One batch of calls against `target`, all evaluated at `block_number`.
#[derive(Debug, Clone)]
pub struct BatchRequest<'a> {
    pub target: Address,
    pub function_name: &'static str,
    pub calls: &'a [Bytes],
    pub block_number: u64,
    pub gas_limit_per_call: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallResult {
    pub success: bool,
    pub gas_used: U256,
    pub return_data: Bytes,
}

#[derive(Debug, Clone)]
pub struct BatchResponse {
    pub block_number: u64,
    pub results: Vec<CallResult>,
    pub approx_gas_used: u64,
}

#[allow(async_fn_in_trait)]
pub trait BatchExecutor: Send + Sync {
    /// Latest block the executor can serve.
    async fn latest_block_number(&self) -> Result<u64, ExecutorError>;

    /// Run every call of the batch in one round trip. Individual call failures
    /// are reported per result; an `Err` means the whole batch failed.
    async fn execute_batch(&self, request: BatchRequest<'_>) -> Result<BatchResponse, ExecutorError>;
}
