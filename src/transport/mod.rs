// Transport layer
// Remote batch executor interface and the JSON-RPC multicall implementation
//
// Numan Thabit 2025 Nov

pub mod executor;
pub mod jsonrpc;

pub use executor::{BatchExecutor, BatchRequest, BatchResponse, CallResult, ExecutorError, ExecutorErrorCode};
pub use jsonrpc::JsonRpcMulticall;
