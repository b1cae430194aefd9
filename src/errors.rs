// Error types and error handling module
// This file defines the chunk-level provider errors raised while quoting and
// the request-level errors surfaced to callers of the router
//
// Numan Thabit 2025 Nov

use crate::transport::executor::{ExecutorError, ExecutorErrorCode};
use thiserror::Error;

/// Unknown provider messages are cut to this many characters before logging.
const MAX_ERROR_MESSAGE_CHARS: usize = 500;

/// Failure of a single quote chunk (or of a whole attempt, for block conflicts).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("header not found for block {0}")]
    BlockHeader(u64),
    #[error("provider timed out")]
    Timeout,
    #[error("batch ran out of gas")]
    OutOfGas,
    #[error("success rate {successes}/{total} below configured minimum")]
    SuccessRate { successes: usize, total: usize },
    #[error("quotes returned from different blocks: {0:?}")]
    BlockConflict(Vec<u64>),
    #[error("unknown provider error: {0}")]
    Unknown(String),
}

impl ProviderError {
    /// Classify an executor failure. The structured code wins; message matching
    /// is only a fallback for transports that cannot report one.
    pub fn classify(err: &ExecutorError, block_number: u64) -> Self {
        match err.code {
            Some(ExecutorErrorCode::HeaderNotFound) => return Self::BlockHeader(block_number),
            Some(ExecutorErrorCode::Timeout) => return Self::Timeout,
            Some(ExecutorErrorCode::OutOfGas) => return Self::OutOfGas,
            None => {}
        }

        let message = err.message.to_ascii_lowercase();
        if message.contains("header not found") {
            Self::BlockHeader(block_number)
        } else if message.contains("timeout") {
            Self::Timeout
        } else if message.contains("out of gas") {
            Self::OutOfGas
        } else {
            Self::Unknown(err.message.chars().take(MAX_ERROR_MESSAGE_CHARS).collect())
        }
    }

    /// Stable label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BlockHeader(_) => "block_header",
            Self::Timeout => "timeout",
            Self::OutOfGas => "out_of_gas",
            Self::SuccessRate { .. } => "success_rate",
            Self::BlockConflict(_) => "block_conflict",
            Self::Unknown(_) => "unknown",
        }
    }
}

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("failed to get {failed} of {total} quote chunks after {attempts} attempts: {last}")]
    QuotesExhausted {
        failed: usize,
        total: usize,
        attempts: usize,
        last: ProviderError,
    },
    #[error("can't compute L1 gas fees: {0}")]
    GasModel(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("transport error: {0}")]
    Transport(String),
}
