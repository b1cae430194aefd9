// Quote retry policy
// Folds the classified failures of one attempt into the parameters and target
// block of the next attempt
//
// Numan Thabit 2025 Nov

use crate::config::{BlockNumberConfig, FailureOverrides, QuoterConfig};
use crate::errors::ProviderError;
use crate::metrics::QUOTE_RETRIES;
use tracing::{info, warn};

/// Batch shape used for one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallParams {
    pub multicall_chunk: usize,
    pub gas_limit_per_call: u64,
}

impl CallParams {
    /// Only ever shrink chunks and raise per-call gas.
    fn tighten(&mut self, overrides: &FailureOverrides) {
        self.multicall_chunk = self.multicall_chunk.min(overrides.multicall_chunk).max(1);
        self.gas_limit_per_call = self.gas_limit_per_call.max(overrides.gas_limit_override);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryDecision {
    /// Re-run every chunk, successful ones included.
    pub retry_all: bool,
}

#[derive(Debug, Clone)]
pub struct RetryState {
    pub params: CallParams,
    pub block_number: u64,
    max_call_gas: u64,
    gas_override: FailureOverrides,
    success_rate_override: FailureOverrides,
    block_config: BlockNumberConfig,
    seen_block_conflict: bool,
    seen_out_of_gas: bool,
    seen_success_rate: bool,
    seen_block_header: bool,
    seen_timeout: bool,
    seen_unknown: bool,
    block_header_failures: usize,
    block_rolled_back: bool,
}

impl RetryState {
    pub fn new(config: &QuoterConfig, block_number: u64) -> Self {
        Self {
            params: CallParams {
                multicall_chunk: config.batch_params.multicall_chunk,
                gas_limit_per_call: config.batch_params.gas_limit_per_call,
            },
            block_number,
            max_call_gas: config.batch_params.max_call_gas,
            gas_override: config.gas_error_failure_override,
            success_rate_override: config.success_rate_failure_overrides,
            block_config: config.block_number_config,
            seen_block_conflict: false,
            seen_out_of_gas: false,
            seen_success_rate: false,
            seen_block_header: false,
            seen_timeout: false,
            seen_unknown: false,
            block_header_failures: 0,
            block_rolled_back: false,
        }
    }

    pub fn block_rolled_back(&self) -> bool {
        self.block_rolled_back
    }

    /// Largest chunk the current parameters allow: `multicall_chunk`, capped
    /// so the whole chunk fits the node's call-gas budget.
    pub fn chunk_size(&self) -> usize {
        let per_call = self.params.gas_limit_per_call.max(1);
        let fits = usize::try_from(self.max_call_gas / per_call).unwrap_or(usize::MAX);
        self.params.multicall_chunk.min(fits).max(1)
    }

    /// Apply the failures of one attempt. Each kind is reported once per
    /// request; overrides are idempotent so repeats are harmless.
    pub fn apply(&mut self, errors: &[ProviderError], attempt: usize) -> RetryDecision {
        let mut decision = RetryDecision::default();
        let mut header_failure = false;

        for error in errors {
            match error {
                ProviderError::BlockConflict(blocks) => {
                    if first(&mut self.seen_block_conflict, error) {
                        warn!(attempt, ?blocks, "quotes came from different blocks; retrying all chunks");
                    }
                    decision.retry_all = true;
                }
                ProviderError::OutOfGas => {
                    if first(&mut self.seen_out_of_gas, error) {
                        warn!(
                            attempt,
                            gas_limit_override = self.gas_override.gas_limit_override,
                            multicall_chunk = self.gas_override.multicall_chunk,
                            "chunk ran out of gas; applying gas override"
                        );
                    }
                    self.params.tighten(&self.gas_override);
                    decision.retry_all = true;
                }
                ProviderError::SuccessRate { successes, total } => {
                    if first(&mut self.seen_success_rate, error) {
                        warn!(
                            attempt,
                            successes,
                            total,
                            gas_limit_override = self.success_rate_override.gas_limit_override,
                            multicall_chunk = self.success_rate_override.multicall_chunk,
                            "chunk success rate too low; applying success rate override"
                        );
                    }
                    self.params.tighten(&self.success_rate_override);
                    decision.retry_all = true;
                }
                ProviderError::BlockHeader(block) => {
                    if first(&mut self.seen_block_header, error) {
                        warn!(attempt, block, "provider missing block header");
                    }
                    header_failure = true;
                }
                ProviderError::Timeout => {
                    first(&mut self.seen_timeout, error);
                }
                ProviderError::Unknown(message) => {
                    if first(&mut self.seen_unknown, error) {
                        warn!(attempt, %message, "unknown quote chunk failure");
                    }
                }
            }
        }

        if header_failure {
            self.block_header_failures += 1;
            let rollback = &self.block_config.rollback;
            if rollback.enabled
                && !self.block_rolled_back
                && self.block_header_failures >= rollback.attempts_before_rollback
            {
                let from = self.block_number;
                self.block_number = from.saturating_add_signed(rollback.rollback_block_offset);
                self.block_rolled_back = true;
                decision.retry_all = true;
                info!(
                    attempt,
                    from,
                    to = self.block_number,
                    "rolled back target block after header failures"
                );
            }
        }

        decision
    }
}

fn first(seen: &mut bool, error: &ProviderError) -> bool {
    if *seen {
        return false;
    }
    *seen = true;
    QUOTE_RETRIES.with_label_values(&[error.kind()]).inc();
    true
}
