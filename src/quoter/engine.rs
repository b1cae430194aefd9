// Batched quote engine
// Fans (route, amount) quoter calls out over concurrent multicall chunks,
// validates the chunk results and retries failures under the retry policy
//
// Numan Thabit 2025 Nov

use crate::config::QuoterConfig;
use crate::errors::{ProviderError, RouterError};
use crate::metrics::{QUOTE_APPROX_GAS_PER_CALL, QUOTE_ERRORS, QUOTE_LATENCY};
use crate::quoter::chunks::{partition, ChunkState, QuoteChunk};
use crate::quoter::encoding::{decode_quote_result, encode_quote_call, function_name};
use crate::quoter::retry::RetryState;
use crate::router::routes::{Route, TradeType};
use crate::transport::executor::{BatchExecutor, BatchRequest, CallResult};
use alloy_primitives::{Address, Bytes, U160, U256};
use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use futures::future::join_all;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct QuoteOptions {
    /// Quote at this block instead of the executor's latest.
    pub block_number: Option<u64>,
}

/// Quote for one amount on one route. `quote` is `None` when that call
/// failed or returned data that does not decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountQuote {
    pub amount: U256,
    pub quote: Option<U256>,
    pub sqrt_price_x96_after_list: Vec<U160>,
    pub initialized_ticks_crossed_list: Vec<u32>,
    pub gas_estimate: Option<U256>,
}

impl AmountQuote {
    fn failed(amount: U256) -> Self {
        Self {
            amount,
            quote: None,
            sqrt_price_x96_after_list: Vec::new(),
            initialized_ticks_crossed_list: Vec::new(),
            gas_estimate: None,
        }
    }

    pub fn ticks_crossed(&self) -> u32 {
        self.initialized_ticks_crossed_list.iter().copied().sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct QuoteBatchResult {
    /// One entry per input route, in input order, each with one quote per amount.
    pub routes_with_quotes: Vec<(Route, Vec<AmountQuote>)>,
    pub block_number: u64,
    pub approx_gas_used: u64,
    pub retries: usize,
}

pub struct QuoteBatchEngine<E> {
    executor: E,
    quoter_address: Address,
    config: QuoterConfig,
}

impl<E: BatchExecutor> QuoteBatchEngine<E> {
    pub fn new(executor: E, quoter_address: Address, config: QuoterConfig) -> Self {
        Self {
            executor,
            quoter_address,
            config,
        }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn config(&self) -> &QuoterConfig {
        &self.config
    }

    /// Quote every route at every amount.
    ///
    /// The latest-block lookup runs once before any chunk and is not retried;
    /// its failure is returned as `RouterError::Transport`.
    #[tracing::instrument(skip_all, fields(routes = routes.len(), amounts = amounts.len(), trade_type = ?trade_type))]
    pub async fn get_quotes(
        &self,
        amounts: &[U256],
        routes: &[Route],
        trade_type: TradeType,
        options: QuoteOptions,
    ) -> Result<QuoteBatchResult, RouterError> {
        if routes.is_empty() || amounts.is_empty() {
            debug!("nothing to quote");
            return Ok(QuoteBatchResult {
                block_number: options.block_number.unwrap_or_default(),
                ..Default::default()
            });
        }
        let _timer = QUOTE_LATENCY.start_timer();

        let calls: Vec<Bytes> = routes
            .iter()
            .flat_map(|route| amounts.iter().map(move |amount| encode_quote_call(route, *amount, trade_type)))
            .collect();

        let base_block = match options.block_number {
            Some(block) => block,
            None => self
                .executor
                .latest_block_number()
                .await
                .map_err(|e| RouterError::Transport(format!("latest block number: {e}")))?,
        };
        let offset = self.config.block_number_config.base_block_offset;
        let mut state = RetryState::new(&self.config, base_block.saturating_add_signed(offset));
        let mut chunks = partition(calls.len(), state.chunk_size());

        let retry = &self.config.retry_options;
        let attempts = retry.retries + 1;
        let mut backoff = ExponentialBackoff {
            initial_interval: Duration::from_millis(retry.min_timeout_ms),
            max_interval: Duration::from_millis(retry.max_timeout_ms),
            max_elapsed_time: None,
            multiplier: 2.0,
            ..Default::default()
        };
        backoff.reset();
        let mut last_error = None;
        let (mut failed, mut total) = (0, chunks.len());

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = backoff
                    .next_backoff()
                    .unwrap_or(Duration::from_millis(retry.max_timeout_ms));
                tokio::time::sleep(delay).await;
            }

            let pending = chunks.iter().filter(|c| !c.is_success()).count();
            debug!(
                attempt,
                block = state.block_number,
                pending,
                chunks = chunks.len(),
                chunk_size = state.chunk_size(),
                gas_limit_per_call = state.params.gas_limit_per_call,
                "running quote attempt"
            );
            self.run_pending(&mut chunks, &calls, trade_type, &state).await;

            let mut errors: Vec<ProviderError> = chunks.iter().filter_map(|c| c.error().cloned()).collect();
            let blocks: BTreeSet<u64> = chunks
                .iter()
                .filter_map(|c| match &c.state {
                    ChunkState::Success { block_number, .. } => Some(*block_number),
                    _ => None,
                })
                .collect();
            if blocks.len() > 1 {
                errors.push(ProviderError::BlockConflict(blocks.into_iter().collect()));
            }

            if errors.is_empty() {
                let result = assemble(routes, amounts, trade_type, &chunks, attempt);
                info!(
                    block = result.block_number,
                    calls = calls.len(),
                    retries = result.retries,
                    approx_gas_used = result.approx_gas_used,
                    "quotes fetched"
                );
                return Ok(result);
            }

            for error in &errors {
                QUOTE_ERRORS.with_label_values(&[error.kind()]).inc();
            }
            warn!(
                attempt,
                failed = errors.len(),
                chunks = chunks.len(),
                kinds = ?errors.iter().map(ProviderError::kind).collect::<Vec<_>>(),
                "quote attempt failed"
            );

            failed = chunks.iter().filter(|c| !c.is_success()).count();
            total = chunks.len();
            let decision = state.apply(&errors, attempt);
            last_error = errors.pop();
            if decision.retry_all {
                chunks = partition(calls.len(), state.chunk_size());
            } else {
                for chunk in chunks.iter_mut().filter(|c| !c.is_success()) {
                    chunk.state = ChunkState::Pending;
                }
            }
        }

        Err(RouterError::QuotesExhausted {
            failed,
            total,
            attempts,
            last: last_error.unwrap_or_else(|| ProviderError::Unknown("no attempts made".to_string())),
        })
    }

    async fn run_pending(&self, chunks: &mut [QuoteChunk], calls: &[Bytes], trade_type: TradeType, state: &RetryState) {
        let function = function_name(trade_type);
        let tasks = chunks.iter_mut().filter(|c| !c.is_success()).map(move |chunk| async move {
            let request = BatchRequest {
                target: self.quoter_address,
                function_name: function,
                calls: &calls[chunk.range.clone()],
                block_number: state.block_number,
                gas_limit_per_call: state.params.gas_limit_per_call,
            };
            chunk.state = self.execute_chunk(request).await;
        });
        join_all(tasks).await;
    }

    async fn execute_chunk(&self, request: BatchRequest<'_>) -> ChunkState {
        let block = request.block_number;
        let total = request.calls.len();
        let response = match tokio::time::timeout(self.config.quote_timeout(), self.executor.execute_batch(request)).await {
            Err(_) => return ChunkState::Failed(ProviderError::Timeout),
            Ok(Err(err)) => {
                let error = ProviderError::classify(&err, block);
                debug!(block, kind = error.kind(), error = %err, "quote chunk failed");
                return ChunkState::Failed(error);
            }
            Ok(Ok(response)) => response,
        };

        if response.results.len() != total {
            return ChunkState::Failed(ProviderError::Unknown(format!(
                "expected {total} call results, got {}",
                response.results.len()
            )));
        }
        let successes = response.results.iter().filter(|r| r.success).count();
        if (successes as f64) < self.config.batch_params.quote_min_success_rate * total as f64 {
            return ChunkState::Failed(ProviderError::SuccessRate { successes, total });
        }
        if successes > 0 {
            QUOTE_APPROX_GAS_PER_CALL.observe(response.approx_gas_used as f64 / successes as f64);
        }
        ChunkState::Success {
            block_number: response.block_number,
            results: response.results,
            approx_gas_used: response.approx_gas_used,
        }
    }
}

/// Chunks cover the call list contiguously and in order, so concatenating
/// their results restores route-major call order.
fn assemble(
    routes: &[Route],
    amounts: &[U256],
    trade_type: TradeType,
    chunks: &[QuoteChunk],
    retries: usize,
) -> QuoteBatchResult {
    let mut block_number = 0;
    let mut approx_gas_used = 0u64;
    let mut results: Vec<&CallResult> = Vec::with_capacity(routes.len() * amounts.len());
    for chunk in chunks {
        if let ChunkState::Success {
            block_number: block,
            results: chunk_results,
            approx_gas_used: gas,
        } = &chunk.state
        {
            block_number = *block;
            approx_gas_used = approx_gas_used.saturating_add(*gas);
            results.extend(chunk_results);
        }
    }

    let mut results = results.into_iter();
    let routes_with_quotes = routes
        .iter()
        .map(|route| {
            let quotes = amounts
                .iter()
                .map(|amount| match results.next() {
                    Some(result) => to_amount_quote(*amount, result, trade_type),
                    None => AmountQuote::failed(*amount),
                })
                .collect();
            (route.clone(), quotes)
        })
        .collect();

    QuoteBatchResult {
        routes_with_quotes,
        block_number,
        approx_gas_used,
        retries,
    }
}

fn to_amount_quote(amount: U256, result: &CallResult, trade_type: TradeType) -> AmountQuote {
    if !result.success {
        return AmountQuote::failed(amount);
    }
    match decode_quote_result(trade_type, &result.return_data) {
        Some(decoded) => AmountQuote {
            amount,
            quote: Some(decoded.amount),
            sqrt_price_x96_after_list: decoded.sqrt_price_x96_after_list,
            initialized_ticks_crossed_list: decoded.initialized_ticks_crossed_list,
            gas_estimate: Some(decoded.gas_estimate),
        },
        None => AmountQuote::failed(amount),
    }
}
