// Shared fixtures for integration tests: a scripted in-memory batch executor
// and pool/route builders

#![allow(dead_code)]

use alloy_primitives::{Address, Bytes, U160, U256};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use ultra_router::quoter::encoding::{encode_quote_call, encode_quote_result, DecodedQuote};
use ultra_router::router::{Pool, Route, TradeType};
use ultra_router::transport::{BatchExecutor, BatchRequest, BatchResponse, CallResult, ExecutorError};

pub const LATEST_BLOCK: u64 = 1_000;

/// What the next `execute_batch` call does. Batches with no step left answer
/// normally.
#[derive(Debug, Clone)]
pub enum Step {
    Respond,
    Fail(ExecutorError),
    AtBlock(u64),
    /// Mark the first `n` calls of the batch as reverted.
    RevertFirst(usize),
    Hang,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedBatch {
    pub block_number: u64,
    pub gas_limit_per_call: u64,
    pub calls: usize,
}

#[derive(Default)]
pub struct ScriptedExecutor {
    quotes: HashMap<Bytes, U256>,
    script: Mutex<VecDeque<Step>>,
    batches: Mutex<Vec<RecordedBatch>>,
    block_lookups: Mutex<usize>,
    block_lookup_fails: bool,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quote(mut self, route: &Route, amount: U256, trade_type: TradeType, quote: u64) -> Self {
        self.quotes
            .insert(encode_quote_call(route, amount, trade_type), U256::from(quote));
        self
    }

    pub fn with_script(self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.script.lock().unwrap().extend(steps);
        self
    }

    pub fn with_failing_block_lookup(mut self) -> Self {
        self.block_lookup_fails = true;
        self
    }

    pub fn batches(&self) -> Vec<RecordedBatch> {
        self.batches.lock().unwrap().clone()
    }

    pub fn block_lookups(&self) -> usize {
        *self.block_lookups.lock().unwrap()
    }

    fn answer(&self, data: &Bytes) -> CallResult {
        match self.quotes.get(data) {
            Some(quote) => CallResult {
                success: true,
                gas_used: U256::from(100_000u64),
                return_data: encode_quote_result(&DecodedQuote {
                    amount: *quote,
                    sqrt_price_x96_after_list: vec![U160::from(1u64)],
                    initialized_ticks_crossed_list: vec![1],
                    gas_estimate: U256::from(100_000u64),
                }),
            },
            None => CallResult {
                success: false,
                gas_used: U256::from(30_000u64),
                return_data: Bytes::new(),
            },
        }
    }
}

impl BatchExecutor for ScriptedExecutor {
    async fn latest_block_number(&self) -> Result<u64, ExecutorError> {
        *self.block_lookups.lock().unwrap() += 1;
        if self.block_lookup_fails {
            return Err(ExecutorError::message("connection refused"));
        }
        Ok(LATEST_BLOCK)
    }

    async fn execute_batch(&self, request: BatchRequest<'_>) -> Result<BatchResponse, ExecutorError> {
        self.batches.lock().unwrap().push(RecordedBatch {
            block_number: request.block_number,
            gas_limit_per_call: request.gas_limit_per_call,
            calls: request.calls.len(),
        });
        let step = self.script.lock().unwrap().pop_front().unwrap_or(Step::Respond);

        let mut block_number = request.block_number;
        let mut reverted = 0;
        match step {
            Step::Respond => {}
            Step::Fail(err) => return Err(err),
            Step::AtBlock(block) => block_number = block,
            Step::RevertFirst(n) => reverted = n,
            Step::Hang => {
                tokio::time::sleep(Duration::from_secs(3_600)).await;
            }
        }

        let results: Vec<CallResult> = request
            .calls
            .iter()
            .enumerate()
            .map(|(i, data)| {
                if i < reverted {
                    CallResult {
                        success: false,
                        gas_used: U256::ZERO,
                        return_data: Bytes::new(),
                    }
                } else {
                    self.answer(data)
                }
            })
            .collect();
        let approx_gas_used = results.iter().map(|r| r.gas_used.to::<u64>()).sum();
        Ok(BatchResponse {
            block_number,
            results,
            approx_gas_used,
        })
    }
}

pub fn token(n: u8) -> Address {
    Address::repeat_byte(n)
}

pub fn pool(id: u8, a: u8, b: u8) -> Pool {
    let mut address = [0u8; 20];
    address[0] = 0xee;
    address[19] = id;
    Pool {
        address: Address::from(address),
        token0: token(a),
        token1: token(b),
        // parallel pools between the same tokens must encode to distinct paths
        fee: [100, 500, 3_000, 10_000][id as usize % 4],
        liquidity: 1_000_000,
    }
}

pub fn amounts(values: &[u64]) -> Vec<U256> {
    values.iter().map(|v| U256::from(*v)).collect()
}
