// Quoter module - batched on-chain quoting
// This file wires the call encoding, chunking and retry policy behind the
// quote batch engine
//
// Numan Thabit 2025 Nov

pub mod chunks;
pub mod encoding;
pub mod engine;
pub mod retry;

pub use engine::{AmountQuote, QuoteBatchEngine, QuoteBatchResult, QuoteOptions};
pub use retry::{CallParams, RetryDecision, RetryState};
