// Quote chunk bookkeeping
// Partitions the flat call list into evenly sized chunks and tracks each
// chunk's state across attempts
//
// Numan Thabit 2025 Nov

use crate::errors::ProviderError;
use crate::transport::executor::CallResult;
use std::ops::Range;

#[derive(Debug, Clone)]
pub enum ChunkState {
    Pending,
    Success {
        block_number: u64,
        results: Vec<CallResult>,
        approx_gas_used: u64,
    },
    Failed(ProviderError),
}

#[derive(Debug, Clone)]
pub struct QuoteChunk {
    /// Indices into the flat call list
    pub range: Range<usize>,
    pub state: ChunkState,
}

impl QuoteChunk {
    pub fn is_success(&self) -> bool {
        matches!(self.state, ChunkState::Success { .. })
    }

    pub fn error(&self) -> Option<&ProviderError> {
        match &self.state {
            ChunkState::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Chunk size that spreads `total` calls evenly over the fewest chunks of at
/// most `max_chunk` calls.
pub fn normalized_chunk_size(total: usize, max_chunk: usize) -> usize {
    if total == 0 {
        return 0;
    }
    let max_chunk = max_chunk.max(1);
    let chunks = total.div_ceil(max_chunk);
    total.div_ceil(chunks)
}

/// Fresh pending chunks covering `0..total`.
pub fn partition(total: usize, max_chunk: usize) -> Vec<QuoteChunk> {
    let size = normalized_chunk_size(total, max_chunk);
    if size == 0 {
        return Vec::new();
    }
    (0..total)
        .step_by(size)
        .map(|start| QuoteChunk {
            range: start..(start + size).min(total),
            state: ChunkState::Pending,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_size_is_balanced() {
        assert_eq!(normalized_chunk_size(300, 150), 150);
        assert_eq!(normalized_chunk_size(301, 150), 101);
        assert_eq!(normalized_chunk_size(10, 150), 10);
        assert_eq!(normalized_chunk_size(0, 150), 0);
    }

    #[test]
    fn partition_covers_every_call_once() {
        let chunks = partition(301, 150);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].range, 0..101);
        assert_eq!(chunks[2].range, 202..301);
        let covered: usize = chunks.iter().map(|c| c.range.len()).sum();
        assert_eq!(covered, 301);
        assert!(chunks.iter().all(|c| matches!(c.state, ChunkState::Pending)));
    }

    #[test]
    fn empty_partition() {
        assert!(partition(0, 150).is_empty());
    }
}
