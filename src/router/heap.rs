// Bounded best-K tracker
// Keeps the K best split combinations seen in a search layer, evicting the
// worst in O(log K)
//
// Numan Thabit 2025 Nov

use crate::router::routes::TradeType;
use alloy_primitives::U256;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

struct Ranked<T> {
    score: U256,
    seq: u64,
    item: T,
}

impl<T> PartialEq for Ranked<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Ranked<T> {}

impl<T> PartialOrd for Ranked<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Ranked<T> {
    // higher score ranks higher; on ties the earlier entry wins
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .cmp(&other.score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Min-heap of at most `capacity` entries ranked by quote for `trade_type`.
pub struct TopK<T> {
    capacity: usize,
    trade_type: TradeType,
    heap: BinaryHeap<Reverse<Ranked<T>>>,
    seq: u64,
}

impl<T> TopK<T> {
    pub fn new(capacity: usize, trade_type: TradeType) -> Self {
        Self {
            capacity,
            trade_type,
            heap: BinaryHeap::with_capacity(capacity + 1),
            seq: 0,
        }
    }

    fn score(&self, quote: U256) -> U256 {
        match self.trade_type {
            TradeType::ExactInput => quote,
            TradeType::ExactOutput => U256::MAX - quote,
        }
    }

    pub fn push(&mut self, quote: U256, item: T) {
        if self.capacity == 0 {
            return;
        }
        let ranked = Ranked {
            score: self.score(quote),
            seq: self.seq,
            item,
        };
        self.seq += 1;
        if self.heap.len() < self.capacity {
            self.heap.push(Reverse(ranked));
            return;
        }
        if let Some(mut worst) = self.heap.peek_mut() {
            if ranked > worst.0 {
                *worst = Reverse(ranked);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Remove every entry, returned best first.
    pub fn take_sorted(&mut self) -> Vec<T> {
        // ascending Reverse order is descending rank
        std::mem::take(&mut self.heap)
            .into_sorted_vec()
            .into_iter()
            .map(|r| r.0.item)
            .collect()
    }
}
