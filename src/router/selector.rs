// Split route selection
// Breadth-first search over combinations of quoted legs whose percents sum
// to 100, never reusing a pool across legs, keeping the best gas-adjusted
// combination including the L1 data fee
//
// Numan Thabit 2025 Nov

use crate::errors::RouterError;
use crate::gas::L1GasModel;
use crate::metrics::{SECOND_SEED_WINS, SELECTION_LATENCY, SPLIT_LAYER_SIZE};
use crate::router::heap::TopK;
use crate::router::routes::{BestSwapRoute, Protocol, RouteWithValidQuote, TradeType};
use alloy_primitives::{Address, U256};
use futures::future::try_join_all;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, info};

/// Combinations tracked per split layer.
const TOP_PER_LAYER: usize = 3;
/// Single-leg routes from the 100% bucket seeded into the first layer's tracker.
const FULL_AMOUNT_SEEDS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitConfig {
    pub min_splits: usize,
    pub max_splits: usize,
    /// Only consider splits that mix protocols.
    pub force_cross_protocol: bool,
    /// Stop once a layer past the second adds no legs to the incumbent.
    pub stop_on_diminishing_returns: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            min_splits: 1,
            max_splits: 3,
            force_cross_protocol: false,
            stop_on_diminishing_returns: true,
        }
    }
}

/// Partial combination waiting to be extended.
struct Node<'a> {
    legs: Vec<&'a RouteWithValidQuote>,
    percent_index: usize,
    remaining: u32,
    pools_used: HashSet<Address>,
    protocols: HashSet<Protocol>,
    /// Seeded from a bucket's second-best leg.
    special: bool,
}

impl<'a> Node<'a> {
    fn seed(leg: &'a RouteWithValidQuote, percent_index: usize, special: bool) -> Self {
        Self {
            legs: vec![leg],
            percent_index,
            remaining: 100u32.saturating_sub(leg.percent),
            pools_used: leg.pool_addresses.iter().copied().collect(),
            protocols: HashSet::from([leg.protocol()]),
            special,
        }
    }

    fn extend(&self, leg: &'a RouteWithValidQuote, percent_index: usize) -> Self {
        let mut legs = self.legs.clone();
        legs.push(leg);
        let mut pools_used = self.pools_used.clone();
        pools_used.extend(leg.pool_addresses.iter().copied());
        let mut protocols = self.protocols.clone();
        protocols.insert(leg.protocol());
        Self {
            legs,
            percent_index,
            remaining: self.remaining.saturating_sub(leg.percent),
            pools_used,
            protocols,
            special: self.special,
        }
    }

    /// First leg in `bucket` sharing no pool with this node.
    fn first_compatible(&self, bucket: &[&'a RouteWithValidQuote], force_cross_protocol: bool) -> Option<&'a RouteWithValidQuote> {
        let single_protocol = force_cross_protocol && self.protocols.len() == 1;
        bucket.iter().copied().find(|leg| {
            if leg.pool_addresses.iter().any(|p| self.pools_used.contains(p)) {
                return false;
            }
            !(single_protocol && self.protocols.contains(&leg.protocol()))
        })
    }
}

/// Completed combination waiting for its L1 fee.
struct Candidate<'a> {
    legs: Vec<&'a RouteWithValidQuote>,
    special: bool,
}

pub struct RouteSelector<L> {
    l1_gas_model: L,
    config: SplitConfig,
}

impl<L: L1GasModel> RouteSelector<L> {
    pub fn new(l1_gas_model: L, config: SplitConfig) -> Self {
        Self { l1_gas_model, config }
    }

    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    /// Best split of `amount` over the quoted legs, or `None` when no
    /// combination reaches 100%.
    ///
    /// `quotes_by_percent` maps each percent of `percents` to the legs quoted
    /// at that fraction. Gas-model failures abort the search.
    #[tracing::instrument(skip_all, fields(amount = %amount, trade_type = ?trade_type))]
    pub async fn best_swap_route(
        &self,
        amount: U256,
        percents: &[u32],
        quotes_by_percent: &HashMap<u32, Vec<RouteWithValidQuote>>,
        trade_type: TradeType,
    ) -> Result<Option<BestSwapRoute>, RouterError> {
        let _timer = SELECTION_LATENCY.start_timer();
        let config = self.config;

        let buckets: Vec<Vec<&RouteWithValidQuote>> = percents
            .iter()
            .map(|percent| {
                let mut bucket: Vec<&RouteWithValidQuote> =
                    quotes_by_percent.get(percent).map(|legs| legs.iter().collect()).unwrap_or_default();
                bucket.sort_by(|a, b| match trade_type {
                    TradeType::ExactInput => b.quote_adjusted_for_gas.cmp(&a.quote_adjusted_for_gas),
                    TradeType::ExactOutput => a.quote_adjusted_for_gas.cmp(&b.quote_adjusted_for_gas),
                });
                bucket
            })
            .collect();

        let mut best: Option<(U256, Vec<&RouteWithValidQuote>)> = None;
        let mut top = TopK::new(TOP_PER_LAYER, trade_type);

        if config.min_splits <= 1 && !config.force_cross_protocol {
            if let Some(full) = percents.iter().position(|p| *p == 100) {
                let seeds = self.full_amount_seeds(&buckets[full], trade_type).await?;
                best = seeds.first().cloned();
                for (quote, legs) in seeds {
                    top.push(quote, legs);
                }
            }
        }

        let mut queue: VecDeque<Node> = VecDeque::new();
        for (i, bucket) in buckets.iter().enumerate().rev() {
            if let Some(first) = bucket.first() {
                queue.push_back(Node::seed(first, i, false));
            }
            if let Some(second) = bucket.get(1) {
                queue.push_back(Node::seed(second, i, true));
            }
        }

        let mut splits = 1usize;
        while !queue.is_empty() {
            log_layer(splits, &mut top);
            let layer = queue.len();
            splits += 1;

            // another split rarely helps when the last one did not
            if let Some((_, legs)) = best.as_ref().filter(|_| config.stop_on_diminishing_returns) {
                if splits >= 3 && legs.len() < splits - 1 {
                    debug!(splits, best_legs = legs.len(), "no gain from the previous split; stopping");
                    break;
                }
            }
            if splits > config.max_splits {
                debug!(max_splits = config.max_splits, "reached max splits");
                break;
            }
            SPLIT_LAYER_SIZE
                .with_label_values(&[&splits.to_string()])
                .observe(layer as f64);

            let mut completed = Vec::new();
            for node in queue.drain(..).collect::<Vec<_>>() {
                for i in (0..=node.percent_index).rev() {
                    let percent = percents[i];
                    if percent > node.remaining {
                        continue;
                    }
                    let Some(leg) = node.first_compatible(&buckets[i], config.force_cross_protocol) else {
                        continue;
                    };
                    let next = node.extend(leg, i);
                    if next.remaining == 0 && splits >= config.min_splits {
                        completed.push(Candidate {
                            legs: next.legs,
                            special: next.special,
                        });
                    } else if next.remaining > 0 {
                        queue.push_back(next);
                    }
                }
            }

            let quotes = try_join_all(
                completed
                    .iter()
                    .map(|candidate| self.l1_adjusted_quote(&candidate.legs, trade_type)),
            )
            .await?;

            for (candidate, quote) in completed.into_iter().zip(quotes) {
                top.push(quote, candidate.legs.clone());
                let improves = match &best {
                    Some((incumbent, _)) => trade_type.is_better(quote, *incumbent),
                    None => true,
                };
                if improves {
                    if candidate.special {
                        SECOND_SEED_WINS.inc();
                    }
                    best = Some((quote, candidate.legs));
                }
            }
        }
        log_layer(splits, &mut top);

        let Some((_, legs)) = best else {
            info!(buckets = buckets.len(), "no split combination covers the full amount");
            return Ok(None);
        };
        let route = self.finalize(amount, legs, trade_type).await?;
        info!(
            legs = route.routes.len(),
            quote = %route.quote,
            quote_gas_adjusted = %route.quote_gas_adjusted,
            estimated_gas_used = %route.estimated_gas_used,
            "selected best swap route"
        );
        Ok(Some(route))
    }

    /// Best single-leg routes of the 100% bucket, scored like completed splits.
    /// The first entry is the initial incumbent.
    async fn full_amount_seeds<'a>(
        &self,
        bucket: &[&'a RouteWithValidQuote],
        trade_type: TradeType,
    ) -> Result<Vec<(U256, Vec<&'a RouteWithValidQuote>)>, RouterError> {
        let seeds: Vec<Vec<&RouteWithValidQuote>> = bucket.iter().take(FULL_AMOUNT_SEEDS).map(|leg| vec![*leg]).collect();
        let quotes = try_join_all(seeds.iter().map(|legs| self.l1_adjusted_quote(legs, trade_type))).await?;
        Ok(quotes.into_iter().zip(seeds).collect())
    }

    /// Sum of gas-adjusted leg quotes with the L1 fee folded in.
    async fn l1_adjusted_quote(&self, legs: &[&RouteWithValidQuote], trade_type: TradeType) -> Result<U256, RouterError> {
        let quote = legs
            .iter()
            .fold(U256::ZERO, |acc, leg| acc.saturating_add(leg.quote_adjusted_for_gas));
        let fees = self.l1_gas_model.calculate_l1_gas_fees(legs).await?;
        Ok(trade_type.adjust_for_cost(quote, fees.gas_cost_l1_quote_token))
    }

    async fn finalize(
        &self,
        amount: U256,
        legs: Vec<&RouteWithValidQuote>,
        trade_type: TradeType,
    ) -> Result<BestSwapRoute, RouterError> {
        let fees = self.l1_gas_model.calculate_l1_gas_fees(&legs).await?;

        let mut quote = U256::ZERO;
        let mut quote_gas_adjusted = U256::ZERO;
        let mut estimated_gas_used = fees.gas_used_l1;
        let mut estimated_gas_used_quote_token = fees.gas_cost_l1_quote_token;
        let mut estimated_gas_used_usd = fees.gas_cost_l1_usd;
        for leg in &legs {
            quote = quote.saturating_add(leg.quote);
            quote_gas_adjusted = quote_gas_adjusted.saturating_add(leg.quote_adjusted_for_gas);
            estimated_gas_used = estimated_gas_used.saturating_add(leg.gas_estimate);
            estimated_gas_used_quote_token = estimated_gas_used_quote_token.saturating_add(leg.gas_cost_in_token);
            estimated_gas_used_usd += leg.gas_cost_in_usd;
        }
        let quote_gas_adjusted = trade_type.adjust_for_cost(quote_gas_adjusted, fees.gas_cost_l1_quote_token);

        let mut routes: Vec<RouteWithValidQuote> = legs.into_iter().cloned().collect();
        routes.sort_by(|a, b| b.amount.cmp(&a.amount));
        let total = routes.iter().fold(U256::ZERO, |acc, leg| acc.saturating_add(leg.amount));
        if let Some(last) = routes.last_mut() {
            last.amount = last.amount.saturating_add(amount.saturating_sub(total));
        }

        Ok(BestSwapRoute {
            quote,
            quote_gas_adjusted,
            estimated_gas_used,
            estimated_gas_used_quote_token,
            estimated_gas_used_usd,
            routes,
        })
    }
}

fn log_layer(splits: usize, top: &mut TopK<Vec<&RouteWithValidQuote>>) {
    if top.is_empty() {
        return;
    }
    let summary: Vec<Vec<u32>> = top
        .take_sorted()
        .iter()
        .map(|legs| legs.iter().map(|leg| leg.percent).collect())
        .collect();
    debug!(splits, top = ?summary, "best combinations for split count");
}
