// Router facade
// Enumerates candidate routes, quotes them over the amount ladder, prices
// each leg and hands the quoted buckets to the split selector
//
// Numan Thabit 2025 Nov

use crate::config::RoutingConfig;
use crate::errors::RouterError;
use crate::gas::{L1GasModel, LegGasModel};
use crate::quoter::{QuoteBatchEngine, QuoteOptions};
use crate::router::paths::compute_all_routes;
use crate::router::routes::{LegQuote, Pool, Route, RouteWithValidQuote, SwapRoute, TradeType};
use crate::router::selector::RouteSelector;
use crate::transport::executor::BatchExecutor;
use alloy_primitives::{Address, U256};
use std::collections::HashMap;
use tracing::{debug, info};

/// Amount ladder: `percents[i] = (i + 1) * step` and the matching floor
/// fraction of `amount`.
pub fn amount_distribution(amount: U256, step: u32) -> Result<(Vec<u32>, Vec<U256>), RouterError> {
    if step == 0 || step > 100 || 100 % step != 0 {
        return Err(RouterError::InvalidConfig(format!(
            "distribution_percent {step} must divide 100"
        )));
    }
    let percents: Vec<u32> = (1..=100 / step).map(|i| i * step).collect();
    let amounts = percents
        .iter()
        .map(|p| amount.saturating_mul(U256::from(*p)) / U256::from(100u64))
        .collect();
    Ok((percents, amounts))
}

pub struct Router<E, G, L> {
    engine: QuoteBatchEngine<E>,
    gas_model: G,
    selector: RouteSelector<L>,
    routing: RoutingConfig,
}

impl<E, G, L> Router<E, G, L>
where
    E: BatchExecutor,
    G: LegGasModel,
    L: L1GasModel,
{
    pub fn new(engine: QuoteBatchEngine<E>, gas_model: G, l1_gas_model: L, routing: RoutingConfig) -> Result<Self, RouterError> {
        routing.validate()?;
        Ok(Self {
            engine,
            gas_model,
            selector: RouteSelector::new(l1_gas_model, routing.split_config()),
            routing,
        })
    }

    pub fn engine(&self) -> &QuoteBatchEngine<E> {
        &self.engine
    }

    /// Best way to trade `amount` of `token_in` for `token_out` across `pools`.
    /// `Ok(None)` when no route connects the tokens or no split covers the
    /// full amount.
    #[tracing::instrument(skip_all, fields(token_in = %token_in, token_out = %token_out, amount = %amount, trade_type = ?trade_type))]
    pub async fn route(
        &self,
        amount: U256,
        token_in: Address,
        token_out: Address,
        pools: &[Pool],
        trade_type: TradeType,
    ) -> Result<Option<SwapRoute>, RouterError> {
        self.route_with_options(amount, token_in, token_out, pools, trade_type, QuoteOptions::default())
            .await
    }

    pub async fn route_with_options(
        &self,
        amount: U256,
        token_in: Address,
        token_out: Address,
        pools: &[Pool],
        trade_type: TradeType,
        options: QuoteOptions,
    ) -> Result<Option<SwapRoute>, RouterError> {
        let routes: Vec<Route> = compute_all_routes(token_in, token_out, pools, self.routing.max_hops)
            .into_iter()
            .map(Route::from)
            .collect();
        if routes.is_empty() {
            info!(pools = pools.len(), "no candidate routes");
            return Ok(None);
        }

        let (percents, amounts) = amount_distribution(amount, self.routing.distribution_percent)?;
        let quotes = self.engine.get_quotes(&amounts, &routes, trade_type, options).await?;

        let mut by_percent: HashMap<u32, Vec<RouteWithValidQuote>> = HashMap::new();
        let mut dropped = 0usize;
        for (route, amount_quotes) in quotes.routes_with_quotes {
            for (percent, quote) in percents.iter().zip(amount_quotes) {
                let Some(raw_quote) = quote.quote else {
                    dropped += 1;
                    continue;
                };
                let leg = LegQuote {
                    route: route.clone(),
                    percent: *percent,
                    amount: quote.amount,
                    raw_quote,
                    ticks_crossed: quote.ticks_crossed(),
                    quoter_gas_estimate: quote.gas_estimate.unwrap_or_default(),
                    trade_type,
                };
                by_percent
                    .entry(*percent)
                    .or_default()
                    .push(RouteWithValidQuote::new(leg, &self.gas_model));
            }
        }
        debug!(
            routes = routes.len(),
            percents = percents.len(),
            dropped,
            block = quotes.block_number,
            retries = quotes.retries,
            "priced quoted legs"
        );

        let best = self
            .selector
            .best_swap_route(amount, &percents, &by_percent, trade_type)
            .await?;
        Ok(best.map(|best| SwapRoute {
            block_number: quotes.block_number,
            best,
        }))
    }
}
