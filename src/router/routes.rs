// Route types and quoted legs
// This file defines pools, routes, quoted legs and the best split route
// returned by the selector
//
// Numan Thabit 2025 Nov

use crate::gas::LegGasModel;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A liquidity pool snapshot. Never mutated once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pool {
    pub address: Address,
    pub token0: Address,
    pub token1: Address,
    /// Fee tier in hundredths of a bip (3000 = 0.3%).
    pub fee: u32,
    #[serde(default)]
    pub liquidity: u128,
}

impl Pool {
    pub fn involves_token(&self, token: Address) -> bool {
        self.token0 == token || self.token1 == token
    }

    /// The token on the other side of `token`, if the pool holds it.
    pub fn other_token(&self, token: Address) -> Option<Address> {
        if self.token0 == token {
            Some(self.token1)
        } else if self.token1 == token {
            Some(self.token0)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    V3,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::V3 => f.write_str("V3"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeType {
    ExactInput,
    ExactOutput,
}

impl TradeType {
    /// Exact-in quotes are outputs (more is better); exact-out quotes are inputs.
    pub fn is_better(self, candidate: U256, incumbent: U256) -> bool {
        match self {
            TradeType::ExactInput => candidate > incumbent,
            TradeType::ExactOutput => candidate < incumbent,
        }
    }

    /// Fold a cost expressed in the quote token into a quote.
    pub fn adjust_for_cost(self, quote: U256, cost: U256) -> U256 {
        match self {
            TradeType::ExactInput => quote.saturating_sub(cost),
            TradeType::ExactOutput => quote.saturating_add(cost),
        }
    }
}

/// Concentrated-liquidity route through one or more pools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct V3Route {
    pools: Vec<Pool>,
    token_path: Vec<Address>,
    input: Address,
    output: Address,
}

impl V3Route {
    /// Returns `None` unless the pools chain from `input` to `output` without
    /// revisiting a pool or a token.
    pub fn new(pools: Vec<Pool>, input: Address, output: Address) -> Option<Self> {
        if pools.is_empty() {
            return None;
        }
        let mut token_path = Vec::with_capacity(pools.len() + 1);
        token_path.push(input);
        let mut current = input;
        for (i, pool) in pools.iter().enumerate() {
            if pools[..i].iter().any(|p| p.address == pool.address) {
                return None;
            }
            let next = pool.other_token(current)?;
            if token_path.contains(&next) {
                return None;
            }
            token_path.push(next);
            current = next;
        }
        if current != output {
            return None;
        }
        Some(Self {
            pools,
            token_path,
            input,
            output,
        })
    }

    pub fn pools(&self) -> &[Pool] {
        &self.pools
    }

    pub fn token_path(&self) -> &[Address] {
        &self.token_path
    }

    pub fn input(&self) -> Address {
        self.input
    }

    pub fn output(&self) -> Address {
        self.output
    }
}

/// Route variants by protocol. Matching is exhaustive so adding a protocol
/// forces every encoder and gas model to handle it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "protocol", content = "route")]
pub enum Route {
    V3(V3Route),
}

impl Route {
    pub fn protocol(&self) -> Protocol {
        match self {
            Route::V3(_) => Protocol::V3,
        }
    }

    pub fn pools(&self) -> &[Pool] {
        match self {
            Route::V3(route) => route.pools(),
        }
    }

    pub fn pool_addresses(&self) -> Vec<Address> {
        self.pools().iter().map(|p| p.address).collect()
    }

    pub fn token_path(&self) -> &[Address] {
        match self {
            Route::V3(route) => route.token_path(),
        }
    }

    pub fn input(&self) -> Address {
        match self {
            Route::V3(route) => route.input(),
        }
    }

    pub fn output(&self) -> Address {
        match self {
            Route::V3(route) => route.output(),
        }
    }

    pub fn hops(&self) -> usize {
        self.pools().len()
    }
}

impl From<V3Route> for Route {
    fn from(route: V3Route) -> Self {
        Route::V3(route)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {:#x}", self.protocol(), self.input())?;
        for (pool, token) in self.pools().iter().zip(self.token_path().iter().skip(1)) {
            write!(
                f,
                " -- {}% [{:#x}] --> {:#x}",
                pool.fee as f64 / 10_000.0,
                pool.address,
                token
            )?;
        }
        Ok(())
    }
}

/// Inputs needed to price one (route, amount) quote.
#[derive(Debug, Clone)]
pub struct LegQuote {
    pub route: Route,
    pub percent: u32,
    pub amount: U256,
    pub raw_quote: U256,
    pub ticks_crossed: u32,
    pub quoter_gas_estimate: U256,
    pub trade_type: TradeType,
}

/// A route bound to one amount fraction together with its priced quote.
#[derive(Debug, Clone, Serialize)]
pub struct RouteWithValidQuote {
    pub route: Route,
    pub percent: u32,
    pub amount: U256,
    pub quote: U256,
    pub raw_quote: U256,
    pub quote_adjusted_for_gas: U256,
    pub gas_estimate: U256,
    pub gas_cost_in_token: U256,
    pub gas_cost_in_usd: f64,
    pub ticks_crossed: u32,
    pub pool_addresses: Vec<Address>,
    pub trade_type: TradeType,
    pub quote_token: Address,
}

impl RouteWithValidQuote {
    pub fn new<G: LegGasModel + ?Sized>(leg: LegQuote, gas_model: &G) -> Self {
        let cost = gas_model.estimate_gas_cost(&leg.route, leg.ticks_crossed, leg.quoter_gas_estimate);
        let quote_token = match leg.trade_type {
            TradeType::ExactInput => leg.route.output(),
            TradeType::ExactOutput => leg.route.input(),
        };
        let pool_addresses = leg.route.pool_addresses();
        Self {
            quote: leg.raw_quote,
            raw_quote: leg.raw_quote,
            quote_adjusted_for_gas: leg.trade_type.adjust_for_cost(leg.raw_quote, cost.gas_cost_in_token),
            gas_estimate: cost.gas_estimate,
            gas_cost_in_token: cost.gas_cost_in_token,
            gas_cost_in_usd: cost.gas_cost_in_usd,
            ticks_crossed: leg.ticks_crossed,
            pool_addresses,
            trade_type: leg.trade_type,
            quote_token,
            route: leg.route,
            percent: leg.percent,
            amount: leg.amount,
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.route.protocol()
    }
}

/// Winning split. Leg amounts sum to exactly the requested amount.
#[derive(Debug, Clone, Serialize)]
pub struct BestSwapRoute {
    pub quote: U256,
    pub quote_gas_adjusted: U256,
    pub estimated_gas_used: U256,
    pub estimated_gas_used_quote_token: U256,
    pub estimated_gas_used_usd: f64,
    pub routes: Vec<RouteWithValidQuote>,
}

/// Router output: the best split and the block its quotes were taken at.
#[derive(Debug, Clone, Serialize)]
pub struct SwapRoute {
    pub block_number: u64,
    #[serde(flatten)]
    pub best: BestSwapRoute,
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;

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
            fee: 3000,
            liquidity: 1_000_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_utils::{pool, token};
    use super::*;

    #[test]
    fn v3_route_builds_token_path() {
        let route = V3Route::new(vec![pool(1, 1, 2), pool(2, 3, 2)], token(1), token(3)).unwrap();
        assert_eq!(route.token_path(), &[token(1), token(2), token(3)]);
    }

    #[test]
    fn v3_route_rejects_broken_or_cyclic_paths() {
        assert!(V3Route::new(vec![pool(1, 1, 2), pool(2, 4, 5)], token(1), token(5)).is_none());
        assert!(V3Route::new(vec![pool(1, 1, 2), pool(2, 2, 1)], token(1), token(1)).is_none());
        assert!(V3Route::new(vec![pool(1, 1, 2)], token(1), token(3)).is_none());
    }

    #[test]
    fn trade_type_ordering() {
        let a = U256::from(10u64);
        let b = U256::from(20u64);
        assert!(TradeType::ExactInput.is_better(b, a));
        assert!(TradeType::ExactOutput.is_better(a, b));
        assert_eq!(TradeType::ExactInput.adjust_for_cost(a, b), U256::ZERO);
        assert_eq!(TradeType::ExactOutput.adjust_for_cost(a, b), U256::from(30u64));
    }
}
