// Gas models
// Per-leg gas cost heuristics used to rank quotes, and the L1 security-fee
// model consulted for complete split combinations on rollups
//
// Numan Thabit 2025 Nov

use crate::errors::RouterError;
use crate::quoter::encoding::encode_route_to_path;
use crate::router::routes::{Route, RouteWithValidQuote};
use alloy_primitives::{Address, U256};
use serde::Deserialize;

const WEI_PER_NATIVE: u128 = 1_000_000_000_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GasCost {
    pub gas_estimate: U256,
    pub gas_cost_in_token: U256,
    pub gas_cost_in_usd: f64,
}

pub trait LegGasModel: Send + Sync {
    fn estimate_gas_cost(&self, route: &Route, ticks_crossed: u32, quoter_gas_estimate: U256) -> GasCost;
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeuristicGasConfig {
    /// Execution gas price in wei.
    pub gas_price_wei: U256,
    /// Raw quote-token units bought by one native token (1e18 wei).
    pub quote_per_native: U256,
    #[serde(default)]
    pub usd_per_native: f64,
    #[serde(default = "default_base_swap_cost")]
    pub base_swap_cost: u64,
    #[serde(default = "default_cost_per_hop")]
    pub cost_per_hop: u64,
    #[serde(default = "default_cost_per_init_tick")]
    pub cost_per_init_tick: u64,
    /// Prefer the quoter's own gas estimate when it reports one.
    #[serde(default)]
    pub use_quoter_gas_estimate: bool,
}

fn default_base_swap_cost() -> u64 {
    2_000
}

fn default_cost_per_hop() -> u64 {
    80_000
}

fn default_cost_per_init_tick() -> u64 {
    31_000
}

/// Hop and tick based gas estimate priced at a fixed gas price.
#[derive(Debug, Clone)]
pub struct HeuristicGasModel {
    config: HeuristicGasConfig,
}

impl HeuristicGasModel {
    pub fn new(config: HeuristicGasConfig) -> Self {
        Self { config }
    }

    fn gas_units(&self, route: &Route, ticks_crossed: u32, quoter_gas_estimate: U256) -> U256 {
        if self.config.use_quoter_gas_estimate && !quoter_gas_estimate.is_zero() {
            return quoter_gas_estimate;
        }
        let hops = match route {
            Route::V3(v3) => v3.pools().len() as u64,
        };
        U256::from(self.config.base_swap_cost)
            + U256::from(self.config.cost_per_hop) * U256::from(hops)
            + U256::from(self.config.cost_per_init_tick) * U256::from(ticks_crossed)
    }
}

impl LegGasModel for HeuristicGasModel {
    fn estimate_gas_cost(&self, route: &Route, ticks_crossed: u32, quoter_gas_estimate: U256) -> GasCost {
        let gas_estimate = self.gas_units(route, ticks_crossed, quoter_gas_estimate);
        let cost_wei = gas_estimate.saturating_mul(self.config.gas_price_wei);
        GasCost {
            gas_estimate,
            gas_cost_in_token: native_to_quote(cost_wei, self.config.quote_per_native),
            gas_cost_in_usd: native_to_usd(cost_wei, self.config.usd_per_native),
        }
    }
}

fn native_to_quote(wei: U256, quote_per_native: U256) -> U256 {
    wei.saturating_mul(quote_per_native) / U256::from(WEI_PER_NATIVE)
}

fn native_to_usd(wei: U256, usd_per_native: f64) -> f64 {
    wei.saturating_to::<u128>() as f64 / WEI_PER_NATIVE as f64 * usd_per_native
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct L1GasFees {
    pub gas_used_l1: U256,
    pub gas_cost_l1_usd: f64,
    pub gas_cost_l1_quote_token: U256,
}

#[allow(async_fn_in_trait)]
pub trait L1GasModel: Send + Sync {
    /// L1 data fee for submitting `legs` as one swap.
    async fn calculate_l1_gas_fees(&self, legs: &[&RouteWithValidQuote]) -> Result<L1GasFees, RouterError>;
}

/// Chains without an L1 security fee.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoL1GasModel;

impl L1GasModel for NoL1GasModel {
    async fn calculate_l1_gas_fees(&self, _legs: &[&RouteWithValidQuote]) -> Result<L1GasFees, RouterError> {
        Ok(L1GasFees::default())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalldataL1Config {
    pub l1_base_fee_wei: U256,
    pub quote_per_native: U256,
    #[serde(default)]
    pub usd_per_native: f64,
    #[serde(default = "default_fixed_overhead")]
    pub fixed_overhead: u64,
    /// Fee scalar in millionths.
    #[serde(default = "default_fee_scalar")]
    pub fee_scalar: u64,
    /// Calldata bytes for one leg beyond its encoded path.
    #[serde(default = "default_leg_overhead_bytes")]
    pub leg_overhead_bytes: u64,
}

fn default_fixed_overhead() -> u64 {
    188
}

fn default_fee_scalar() -> u64 {
    684_000
}

fn default_leg_overhead_bytes() -> u64 {
    196
}

const L1_GAS_PER_CALLDATA_BYTE: u64 = 16;

/// Rollup L1 fee estimated from the calldata size of the swap.
#[derive(Debug, Clone)]
pub struct CalldataL1GasModel {
    config: CalldataL1Config,
}

impl CalldataL1GasModel {
    pub fn new(config: CalldataL1Config) -> Self {
        Self { config }
    }
}

impl L1GasModel for CalldataL1GasModel {
    async fn calculate_l1_gas_fees(&self, legs: &[&RouteWithValidQuote]) -> Result<L1GasFees, RouterError> {
        let first = legs
            .first()
            .ok_or_else(|| RouterError::GasModel("no legs to price".to_string()))?;
        let quote_token: Address = first.quote_token;
        if let Some(other) = legs.iter().find(|leg| leg.quote_token != quote_token) {
            return Err(RouterError::GasModel(format!(
                "legs quote different tokens: {quote_token:#x} and {:#x}",
                other.quote_token
            )));
        }

        let calldata_bytes: u64 = legs
            .iter()
            .map(|leg| encode_route_to_path(&leg.route, false).len() as u64 + self.config.leg_overhead_bytes)
            .sum();
        let gas_used_l1 = U256::from(calldata_bytes * L1_GAS_PER_CALLDATA_BYTE + self.config.fixed_overhead);
        let fee_wei = gas_used_l1
            .saturating_mul(self.config.l1_base_fee_wei)
            .saturating_mul(U256::from(self.config.fee_scalar))
            / U256::from(1_000_000u64);

        Ok(L1GasFees {
            gas_used_l1,
            gas_cost_l1_usd: native_to_usd(fee_wei, self.config.usd_per_native),
            gas_cost_l1_quote_token: native_to_quote(fee_wei, self.config.quote_per_native),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::routes::test_utils::{pool, token};
    use crate::router::routes::{LegQuote, TradeType, V3Route};

    fn heuristic() -> HeuristicGasModel {
        HeuristicGasModel::new(HeuristicGasConfig {
            gas_price_wei: U256::from(10u64),
            quote_per_native: U256::from(WEI_PER_NATIVE),
            usd_per_native: 0.0,
            base_swap_cost: 2_000,
            cost_per_hop: 80_000,
            cost_per_init_tick: 31_000,
            use_quoter_gas_estimate: false,
        })
    }

    fn two_hop() -> Route {
        V3Route::new(vec![pool(1, 1, 2), pool(2, 2, 3)], token(1), token(3))
            .unwrap()
            .into()
    }

    #[test]
    fn heuristic_counts_hops_and_ticks() {
        let cost = heuristic().estimate_gas_cost(&two_hop(), 2, U256::ZERO);
        assert_eq!(cost.gas_estimate, U256::from(2_000u64 + 160_000 + 62_000));
        // one quote unit per wei at this price
        assert_eq!(cost.gas_cost_in_token, U256::from((2_000u64 + 160_000 + 62_000) * 10));
    }

    #[test]
    fn quoter_estimate_used_when_enabled() {
        let mut model = heuristic();
        model.config.use_quoter_gas_estimate = true;
        let cost = model.estimate_gas_cost(&two_hop(), 2, U256::from(123_456u64));
        assert_eq!(cost.gas_estimate, U256::from(123_456u64));
    }

    fn leg(route: Route, trade_type: TradeType) -> RouteWithValidQuote {
        RouteWithValidQuote::new(
            LegQuote {
                route,
                percent: 100,
                amount: U256::from(1_000u64),
                raw_quote: U256::from(900u64),
                ticks_crossed: 0,
                quoter_gas_estimate: U256::ZERO,
                trade_type,
            },
            &heuristic(),
        )
    }

    #[tokio::test]
    async fn calldata_model_prices_legs() {
        let model = CalldataL1GasModel::new(CalldataL1Config {
            l1_base_fee_wei: U256::from(1_000u64),
            quote_per_native: U256::from(WEI_PER_NATIVE),
            usd_per_native: 0.0,
            fixed_overhead: 188,
            fee_scalar: 1_000_000,
            leg_overhead_bytes: 0,
        });
        let a = leg(two_hop(), TradeType::ExactInput);
        let fees = model.calculate_l1_gas_fees(&[&a]).await.unwrap();
        // two-hop path: 3 addresses + 2 fee tiers
        let bytes: u64 = 3 * 20 + 2 * 3;
        assert_eq!(fees.gas_used_l1, U256::from(bytes * 16 + 188));
        assert_eq!(fees.gas_cost_l1_quote_token, U256::from((bytes * 16 + 188) * 1_000));
    }

    #[tokio::test]
    async fn calldata_model_rejects_mixed_quote_tokens() {
        let model = CalldataL1GasModel::new(CalldataL1Config {
            l1_base_fee_wei: U256::from(1u64),
            quote_per_native: U256::from(1u64),
            usd_per_native: 0.0,
            fixed_overhead: 0,
            fee_scalar: 1_000_000,
            leg_overhead_bytes: 0,
        });
        let a = leg(two_hop(), TradeType::ExactInput);
        let b = leg(two_hop(), TradeType::ExactOutput);
        assert!(matches!(
            model.calculate_l1_gas_fees(&[&a, &b]).await,
            Err(RouterError::GasModel(_))
        ));
        assert!(model.calculate_l1_gas_fees(&[]).await.is_err());
    }
}
