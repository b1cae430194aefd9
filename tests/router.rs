mod common;

use alloy_primitives::{Address, U256};
use common::{pool, token, ScriptedExecutor, LATEST_BLOCK};
use ultra_router::config::{QuoterConfig, RoutingConfig};
use ultra_router::gas::{HeuristicGasConfig, HeuristicGasModel, NoL1GasModel};
use ultra_router::quoter::encoding::encode_quote_call;
use ultra_router::quoter::QuoteBatchEngine;
use ultra_router::router::{compute_all_routes, Pool, Route, Router, TradeType};

const QUOTER: Address = Address::repeat_byte(0x99);

fn free_gas() -> HeuristicGasModel {
    HeuristicGasModel::new(HeuristicGasConfig {
        gas_price_wei: U256::ZERO,
        quote_per_native: U256::from(1u64),
        usd_per_native: 0.0,
        base_swap_cost: 2_000,
        cost_per_hop: 80_000,
        cost_per_init_tick: 31_000,
        use_quoter_gas_estimate: false,
    })
}

fn routing(distribution_percent: u32, max_splits: usize) -> RoutingConfig {
    RoutingConfig {
        distribution_percent,
        max_splits,
        ..Default::default()
    }
}

/// Two direct pools and one two-hop path between tokens 1 and 2.
fn pools() -> Vec<Pool> {
    vec![pool(1, 1, 2), pool(2, 1, 2), pool(3, 1, 3), pool(4, 3, 2)]
}

fn candidate_routes() -> Vec<Route> {
    compute_all_routes(token(1), token(2), &pools(), 3)
        .into_iter()
        .map(Route::from)
        .collect()
}

/// Quotes with slippage: each route gives worse prices at the full amount.
fn executor(trade_type: TradeType) -> ScriptedExecutor {
    let routes = candidate_routes();
    assert_eq!(routes.len(), 3);
    let table = match trade_type {
        TradeType::ExactInput => [(480, 700), (470, 650), (450, 600)],
        TradeType::ExactOutput => [(520, 1_300), (530, 1_350), (550, 1_400)],
    };
    routes
        .iter()
        .zip(table)
        .fold(ScriptedExecutor::new(), |executor, (route, (half, full))| {
            executor
                .with_quote(route, U256::from(500u64), trade_type, half)
                .with_quote(route, U256::from(1_000u64), trade_type, full)
        })
}

fn router(trade_type: TradeType, routing: RoutingConfig) -> Router<ScriptedExecutor, HeuristicGasModel, NoL1GasModel> {
    let engine = QuoteBatchEngine::new(executor(trade_type), QUOTER, QuoterConfig::default());
    Router::new(engine, free_gas(), NoL1GasModel, routing).unwrap()
}

#[tokio::test]
async fn splits_across_distinct_pools() {
    let router = router(TradeType::ExactInput, routing(50, 3));
    let route = router
        .route(U256::from(1_000u64), token(1), token(2), &pools(), TradeType::ExactInput)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(route.block_number, LATEST_BLOCK);
    assert_eq!(route.best.routes.len(), 2);
    assert_eq!(route.best.quote, U256::from(950u64));
    assert_eq!(route.best.quote_gas_adjusted, U256::from(950u64));

    let total = route.best.routes.iter().fold(U256::ZERO, |acc, leg| acc + leg.amount);
    assert_eq!(total, U256::from(1_000u64));

    let mut seen = std::collections::HashSet::new();
    for leg in &route.best.routes {
        for address in &leg.pool_addresses {
            assert!(seen.insert(*address), "pool {address} used twice");
        }
    }
}

#[tokio::test]
async fn exact_output_minimises_input() {
    let router = router(TradeType::ExactOutput, routing(50, 3));
    let route = router
        .route(U256::from(1_000u64), token(1), token(2), &pools(), TradeType::ExactOutput)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(route.best.routes.len(), 2);
    assert_eq!(route.best.quote, U256::from(1_050u64));
}

#[tokio::test]
async fn single_split_takes_best_full_route() {
    let router = router(TradeType::ExactInput, routing(50, 1));
    let route = router
        .route(U256::from(1_000u64), token(1), token(2), &pools(), TradeType::ExactInput)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(route.best.routes.len(), 1);
    assert_eq!(route.best.routes[0].percent, 100);
    assert_eq!(route.best.routes[0].amount, U256::from(1_000u64));
    assert_eq!(route.best.quote, U256::from(700u64));
}

#[tokio::test]
async fn disconnected_tokens_have_no_route() {
    let router = router(TradeType::ExactInput, routing(50, 3));
    let route = router
        .route(U256::from(1_000u64), token(1), token(9), &pools(), TradeType::ExactInput)
        .await
        .unwrap();
    assert!(route.is_none());
    assert!(router.engine().executor().batches().is_empty());
}

#[tokio::test]
async fn serialises_to_json() {
    let router = router(TradeType::ExactInput, routing(50, 3));
    let route = router
        .route(U256::from(1_000u64), token(1), token(2), &pools(), TradeType::ExactInput)
        .await
        .unwrap()
        .unwrap();
    let json = serde_json::to_value(&route).unwrap();
    assert_eq!(json["block_number"], LATEST_BLOCK);
    assert_eq!(json["routes"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["routes"][0]["route"]["protocol"], "V3");
}

#[test]
fn parallel_pools_quote_independently() {
    let routes = candidate_routes();
    let amount = U256::from(500u64);
    let direct: Vec<_> = routes
        .iter()
        .filter(|route| route.pool_addresses().len() == 1)
        .map(|route| encode_quote_call(route, amount, TradeType::ExactInput))
        .collect();
    assert_eq!(direct.len(), 2);
    assert_ne!(direct[0], direct[1]);
}

#[test]
fn rejects_invalid_routing_config() {
    let engine = QuoteBatchEngine::new(ScriptedExecutor::new(), QUOTER, QuoterConfig::default());
    assert!(Router::new(engine, free_gas(), NoL1GasModel, routing(30, 3)).is_err());
}
