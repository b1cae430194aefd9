use anyhow::{anyhow, bail, Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;
use ultra_router::config::{load_pools, AppConfig};
use ultra_router::gas::{CalldataL1GasModel, HeuristicGasModel, L1GasModel, NoL1GasModel};
use ultra_router::quoter::QuoteBatchEngine;
use ultra_router::router::Router;
use ultra_router::transport::JsonRpcMulticall;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing().context("initialize tracing subscriber")?;

    if let Err(err) = run().await {
        tracing::error!(error = ?err, "fatal router error");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    let config = AppConfig::load().context("load configuration")?;
    let request = config
        .request
        .clone()
        .context("no route request configured (set request.* in the config file or REQUEST__* env vars)")?;
    let pools = load_pools(&request.pools_file)?;

    let executor = JsonRpcMulticall::new(
        config.jsonrpc_endpoint.as_str(),
        config.multicall_address,
        config.request_timeout(),
    )
    .map_err(|e| anyhow!("build JSON-RPC client for {}: {e}", config.jsonrpc_endpoint))?;
    let engine = QuoteBatchEngine::new(executor, config.quoter_address, config.quoter.clone());
    let gas_model = HeuristicGasModel::new(config.gas.clone());

    info!(
        endpoint = %config.jsonrpc_endpoint,
        pools = pools.len(),
        token_in = %request.token_in,
        token_out = %request.token_out,
        amount = %request.amount,
        trade_type = ?request.trade_type,
        "routing"
    );

    match config.l1.clone() {
        Some(l1) => route_once(&config, engine, gas_model, CalldataL1GasModel::new(l1), &pools).await,
        None => route_once(&config, engine, gas_model, NoL1GasModel, &pools).await,
    }
}

async fn route_once<L: L1GasModel>(
    config: &AppConfig,
    engine: QuoteBatchEngine<JsonRpcMulticall>,
    gas_model: HeuristicGasModel,
    l1_gas_model: L,
    pools: &[ultra_router::router::Pool],
) -> Result<()> {
    let request = config.request.as_ref().context("route request")?;
    let router = Router::new(engine, gas_model, l1_gas_model, config.routing.clone())?;

    let routed = tokio::select! {
        res = router.route(request.amount, request.token_in, request.token_out, pools, request.trade_type) => res?,
        _ = tokio::signal::ctrl_c() => bail!("interrupted"),
    };

    match routed {
        Some(route) => {
            info!(
                block = route.block_number,
                legs = route.best.routes.len(),
                quote = %route.best.quote,
                "route found"
            );
            println!("{}", serde_json::to_string_pretty(&route)?);
        }
        None => {
            info!("no route found");
            println!("null");
        }
    }
    Ok(())
}

fn init_tracing() -> Result<()> {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info,hyper=warn,reqwest=warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("tracing subscriber init: {err}"))
}
