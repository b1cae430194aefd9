// Configuration management module
// This file handles loading and validation of router settings from an
// optional YAML file and environment variables
//
// Numan Thabit 2025 Nov

use crate::errors::RouterError;
use crate::gas::{CalldataL1Config, HeuristicGasConfig};
use crate::router::routes::{Pool, TradeType};
use crate::router::selector::SplitConfig;
use alloy_primitives::{Address, U256};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Environment variable naming an optional YAML config file.
pub const CONFIG_PATH_ENV: &str = "ROUTER_CONFIG";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// JSON-RPC endpoint used for eth_call batches
    pub jsonrpc_endpoint: Url,
    /// Multicall contract that fans quoter calls out
    pub multicall_address: Address,
    /// Quoter contract targeted by every call in a batch
    pub quoter_address: Address,
    /// HTTP request timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub quoter: QuoterConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    pub gas: HeuristicGasConfig,
    /// Rollup L1 data fee model (optional; L1 chains leave it unset)
    pub l1: Option<CalldataL1Config>,
    /// One-shot request for the CLI
    pub request: Option<RouteRequestConfig>,
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            builder = builder.add_source(config::File::with_name(&path).required(true));
        }
        let cfg = builder
            .add_source(config::Environment::default().separator("__"))
            .build()?;
        let app: Self = cfg.try_deserialize()?;
        app.validate()?;
        Ok(app)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let app: Self = serde_yaml::from_str(raw)?;
        app.validate()?;
        Ok(app)
    }

    pub fn validate(&self) -> Result<(), RouterError> {
        self.quoter.validate()?;
        self.routing.validate()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteRequestConfig {
    /// YAML file with the candidate pool list
    pub pools_file: PathBuf,
    pub token_in: Address,
    pub token_out: Address,
    pub amount: U256,
    pub trade_type: TradeType,
}

#[derive(Debug, Deserialize)]
struct PoolsFile {
    pools: Vec<Pool>,
}

/// Candidate pools from a YAML file with a top-level `pools` list.
pub fn load_pools(path: &Path) -> Result<Vec<Pool>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("read pools file {}", path.display()))?;
    let file: PoolsFile = serde_yaml::from_str(&raw).with_context(|| format!("parse pools file {}", path.display()))?;
    Ok(file.pools)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryOptions {
    /// Retries after the first attempt
    pub retries: usize,
    pub min_timeout_ms: u64,
    pub max_timeout_ms: u64,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            retries: 2,
            min_timeout_ms: 25,
            max_timeout_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct BatchParams {
    pub multicall_chunk: usize,
    pub gas_limit_per_call: u64,
    /// Gas the node allows a single eth_call; chunk size times per-call gas
    /// stays within it
    pub max_call_gas: u64,
    /// Minimum fraction of successful calls for a chunk to count as success
    pub quote_min_success_rate: f64,
}

impl Default for BatchParams {
    fn default() -> Self {
        Self {
            multicall_chunk: 150,
            gas_limit_per_call: 1_000_000,
            max_call_gas: 50_000_000,
            quote_min_success_rate: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FailureOverrides {
    pub gas_limit_override: u64,
    pub multicall_chunk: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RollbackConfig {
    pub enabled: bool,
    /// Block header failures tolerated before rolling the target block back
    pub attempts_before_rollback: usize,
    pub rollback_block_offset: i64,
}

impl Default for RollbackConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            attempts_before_rollback: 1,
            rollback_block_offset: -10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct BlockNumberConfig {
    pub base_block_offset: i64,
    pub rollback: RollbackConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QuoterConfig {
    pub retry_options: RetryOptions,
    pub batch_params: BatchParams,
    pub gas_error_failure_override: FailureOverrides,
    pub success_rate_failure_overrides: FailureOverrides,
    pub block_number_config: BlockNumberConfig,
    /// Per-chunk timeout in milliseconds
    pub quote_timeout_ms: u64,
}

impl Default for QuoterConfig {
    fn default() -> Self {
        Self {
            retry_options: RetryOptions::default(),
            batch_params: BatchParams::default(),
            gas_error_failure_override: FailureOverrides {
                gas_limit_override: 1_500_000,
                multicall_chunk: 100,
            },
            success_rate_failure_overrides: FailureOverrides {
                gas_limit_override: 1_300_000,
                multicall_chunk: 110,
            },
            block_number_config: BlockNumberConfig::default(),
            quote_timeout_ms: 5_000,
        }
    }
}

impl QuoterConfig {
    pub fn quote_timeout(&self) -> Duration {
        Duration::from_millis(self.quote_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), RouterError> {
        let batch = &self.batch_params;
        if batch.multicall_chunk == 0 {
            return Err(RouterError::InvalidConfig("multicall_chunk must be positive".into()));
        }
        if batch.gas_limit_per_call == 0 || batch.gas_limit_per_call > batch.max_call_gas {
            return Err(RouterError::InvalidConfig(format!(
                "gas_limit_per_call must be in 1..={}",
                batch.max_call_gas
            )));
        }
        if !(0.0..=1.0).contains(&batch.quote_min_success_rate) {
            return Err(RouterError::InvalidConfig(format!(
                "quote_min_success_rate {} outside [0, 1]",
                batch.quote_min_success_rate
            )));
        }
        for (name, o) in [
            ("gas_error_failure_override", &self.gas_error_failure_override),
            ("success_rate_failure_overrides", &self.success_rate_failure_overrides),
        ] {
            if o.multicall_chunk == 0 || o.multicall_chunk > batch.multicall_chunk {
                return Err(RouterError::InvalidConfig(format!(
                    "{name}.multicall_chunk must be in 1..={}",
                    batch.multicall_chunk
                )));
            }
            if o.gas_limit_override < batch.gas_limit_per_call {
                return Err(RouterError::InvalidConfig(format!(
                    "{name}.gas_limit_override must not be below gas_limit_per_call"
                )));
            }
            if o.gas_limit_override > batch.max_call_gas {
                return Err(RouterError::InvalidConfig(format!(
                    "{name}.gas_limit_override exceeds max_call_gas {}",
                    batch.max_call_gas
                )));
            }
        }
        if self.retry_options.min_timeout_ms > self.retry_options.max_timeout_ms {
            return Err(RouterError::InvalidConfig("min_timeout_ms exceeds max_timeout_ms".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Step of the amount ladder in percent; must divide 100
    pub distribution_percent: u32,
    pub max_hops: usize,
    pub min_splits: usize,
    pub max_splits: usize,
    pub force_cross_protocol: bool,
    /// Stop the split search early once extra splits stop paying off.
    pub stop_on_diminishing_returns: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            distribution_percent: 5,
            max_hops: 3,
            min_splits: 1,
            max_splits: 3,
            force_cross_protocol: false,
            stop_on_diminishing_returns: true,
        }
    }
}

impl RoutingConfig {
    pub fn split_config(&self) -> SplitConfig {
        SplitConfig {
            min_splits: self.min_splits,
            max_splits: self.max_splits,
            force_cross_protocol: self.force_cross_protocol,
            stop_on_diminishing_returns: self.stop_on_diminishing_returns,
        }
    }

    pub fn validate(&self) -> Result<(), RouterError> {
        let step = self.distribution_percent;
        if step == 0 || step > 100 || 100 % step != 0 {
            return Err(RouterError::InvalidConfig(format!(
                "distribution_percent {step} must divide 100"
            )));
        }
        if self.max_hops == 0 {
            return Err(RouterError::InvalidConfig("max_hops must be positive".into()));
        }
        if self.min_splits == 0 || self.min_splits > self.max_splits {
            return Err(RouterError::InvalidConfig(format!(
                "invalid split bounds {}..={}",
                self.min_splits, self.max_splits
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
jsonrpc_endpoint: "http://localhost:8545"
multicall_address: "0x1F98415757620B543A52E61c46B32eB19261F984"
quoter_address: "0x61fFE014bA17989E743c5F6cB21bF9697530B21e"
gas:
  gas_price_wei: "0x3b9aca00"
  quote_per_native: "0xde0b6b3a7640000"
"#;

    #[test]
    fn yaml_config_fills_defaults() {
        let cfg = AppConfig::from_yaml_str(MINIMAL).unwrap();
        assert_eq!(cfg.quoter.batch_params, BatchParams::default());
        assert_eq!(cfg.quoter.gas_error_failure_override.multicall_chunk, 100);
        assert_eq!(cfg.routing.distribution_percent, 5);
        assert_eq!(cfg.gas.cost_per_hop, 80_000);
        assert!(cfg.l1.is_none());
        assert!(!cfg.quoter.block_number_config.rollback.enabled);
    }

    #[test]
    fn nested_overrides_parse() {
        let raw = format!(
            "{MINIMAL}quoter:\n  batch_params:\n    multicall_chunk: 80\n    gas_limit_per_call: 700000\n    quote_min_success_rate: 0.5\n  gas_error_failure_override:\n    gas_limit_override: 900000\n    multicall_chunk: 40\n  success_rate_failure_overrides:\n    gas_limit_override: 800000\n    multicall_chunk: 60\nrouting:\n  distribution_percent: 10\n  max_splits: 4\n"
        );
        let cfg = AppConfig::from_yaml_str(&raw).unwrap();
        assert_eq!(cfg.quoter.batch_params.multicall_chunk, 80);
        assert_eq!(cfg.routing.max_splits, 4);
        assert_eq!(cfg.routing.max_hops, 3);
    }

    #[test]
    fn pools_file_parses() {
        let path = std::env::temp_dir().join(format!("ultra-router-pools-{}.yaml", std::process::id()));
        std::fs::write(
            &path,
            r#"
pools:
  - address: "0x8ad599c3A0ff1De082011EFDDc58f1908eb6e6D8"
    token0: "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"
    token1: "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
    fee: 3000
"#,
        )
        .unwrap();
        let pools = load_pools(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(pools.len(), 1);
        assert_eq!(pools[0].fee, 3000);
        assert_eq!(pools[0].liquidity, 0);
    }

    #[test]
    fn rejects_ladder_that_does_not_divide_100() {
        let routing = RoutingConfig {
            distribution_percent: 30,
            ..Default::default()
        };
        assert!(routing.validate().is_err());
    }

    #[test]
    fn rejects_overrides_that_grow_chunks() {
        let mut quoter = QuoterConfig::default();
        quoter.gas_error_failure_override.multicall_chunk = 500;
        assert!(quoter.validate().is_err());
        assert!(QuoterConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_per_call_gas_over_call_budget() {
        let mut quoter = QuoterConfig::default();
        quoter.batch_params.max_call_gas = 900_000;
        assert!(quoter.validate().is_err());

        let mut quoter = QuoterConfig::default();
        quoter.batch_params.max_call_gas = 1_400_000;
        // gas override of 1.5M no longer fits one call
        assert!(quoter.validate().is_err());
    }
}
