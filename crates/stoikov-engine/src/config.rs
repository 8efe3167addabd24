//! Engine configuration.
//!
//! Loaded from TOML; every field has a default so a missing file or a
//! partial file still yields a runnable engine.

use crate::error::{EngineError, EngineResult};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Where ticks come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedMode {
    /// Live exchange book-ticker stream.
    #[default]
    Live,
    /// Seeded Brownian generator.
    Backtest,
}

/// A-S model parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoterConfig {
    /// Risk aversion (gamma).
    #[serde(default = "default_gamma")]
    pub gamma: f64,
    /// Baseline annualised volatility (sigma).
    #[serde(default = "default_sigma")]
    pub sigma: f64,
    /// Time horizon in seconds (T).
    #[serde(default = "default_time_horizon")]
    pub time_horizon: f64,
    /// Order-arrival intensity (kappa).
    #[serde(default = "default_kappa")]
    pub kappa: f64,
}

impl Default for QuoterConfig {
    fn default() -> Self {
        Self {
            gamma: default_gamma(),
            sigma: default_sigma(),
            time_horizon: default_time_horizon(),
            kappa: default_kappa(),
        }
    }
}

/// Volatility estimator parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityConfig {
    /// EWMA smoothing factor.
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Lower bound on the reported volatility.
    #[serde(default = "default_vol_floor")]
    pub vol_floor: f64,
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            vol_floor: default_vol_floor(),
        }
    }
}

/// Risk supervisor parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSection {
    /// Maximum absolute position before controls saturate.
    #[serde(default = "default_max_inventory")]
    pub max_inventory: Decimal,
    /// Halt once total P&L falls to or below this level.
    #[serde(default = "default_kill_floor")]
    pub kill_floor: Decimal,
    /// Spread inflation scale.
    #[serde(default = "default_max_spread_multiplier")]
    pub max_spread_multiplier: Decimal,
}

impl Default for RiskSection {
    fn default() -> Self {
        Self {
            max_inventory: default_max_inventory(),
            kill_floor: default_kill_floor(),
            max_spread_multiplier: default_max_spread_multiplier(),
        }
    }
}

/// Pipeline cadence and fill-model parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSection {
    /// Quote every k-th tick.
    #[serde(default = "default_quote_every_k")]
    pub quote_every_k: u64,
    /// Enqueue telemetry every k-th tick.
    #[serde(default = "default_telemetry_every_k")]
    pub telemetry_every_k: u64,
    /// Log a status block every k-th tick.
    #[serde(default = "default_status_every_k")]
    pub status_every_k: u64,
    /// Base probability of a passive fill per quote.
    #[serde(default = "default_base_fill_probability")]
    pub base_fill_probability: f64,
    /// Relative distance within which our quote counts as competitive.
    #[serde(default = "default_competitive_eps")]
    pub competitive_eps: Decimal,
    /// Size of each simulated passive fill.
    #[serde(default = "default_fill_size")]
    pub fill_size: Decimal,
    /// Maker fee on fill notional, in basis points; negative is a rebate.
    #[serde(default = "default_maker_fee_bps")]
    pub maker_fee_bps: Decimal,
    /// RNG seed for the passive fill model.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            quote_every_k: default_quote_every_k(),
            telemetry_every_k: default_telemetry_every_k(),
            status_every_k: default_status_every_k(),
            base_fill_probability: default_base_fill_probability(),
            competitive_eps: default_competitive_eps(),
            fill_size: default_fill_size(),
            maker_fee_bps: default_maker_fee_bps(),
            seed: default_seed(),
        }
    }
}

/// Feed selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default)]
    pub mode: FeedMode,
    /// Live stream URL.
    #[serde(default = "default_ws_url")]
    pub url: String,
    /// Symbol to trade (canonical form).
    #[serde(default = "default_symbol")]
    pub symbol: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            mode: FeedMode::default(),
            url: default_ws_url(),
            symbol: default_symbol(),
        }
    }
}

/// Backtest generator parameters (used when `feed.mode = "backtest"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    #[serde(default = "default_initial_price")]
    pub initial_price: f64,
    #[serde(default = "default_sim_volatility")]
    pub annual_volatility: f64,
    #[serde(default = "default_sim_spread_bps")]
    pub spread_bps: f64,
    #[serde(default = "default_time_step_secs")]
    pub time_step_secs: f64,
    #[serde(default = "default_num_ticks")]
    pub num_ticks: u64,
    #[serde(default = "default_aggressive_fill_bonus")]
    pub aggressive_fill_bonus: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_price: default_initial_price(),
            annual_volatility: default_sim_volatility(),
            spread_bps: default_sim_spread_bps(),
            time_step_secs: default_time_step_secs(),
            num_ticks: default_num_ticks(),
            aggressive_fill_bonus: default_aggressive_fill_bonus(),
            seed: default_seed(),
        }
    }
}

/// Persistence parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Directory for the table files.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Records per write batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Bound on the in-flight telemetry queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            batch_size: default_batch_size(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Telemetry parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySection {
    /// Collect latency samples.
    #[serde(default = "default_true")]
    pub latency_enabled: bool,
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            latency_enabled: default_true(),
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub quoter: QuoterConfig,
    #[serde(default)]
    pub volatility: VolatilityConfig,
    #[serde(default)]
    pub risk: RiskSection,
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub backtest: BacktestConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub telemetry: TelemetrySection,
}

impl EngineConfig {
    /// Resolve the config path (flag > `STOIKOV_CONFIG` > default) and load
    /// it, falling back to defaults when the file does not exist.
    pub fn load(cli_path: Option<&str>) -> EngineResult<Self> {
        let path = cli_path
            .map(str::to_string)
            .or_else(|| std::env::var("STOIKOV_CONFIG").ok())
            .unwrap_or_else(|| "config/default.toml".to_string());

        if Path::new(&path).exists() {
            Self::from_file(&path)
        } else {
            tracing::warn!(path, "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("failed to read {path}: {e}")))?;
        toml::from_str(&content)
            .map_err(|e| EngineError::Config(format!("failed to parse {path}: {e}")))
    }
}

fn default_gamma() -> f64 {
    0.1
}
fn default_sigma() -> f64 {
    0.05
}
fn default_time_horizon() -> f64 {
    60.0
}
fn default_kappa() -> f64 {
    1.5
}
fn default_alpha() -> f64 {
    0.15
}
fn default_vol_floor() -> f64 {
    0.02
}
fn default_max_inventory() -> Decimal {
    dec!(0.1)
}
fn default_kill_floor() -> Decimal {
    dec!(-10)
}
fn default_max_spread_multiplier() -> Decimal {
    dec!(3)
}
fn default_quote_every_k() -> u64 {
    10
}
fn default_telemetry_every_k() -> u64 {
    10
}
fn default_status_every_k() -> u64 {
    100
}
fn default_base_fill_probability() -> f64 {
    0.05
}
fn default_competitive_eps() -> Decimal {
    dec!(0.001)
}
fn default_fill_size() -> Decimal {
    dec!(0.01)
}
fn default_maker_fee_bps() -> Decimal {
    dec!(-1)
}
fn default_seed() -> u64 {
    42
}
fn default_ws_url() -> String {
    "wss://data-stream.binance.vision/ws/btcusdt@bookTicker".to_string()
}
fn default_symbol() -> String {
    "BTCUSDT".to_string()
}
fn default_initial_price() -> f64 {
    45_000.0
}
fn default_sim_volatility() -> f64 {
    0.025
}
fn default_sim_spread_bps() -> f64 {
    5.0
}
fn default_time_step_secs() -> f64 {
    1.0
}
fn default_num_ticks() -> u64 {
    10_000
}
fn default_aggressive_fill_bonus() -> f64 {
    0.5
}
fn default_data_dir() -> String {
    "./data".to_string()
}
fn default_batch_size() -> usize {
    50
}
fn default_queue_capacity() -> usize {
    1024
}
fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_spec() {
        let config = EngineConfig::default();
        assert_eq!(config.quoter.gamma, 0.1);
        assert_eq!(config.quoter.sigma, 0.05);
        assert_eq!(config.quoter.time_horizon, 60.0);
        assert_eq!(config.quoter.kappa, 1.5);
        assert_eq!(config.volatility.alpha, 0.15);
        assert_eq!(config.volatility.vol_floor, 0.02);
        assert_eq!(config.risk.max_inventory, dec!(0.1));
        assert_eq!(config.risk.kill_floor, dec!(-10));
        assert_eq!(config.risk.max_spread_multiplier, dec!(3));
        assert_eq!(config.engine.quote_every_k, 10);
        assert_eq!(config.engine.base_fill_probability, 0.05);
        assert_eq!(config.engine.maker_fee_bps, dec!(-1));
        assert_eq!(config.persistence.batch_size, 50);
        assert_eq!(config.feed.mode, FeedMode::Live);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let toml_str = r#"
[quoter]
gamma = 0.2

[feed]
mode = "backtest"
"#;
        let config: EngineConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.quoter.gamma, 0.2);
        assert_eq!(config.quoter.kappa, 1.5);
        assert_eq!(config.feed.mode, FeedMode::Backtest);
        assert_eq!(config.engine.quote_every_k, 10);
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = EngineConfig::default();
        let serialized = toml::to_string(&config).unwrap();
        let back: EngineConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(back, config);
    }
}
