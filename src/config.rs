use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Run configuration. Every section has defaults so experiments can start
/// from an empty file and override only what they sweep.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backtest: BacktestConfig,
    pub breakout: BreakoutWindows,
    pub band: BandConfig,
    pub factor: FactorConfig,
    pub logging: LoggingConfig,
}

/// Execution-cost and accounting knobs shared by both engines.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Fractional price penalty applied on entry (+) and exit (-).
    pub slippage: f64,
    /// Proportional fee on traded notional (portfolio engine only).
    pub fee: f64,
    pub initial_cash: f64,
    /// Ticks carried forward unchanged before the state machine runs.
    pub warmup_ticks: usize,
    /// |exposure| below this counts as flat for the portfolio engine.
    pub flat_band: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            slippage: 0.0,
            fee: 0.00075,
            initial_cash: 10_000.0,
            warmup_ticks: 100,
            flat_band: 0.2,
        }
    }
}

/// Lookback windows of the breakout feature builder.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BreakoutWindows {
    pub channel_slow: usize,
    pub channel_mid: usize,
    pub channel_fast: usize,
    pub ma_fast: usize,
    pub ma_exit: usize,
    pub ma_trend: usize,
    pub growth: usize,
}

impl Default for BreakoutWindows {
    fn default() -> Self {
        Self {
            channel_slow: 55,
            channel_mid: 25,
            channel_fast: 15,
            ma_fast: 7,
            ma_exit: 30,
            ma_trend: 90,
            growth: 10,
        }
    }
}

/// ATR-envelope strategy parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BandConfig {
    pub atr_period: usize,
    pub atr_mult: f64,
    pub ema_period: usize,
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            atr_period: 14,
            atr_mult: 2.0,
            ema_period: 20,
        }
    }
}

/// Alpha-factor quantile strategy parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FactorConfig {
    pub quantiles: usize,
}

impl Default for FactorConfig {
    fn default() -> Self {
        Self { quantiles: 10 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load from a TOML file, or fall back to all defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p)
                    .with_context(|| format!("failed to read {}", p.display()))?;
                toml::from_str(&raw).with_context(|| format!("failed to parse {}", p.display()))?
            }
            None => Config::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.backtest.slippage < 0.0 {
            bail!("backtest.slippage must be >= 0");
        }
        if self.backtest.fee < 0.0 {
            bail!("backtest.fee must be >= 0");
        }
        if self.backtest.initial_cash <= 0.0 {
            bail!("backtest.initial_cash must be > 0");
        }
        if !(0.0..1.0).contains(&self.backtest.flat_band) {
            bail!("backtest.flat_band must be in [0, 1)");
        }
        let w = &self.breakout;
        for (name, v) in [
            ("channel_slow", w.channel_slow),
            ("channel_mid", w.channel_mid),
            ("channel_fast", w.channel_fast),
            ("ma_fast", w.ma_fast),
            ("ma_exit", w.ma_exit),
            ("ma_trend", w.ma_trend),
            ("growth", w.growth),
        ] {
            if v == 0 {
                bail!("breakout.{} must be > 0", name);
            }
        }
        if self.band.atr_period == 0 || self.band.ema_period == 0 {
            bail!("band periods must be > 0");
        }
        if self.band.atr_mult <= 0.0 {
            bail!("band.atr_mult must be > 0");
        }
        if self.factor.quantiles < 2 {
            bail!("factor.quantiles must be >= 2");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.breakout.channel_slow, 55);
        assert_eq!(config.backtest.warmup_ticks, 100);
        assert!((config.backtest.flat_band - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_toml_overrides_defaults() {
        let toml_str = r#"
[backtest]
slippage = 0.001
initial_cash = 5000.0

[breakout]
channel_slow = 40

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!((config.backtest.slippage - 0.001).abs() < f64::EPSILON);
        assert!((config.backtest.initial_cash - 5000.0).abs() < f64::EPSILON);
        // Untouched fields keep their defaults.
        assert!((config.backtest.fee - 0.00075).abs() < f64::EPSILON);
        assert_eq!(config.breakout.channel_slow, 40);
        assert_eq!(config.breakout.channel_mid, 25);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn rejects_negative_slippage() {
        let mut config = Config::default();
        config.backtest.slippage = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_window() {
        let mut config = Config::default();
        config.breakout.ma_trend = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_single_quantile() {
        let mut config = Config::default();
        config.factor.quantiles = 1;
        assert!(config.validate().is_err());
    }
}
