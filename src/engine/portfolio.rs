//! Percent-of-capital execution over per-bar signal flags.

use tracing::debug;

use crate::config::BacktestConfig;
use crate::error::BacktestError;
use crate::model::bar::Bar;
use crate::model::signal::{SignalFlags, SignalLabel, SignalRecord};

/// Portfolio holdings: risk-asset units and base-currency units. Net value
/// is always quoted in base currency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capital {
    pub trade: f64,
    pub base: f64,
}

impl Capital {
    /// All cash, no exposure.
    pub fn flat(base: f64) -> Self {
        Self { trade: 0.0, base }
    }

    pub fn net_in_base(&self, price: f64) -> f64 {
        self.trade * price + self.base
    }

    /// Signed fraction of portfolio value held in the risk asset.
    pub fn exposure(&self, price: f64) -> f64 {
        self.trade * price / self.net_in_base(price)
    }
}

/// Rebalance to `pct` of total portfolio value in the risk asset at
/// `price`, charging `fee` on the traded notional. Returns the new capital
/// and the traded unit delta.
pub fn order_pct_to(pct: f64, capital: Capital, price: f64, fee: f64) -> (Capital, f64) {
    let total = capital.net_in_base(price);
    let target_units = pct * total / price;
    let delta = target_units - capital.trade;
    let notional = delta * price;
    let after = Capital {
        trade: target_units,
        base: capital.base - notional - notional.abs() * fee,
    };
    (after, delta)
}

/// One bar of the net-value series.
#[derive(Debug, Clone, Copy)]
pub struct NetPoint {
    pub timestamp: i64,
    pub close: f64,
    /// Portfolio value in base currency at the close.
    pub net: f64,
    /// Signed exposure fraction at the close.
    pub pos: f64,
    pub trade_units: f64,
    pub base_units: f64,
}

#[derive(Debug, Clone)]
pub struct PortfolioRun {
    pub net: Vec<NetPoint>,
    pub signals: Vec<SignalRecord>,
    pub end_capital: Capital,
}

/// Walk the bars once. Near-flat books act on opening signals (full long /
/// full short), exposed books only on the matching closing signal,
/// everything else holds.
pub fn run(
    bars: &[Bar],
    flags: &[SignalFlags],
    config: &BacktestConfig,
    initial: Capital,
) -> Result<PortfolioRun, BacktestError> {
    if bars.is_empty() {
        return Err(BacktestError::EmptyData(
            "portfolio simulation needs at least one bar".to_string(),
        ));
    }
    if bars.len() != flags.len() {
        return Err(BacktestError::EmptyData(format!(
            "signal flags ({}) do not align with bars ({})",
            flags.len(),
            bars.len()
        )));
    }

    let fee = config.fee;
    let slippage = config.slippage;
    let band = config.flat_band;

    let mut capital = initial;
    let mut net = Vec::with_capacity(bars.len());
    let mut signals = Vec::with_capacity(bars.len());

    for (bar, flag) in bars.iter().zip(flags) {
        let exposure = capital.exposure(bar.open);

        if exposure > -band && exposure < band {
            if flag.open_long && !flag.close_long {
                let price = bar.open * (1.0 + slippage);
                let (after, delta) = order_pct_to(1.0, capital, price, fee);
                capital = after;
                debug!(timestamp = bar.timestamp, price, delta, "open long");
                signals.push(SignalRecord::executed(
                    bar.timestamp,
                    SignalLabel::OpenLong,
                    price / (1.0 - fee),
                    1.0,
                ));
            } else if flag.open_short && !flag.close_short {
                let price = bar.open * (1.0 - slippage);
                let (after, delta) = order_pct_to(-1.0, capital, price, fee);
                capital = after;
                debug!(timestamp = bar.timestamp, price, delta, "open short");
                signals.push(SignalRecord::executed(
                    bar.timestamp,
                    SignalLabel::OpenShort,
                    price * (1.0 - fee),
                    -1.0,
                ));
            } else {
                signals.push(SignalRecord::held(bar.timestamp, exposure));
            }
        } else if exposure >= band && flag.close_long {
            let price = bar.open * (1.0 - slippage);
            let (after, delta) = order_pct_to(0.0, capital, price, fee);
            capital = after;
            debug!(timestamp = bar.timestamp, price, delta, "close long");
            signals.push(SignalRecord::executed(
                bar.timestamp,
                SignalLabel::CloseLong,
                price * (1.0 - fee),
                0.0,
            ));
        } else if exposure <= -band && flag.close_short {
            let price = bar.open * (1.0 + slippage);
            let (after, delta) = order_pct_to(0.0, capital, price, fee);
            capital = after;
            debug!(timestamp = bar.timestamp, price, delta, "close short");
            signals.push(SignalRecord::executed(
                bar.timestamp,
                SignalLabel::CloseShort,
                price / (1.0 - fee),
                0.0,
            ));
        } else {
            signals.push(SignalRecord::held(bar.timestamp, exposure));
        }

        let value = capital.net_in_base(bar.close);
        let trade_value_net = capital.trade + capital.base / bar.close;
        net.push(NetPoint {
            timestamp: bar.timestamp,
            close: bar.close,
            net: value,
            pos: capital.trade / trade_value_net,
            trade_units: capital.trade,
            base_units: capital.base,
        });
    }

    Ok(PortfolioRun {
        net,
        signals,
        end_capital: capital,
    })
}

/// Combine parallel runs of the same period: net, exposure, and holdings
/// sum element-wise; timestamps and closes come from the last run.
pub fn combine_runs(runs: &[PortfolioRun]) -> Result<Vec<NetPoint>, BacktestError> {
    let Some(first) = runs.first() else {
        return Err(BacktestError::EmptyData("no runs to combine".to_string()));
    };
    let len = first.net.len();
    if runs.iter().any(|r| r.net.len() != len) {
        return Err(BacktestError::EmptyData(
            "runs cover different bar counts and cannot be combined".to_string(),
        ));
    }

    let last = runs.last().expect("non-empty");
    let mut combined = Vec::with_capacity(len);
    for i in 0..len {
        let mut point = NetPoint {
            net: 0.0,
            pos: 0.0,
            trade_units: 0.0,
            base_units: 0.0,
            ..last.net[i]
        };
        for run in runs {
            point.net += run.net[i].net;
            point.pos += run.net[i].pos;
            point.trade_units += run.net[i].trade_units;
            point.base_units += run.net[i].base_units;
        }
        combined.push(point);
    }
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_pct_to_zero_flattens() {
        let capital = Capital {
            trade: 3.0,
            base: 50.0,
        };
        let (after, delta) = order_pct_to(0.0, capital, 100.0, 0.001);
        assert_eq!(after.trade, 0.0);
        assert!((delta + 3.0).abs() < f64::EPSILON);
        // 50 + 300 notional - 0.3 fee
        assert!((after.base - 349.7).abs() < 1e-9);
    }

    #[test]
    fn order_pct_to_full_long_spends_the_book() {
        let capital = Capital::flat(1.0);
        let (after, delta) = order_pct_to(1.0, capital, 10.0, 0.0);
        assert!((after.trade - 0.1).abs() < 1e-12);
        assert!((delta - 0.1).abs() < 1e-12);
        assert!(after.base.abs() < 1e-12);
    }

    #[test]
    fn short_target_goes_negative() {
        let capital = Capital::flat(100.0);
        let (after, _) = order_pct_to(-1.0, capital, 10.0, 0.0);
        assert!((after.trade + 10.0).abs() < 1e-12);
        assert!((after.base - 200.0).abs() < 1e-9);
        assert!(after.exposure(10.0) < -0.99);
    }
}
