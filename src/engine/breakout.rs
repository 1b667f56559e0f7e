//! Sequential tick-level simulation of the breakout strategy.
//!
//! The loop is inherently serial (each step reads the previous step's
//! balances) and runs over plain `Vec<f64>` series, one pass, no
//! allocation inside the loop.

use tracing::info;

use crate::config::BacktestConfig;
use crate::error::BacktestError;
use crate::feature::StrategyRow;
use crate::model::signal::Signal;
use crate::strategy::turtle_breakout::TurtleBreakoutStrategy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillSide {
    Buy,
    Sell,
}

/// One executed trade at its slippage-adjusted price.
#[derive(Debug, Clone, Copy)]
pub struct Fill {
    pub timestamp: i64,
    pub side: FillSide,
    pub price: f64,
}

/// Round-trip counters. A round trip closing exactly at the entry price
/// counts in neither bucket.
#[derive(Debug, Clone, Copy, Default)]
pub struct TradeCounters {
    pub trades: u32,
    pub wins: u32,
    pub losses: u32,
    pub win_pnl: f64,
    pub loss_pnl: f64,
}

/// Full simulation output: one slot per tick row.
#[derive(Debug, Clone)]
pub struct BreakoutOutcome {
    pub cash: Vec<f64>,
    pub equity: Vec<f64>,
    pub units: Vec<f64>,
    pub counters: TradeCounters,
    pub fills: Vec<Fill>,
}

impl BreakoutOutcome {
    pub fn final_equity(&self) -> f64 {
        *self.equity.last().unwrap_or(&0.0)
    }
}

/// Walk the merged tick rows once. The first `warmup_ticks` rows carry
/// state forward unchanged and never reach the strategy.
pub fn run(
    rows: &[StrategyRow],
    strategy: &mut TurtleBreakoutStrategy,
    config: &BacktestConfig,
) -> Result<BreakoutOutcome, BacktestError> {
    if rows.is_empty() {
        return Err(BacktestError::EmptyData(
            "breakout simulation needs at least one tick row".to_string(),
        ));
    }

    let n = rows.len();
    let slippage = config.slippage;
    let mut cash = vec![0.0; n];
    let mut equity = vec![0.0; n];
    let mut units = vec![0.0; n];
    cash[0] = config.initial_cash;
    equity[0] = config.initial_cash;

    let mut counters = TradeCounters::default();
    let mut fills = Vec::new();
    let mut entry_price = 0.0;

    for i in 1..n {
        if i < config.warmup_ticks {
            cash[i] = cash[i - 1];
            units[i] = units[i - 1];
            equity[i] = equity[i - 1];
            continue;
        }

        let row = &rows[i];
        match strategy.on_row(row) {
            Signal::Buy => {
                entry_price = row.price * (1.0 + slippage);
                units[i] = cash[i - 1] / entry_price;
                cash[i] = 0.0;
                equity[i] = cash[i] + units[i] * row.price;
                info!(
                    timestamp = row.timestamp,
                    price = entry_price,
                    units = units[i],
                    "breakout entry"
                );
                fills.push(Fill {
                    timestamp: row.timestamp,
                    side: FillSide::Buy,
                    price: entry_price,
                });
            }
            Signal::Sell => {
                let exit_price = row.price * (1.0 - slippage);
                cash[i] = exit_price * units[i - 1];
                units[i] = 0.0;
                equity[i] = cash[i] + units[i] * row.price;
                let pnl = units[i - 1] * (exit_price - entry_price);
                if exit_price > entry_price {
                    counters.trades += 1;
                    counters.wins += 1;
                    counters.win_pnl += pnl;
                } else if exit_price < entry_price {
                    counters.trades += 1;
                    counters.losses += 1;
                    counters.loss_pnl += pnl;
                }
                info!(
                    timestamp = row.timestamp,
                    price = exit_price,
                    equity = equity[i],
                    "breakout exit"
                );
                fills.push(Fill {
                    timestamp: row.timestamp,
                    side: FillSide::Sell,
                    price: exit_price,
                });
            }
            Signal::Hold => {
                cash[i] = cash[i - 1];
                units[i] = units[i - 1];
                equity[i] = if units[i] > 0.0 {
                    cash[i] + units[i] * row.price
                } else {
                    equity[i - 1]
                };
            }
        }
    }

    Ok(BreakoutOutcome {
        cash,
        equity,
        units,
        counters,
        fills,
    })
}
