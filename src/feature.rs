//! Bar feature computation and tick/bar merging for the breakout engine.
//!
//! Bars are enriched with rolling extrema, moving averages, and trend
//! columns; ticks are then joined to the most recent bar by forward-fill
//! and turned into per-tick strategy rows. All breakout/exit flags compare
//! the tick price against the *previous* row's feature snapshot, so a bar
//! that is still forming never looks ahead at its own extremes.

use tracing::debug;

use crate::config::BreakoutWindows;
use crate::indicator::rolling;
use crate::model::bar::Bar;
use crate::model::tick::Tick;

/// Dense per-bar feature columns. First `window - 1` slots of each rolling
/// column are NaN.
#[derive(Debug, Clone)]
pub struct BarFeatures {
    /// Count of up-closes over the growth window.
    pub growth: Vec<f64>,
    pub high_slow: Vec<f64>,
    pub low_slow: Vec<f64>,
    pub high_mid: Vec<f64>,
    pub low_mid: Vec<f64>,
    pub low_fast: Vec<f64>,
    /// Bars since the fast-window low.
    pub low_days: Vec<f64>,
    pub ma_fast: Vec<f64>,
    pub ma_exit: Vec<f64>,
    pub ma_trend: Vec<f64>,
    /// First difference of the trend MA (its slope).
    pub trend_diff: Vec<f64>,
    /// Trend MA over its previous value.
    pub trend_ratio: Vec<f64>,
    /// Fast-MA impulse gate: curvature of the fast MA points up.
    pub ma_impulse: Vec<f64>,
}

impl BarFeatures {
    pub fn compute(bars: &[Bar], w: &BreakoutWindows) -> Self {
        let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let ups: Vec<f64> = bars
            .iter()
            .map(|b| if b.is_bullish() { 1.0 } else { 0.0 })
            .collect();

        let ma_fast = rolling::ts_ma(&closes, w.ma_fast);
        let ma_trend = rolling::ts_ma(&closes, w.ma_trend);
        let trend_diff = rolling::diff(&ma_trend);
        let prev_trend = rolling::shift(&ma_trend, 1);
        let trend_ratio: Vec<f64> = ma_trend
            .iter()
            .zip(&prev_trend)
            .map(|(cur, prev)| cur / prev)
            .collect();

        let f1 = rolling::shift(&ma_fast, 1);
        let f2 = rolling::shift(&ma_fast, 2);
        let f4 = rolling::shift(&ma_fast, 4);
        let ma_impulse: Vec<f64> = (0..ma_fast.len())
            .map(|i| {
                let up_curve = ma_fast[i] + 3.0 * f2[i] > 4.0 * f1[i];
                let up_pull = ma_fast[i] + f4[i] > 2.0 * f2[i];
                if up_curve && up_pull {
                    1.0
                } else {
                    0.0
                }
            })
            .collect();

        debug!(bars = bars.len(), "computed bar features");

        Self {
            growth: rolling::ts_sum(&ups, w.growth),
            high_slow: rolling::ts_max(&highs, w.channel_slow),
            low_slow: rolling::ts_min(&lows, w.channel_slow),
            high_mid: rolling::ts_max(&highs, w.channel_mid),
            low_mid: rolling::ts_min(&lows, w.channel_mid),
            low_fast: rolling::ts_min(&lows, w.channel_fast),
            low_days: rolling::ts_lowday(&lows, w.channel_fast),
            ma_fast,
            ma_exit: rolling::ts_ma(&closes, w.ma_exit),
            ma_trend,
            trend_diff,
            trend_ratio,
            ma_impulse,
        }
    }

    pub fn len(&self) -> usize {
        self.growth.len()
    }

    pub fn is_empty(&self) -> bool {
        self.growth.is_empty()
    }
}

/// One merged tick row with the flags the breakout state machine consumes.
#[derive(Debug, Clone, Copy)]
pub struct StrategyRow {
    pub timestamp: i64,
    pub price: f64,
    /// Close below the slow-channel low (arms stage 1).
    pub break_below_slow: bool,
    /// Close above the mid-channel high (stage 1 -> 2).
    pub break_above_mid: bool,
    /// Close below the fast-channel low (stage 2 -> 3).
    pub break_below_fast: bool,
    /// Close above the slow-channel high (entry confirmation).
    pub break_above_slow: bool,
    /// Close below the mid-channel low (exit).
    pub exit_channel: bool,
    /// Close below the exit MA while the trend MA slopes down (exit).
    pub exit_trend: bool,
    /// Always true; placeholder gate kept from the research strategy.
    pub entry_gate: bool,
}

/// Feature snapshot carried tick-to-tick for the shift-by-1 comparisons.
#[derive(Debug, Clone, Copy)]
struct RowSnapshot {
    low_slow: f64,
    high_mid: f64,
    low_fast: f64,
    high_slow: f64,
    low_mid: f64,
    ma_exit: f64,
    trend_diff: f64,
}

impl RowSnapshot {
    const UNSET: Self = Self {
        low_slow: f64::NAN,
        high_mid: f64::NAN,
        low_fast: f64::NAN,
        high_slow: f64::NAN,
        low_mid: f64::NAN,
        ma_exit: f64::NAN,
        trend_diff: f64::NAN,
    };

    fn at(features: &BarFeatures, idx: usize) -> Self {
        Self {
            low_slow: features.low_slow[idx],
            high_mid: features.high_mid[idx],
            low_fast: features.low_fast[idx],
            high_slow: features.high_slow[idx],
            low_mid: features.low_mid[idx],
            ma_exit: features.ma_exit[idx],
            trend_diff: features.trend_diff[idx],
        }
    }
}

/// Join ticks to the most recent bar (forward-fill) and derive the per-tick
/// flags. Ticks before the first bar carry NaN features, so every flag on
/// them is false.
pub fn merge_ticks(bars: &[Bar], features: &BarFeatures, ticks: &[Tick]) -> Vec<StrategyRow> {
    assert_eq!(bars.len(), features.len(), "features must align with bars");

    let mut rows = Vec::with_capacity(ticks.len());
    let mut bar_idx: Option<usize> = None;
    let mut prev = RowSnapshot::UNSET;

    for tick in ticks {
        let mut next = bar_idx.map_or(0, |i| i + 1);
        while next < bars.len() && bars[next].timestamp <= tick.timestamp {
            bar_idx = Some(next);
            next += 1;
        }

        // NaN comparisons are false: rows without history never fire a flag.
        rows.push(StrategyRow {
            timestamp: tick.timestamp,
            price: tick.price,
            break_below_slow: tick.price < prev.low_slow,
            break_above_mid: tick.price > prev.high_mid,
            break_below_fast: tick.price < prev.low_fast,
            break_above_slow: tick.price > prev.high_slow,
            exit_channel: tick.price < prev.low_mid,
            exit_trend: tick.price < prev.ma_exit && prev.trend_diff < 0.0,
            entry_gate: true,
        });

        prev = match bar_idx {
            Some(i) => RowSnapshot::at(features, i),
            None => RowSnapshot::UNSET,
        };
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BreakoutWindows;

    fn flat_bar(timestamp: i64, price: f64) -> Bar {
        Bar {
            timestamp,
            open: price,
            high: price,
            low: price,
            close: price,
        }
    }

    fn tiny_windows() -> BreakoutWindows {
        BreakoutWindows {
            channel_slow: 3,
            channel_mid: 2,
            channel_fast: 2,
            ma_fast: 2,
            ma_exit: 2,
            ma_trend: 3,
            growth: 2,
        }
    }

    #[test]
    fn rolling_columns_align_with_bars() {
        let bars: Vec<Bar> = (0..6).map(|i| flat_bar(i * 60, 100.0 + i as f64)).collect();
        let f = BarFeatures::compute(&bars, &tiny_windows());
        assert_eq!(f.len(), 6);
        assert!(f.high_slow[1].is_nan());
        assert_eq!(f.high_slow[2], 102.0);
        assert_eq!(f.low_fast[5], 104.0);
    }

    #[test]
    fn ticks_before_first_bar_never_flag() {
        let bars: Vec<Bar> = (1..8).map(|i| flat_bar(i * 60, 100.0)).collect();
        let f = BarFeatures::compute(&bars, &tiny_windows());
        let ticks = vec![Tick::at(0, 1.0), Tick::at(5, 1.0)];
        for row in merge_ticks(&bars, &f, &ticks) {
            assert!(!row.break_below_slow && !row.exit_channel && !row.exit_trend);
            assert!(row.entry_gate);
        }
    }

    #[test]
    fn flags_use_previous_row_snapshot() {
        // Bars at t=0,60,120,...; slow channel of 3 ready at the third bar.
        let bars: Vec<Bar> = (0..5).map(|i| flat_bar(i * 60, 100.0)).collect();
        let f = BarFeatures::compute(&bars, &tiny_windows());
        // Two ticks inside the fourth bar: the first one still sees the
        // snapshot of the previous tick's bar.
        let ticks = vec![Tick::at(185, 90.0), Tick::at(190, 90.0)];
        let rows = merge_ticks(&bars, &f, &ticks);
        assert!(!rows[0].break_below_slow, "no prior snapshot yet");
        assert!(rows[1].break_below_slow, "90 < slow low of 100");
    }
}
