use ticklab::config::{BacktestConfig, BreakoutWindows};
use ticklab::engine::breakout;
use ticklab::feature::{merge_ticks, BarFeatures};
use ticklab::model::bar::Bar;
use ticklab::model::tick::Tick;
use ticklab::strategy::turtle_breakout::TurtleBreakoutStrategy;

fn bar(timestamp: i64, close: f64) -> Bar {
    Bar {
        timestamp,
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
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

fn config() -> BacktestConfig {
    BacktestConfig {
        slippage: 0.0,
        warmup_ticks: 1,
        ..BacktestConfig::default()
    }
}

#[test]
fn monotonically_rising_series_never_trades() {
    let bars: Vec<Bar> = (0..60).map(|i| bar(i * 60, 100.0 + i as f64)).collect();
    let ticks: Vec<Tick> = (0..180)
        .map(|i| Tick::at(i * 20, 100.0 + i as f64 * 0.4))
        .collect();

    let features = BarFeatures::compute(&bars, &tiny_windows());
    let rows = merge_ticks(&bars, &features, &ticks);
    let mut strategy = TurtleBreakoutStrategy::new();
    let outcome = breakout::run(&rows, &mut strategy, &config()).unwrap();

    assert!(outcome.fills.is_empty());
    assert_eq!(outcome.counters.trades, 0);
    assert!(outcome
        .cash
        .iter()
        .all(|&c| (c - 10_000.0).abs() < f64::EPSILON));
}

#[test]
fn staged_breakout_produces_one_round_trip() {
    // Flat bars: slow/fast channel low = 99, mid/slow channel high = 101.
    let bars: Vec<Bar> = (0..10).map(|i| bar(i * 60, 100.0)).collect();
    let features = BarFeatures::compute(&bars, &tiny_windows());

    // All ticks after the last bar, so every row sees a ready snapshot.
    let ticks = vec![
        Tick::at(600, 100.0), // filler: establishes the previous-row snapshot
        Tick::at(601, 98.0),  // arms stage 1 (below 99)
        Tick::at(602, 102.0), // stage 2 (above 101)
        Tick::at(603, 98.0),  // stage 3 (below 99)
        Tick::at(604, 102.0), // entry (above 101)
        Tick::at(605, 95.0),  // exit: below mid-channel low
    ];
    let rows = merge_ticks(&bars, &features, &ticks);
    let mut strategy = TurtleBreakoutStrategy::new();
    let outcome = breakout::run(&rows, &mut strategy, &config()).unwrap();

    assert_eq!(outcome.fills.len(), 2);
    assert!((outcome.fills[0].price - 102.0).abs() < 1e-9);
    assert!((outcome.fills[1].price - 95.0).abs() < 1e-9);
    assert_eq!(outcome.counters.trades, 1);
    assert_eq!(outcome.counters.losses, 1);

    let units = 10_000.0 / 102.0;
    assert!((outcome.final_equity() - units * 95.0).abs() < 1e-6);
}
