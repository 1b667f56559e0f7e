use ticklab::config::BacktestConfig;
use ticklab::engine::portfolio::{self, combine_runs, Capital};
use ticklab::model::bar::Bar;
use ticklab::model::signal::{SignalFlags, SignalLabel};

fn bar(timestamp: i64, price: f64) -> Bar {
    Bar {
        timestamp,
        open: price,
        high: price,
        low: price,
        close: price,
    }
}

fn config(fee: f64, slippage: f64) -> BacktestConfig {
    BacktestConfig {
        fee,
        slippage,
        ..BacktestConfig::default()
    }
}

fn flags(n: usize) -> Vec<SignalFlags> {
    vec![SignalFlags::default(); n]
}

#[test]
fn open_long_moves_to_full_exposure() {
    let bars: Vec<Bar> = (0..5).map(|i| bar(i * 60, 100.0)).collect();
    let mut f = flags(5);
    f[1].open_long = true;

    let run = portfolio::run(&bars, &f, &config(0.0, 0.0), Capital::flat(1.0)).unwrap();
    assert!((run.net[0].pos - 0.0).abs() < 1e-12);
    assert!((run.net[1].pos - 1.0).abs() < 1e-9);
    assert!((run.net[1].trade_units - 0.01).abs() < 1e-12);
    assert!(run.net[1].base_units.abs() < 1e-12);

    let executed: Vec<_> = run.signals.iter().filter(|s| s.label.is_some()).collect();
    assert_eq!(executed.len(), 1);
    assert_eq!(executed[0].label, Some(SignalLabel::OpenLong));
    assert!((executed[0].target_pos - 1.0).abs() < f64::EPSILON);
}

#[test]
fn close_long_flattens_the_book() {
    let bars: Vec<Bar> = (0..5).map(|i| bar(i * 60, 100.0)).collect();
    let mut f = flags(5);
    f[1].open_long = true;
    f[3].close_long = true;

    let run = portfolio::run(&bars, &f, &config(0.0, 0.0), Capital::flat(1.0)).unwrap();
    assert!(run.net[3].trade_units.abs() < 1e-12);
    assert!((run.net[3].pos - 0.0).abs() < 1e-12);
    assert!((run.end_capital.base - 1.0).abs() < 1e-9);

    let labels: Vec<_> = run.signals.iter().filter_map(|s| s.label).collect();
    assert_eq!(labels, vec![SignalLabel::OpenLong, SignalLabel::CloseLong]);
}

#[test]
fn fees_reduce_net_value() {
    let bars: Vec<Bar> = (0..3).map(|i| bar(i * 60, 100.0)).collect();
    let mut f = flags(3);
    f[1].open_long = true;

    let fee = 0.00075;
    let run = portfolio::run(&bars, &f, &config(fee, 0.0), Capital::flat(1.0)).unwrap();
    // Buying the whole book costs fee on one unit of notional.
    assert!((run.net[1].net - (1.0 - fee)).abs() < 1e-9);
}

#[test]
fn open_short_goes_to_minus_one_exposure() {
    let bars: Vec<Bar> = (0..4).map(|i| bar(i * 60, 100.0)).collect();
    let mut f = flags(4);
    f[1].open_short = true;

    let run = portfolio::run(&bars, &f, &config(0.0, 0.0), Capital::flat(1.0)).unwrap();
    assert!(run.net[1].trade_units < 0.0);
    assert!((run.net[1].pos + 1.0).abs() < 1e-9);

    let executed: Vec<_> = run.signals.iter().filter_map(|s| s.label).collect();
    assert_eq!(executed, vec![SignalLabel::OpenShort]);
}

#[test]
fn exposed_book_ignores_opening_signals() {
    let bars: Vec<Bar> = (0..5).map(|i| bar(i * 60, 100.0)).collect();
    let mut f = flags(5);
    f[1].open_long = true;
    f[2].open_short = true; // must be ignored while long
    f[3].open_long = true; // likewise

    let run = portfolio::run(&bars, &f, &config(0.0, 0.0), Capital::flat(1.0)).unwrap();
    let labels: Vec<_> = run.signals.iter().filter_map(|s| s.label).collect();
    assert_eq!(labels, vec![SignalLabel::OpenLong]);
    assert!((run.net[4].pos - 1.0).abs() < 1e-9);
}

#[test]
fn simultaneous_open_and_close_holds() {
    let bars: Vec<Bar> = (0..3).map(|i| bar(i * 60, 100.0)).collect();
    let mut f = flags(3);
    f[1].open_long = true;
    f[1].close_long = true;

    let run = portfolio::run(&bars, &f, &config(0.0, 0.0), Capital::flat(1.0)).unwrap();
    assert!(run.signals.iter().all(|s| s.label.is_none()));
    assert!(run.net[1].trade_units.abs() < 1e-12);
}

#[test]
fn misaligned_flags_are_rejected() {
    let bars: Vec<Bar> = (0..3).map(|i| bar(i * 60, 100.0)).collect();
    assert!(portfolio::run(&bars, &flags(2), &config(0.0, 0.0), Capital::flat(1.0)).is_err());
}

#[test]
fn slippage_worsens_the_executed_price() {
    let bars: Vec<Bar> = (0..3).map(|i| bar(i * 60, 100.0)).collect();
    let mut f = flags(3);
    f[1].open_long = true;

    let run = portfolio::run(&bars, &f, &config(0.0, 0.001), Capital::flat(1.0)).unwrap();
    // Paid 100.1 per unit but the mark is 100: small immediate loss.
    assert!(run.net[1].net < 1.0);
    assert!((run.net[1].net - 100.0 / 100.1).abs() < 1e-9);
}

#[test]
fn combine_runs_sums_nets_and_positions() {
    let bars: Vec<Bar> = (0..4).map(|i| bar(i * 60, 100.0)).collect();
    let mut f1 = flags(4);
    f1[1].open_long = true;
    let mut f2 = flags(4);
    f2[1].open_short = true;

    let r1 = portfolio::run(&bars, &f1, &config(0.0, 0.0), Capital::flat(1.0)).unwrap();
    let r2 = portfolio::run(&bars, &f2, &config(0.0, 0.0), Capital::flat(1.0)).unwrap();
    let combined = combine_runs(&[r1, r2]).unwrap();

    assert_eq!(combined.len(), 4);
    assert!((combined[1].net - 2.0).abs() < 1e-9);
    assert!(combined[1].pos.abs() < 1e-9); // +1 and -1 cancel
    assert!(combine_runs(&[]).is_err());
}
