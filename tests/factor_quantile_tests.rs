use ticklab::model::bar::FactorBar;
use ticklab::strategy::factor_quantile::{signals, FactorQuantileParams};

fn factor_bar(i: i64, factor: f64) -> FactorBar {
    FactorBar {
        timestamp: i * 60,
        open: 100.0,
        high: 101.0,
        low: 99.0,
        close: 100.0,
        factor,
    }
}

fn params(positive_corr: bool) -> FactorQuantileParams {
    FactorQuantileParams {
        quantiles: 10,
        positive_corr,
        fit_start: i64::MIN,
        fit_end: i64::MAX,
    }
}

#[test]
fn top_decile_opens_long_with_positive_corr() {
    let bars: Vec<FactorBar> = (0..100).map(|i| factor_bar(i, i as f64)).collect();
    let flags = signals(&bars, &params(true)).unwrap();

    // Factor 95 (previous bar) sits in the top decile.
    assert!(flags[96].open_long);
    assert!(!flags[96].close_long);
    assert!(!flags[96].open_short);

    // Mid-range factor closes longs and shorts alike.
    assert!(!flags[50].open_long);
    assert!(flags[50].close_long);
    assert!(flags[50].close_short);

    // Bottom decile opens shorts.
    assert!(flags[5].open_short);
    assert!(!flags[5].close_short);
}

#[test]
fn negative_corr_mirrors_the_orientation() {
    let bars: Vec<FactorBar> = (0..100).map(|i| factor_bar(i, i as f64)).collect();
    let flags = signals(&bars, &params(false)).unwrap();
    assert!(flags[96].open_short);
    assert!(!flags[96].open_long);
    assert!(flags[5].open_long);
}

#[test]
fn first_bar_has_no_previous_factor() {
    let bars: Vec<FactorBar> = (0..100).map(|i| factor_bar(i, i as f64)).collect();
    let flags = signals(&bars, &params(true)).unwrap();
    assert_eq!(flags[0], Default::default());
}

#[test]
fn nan_factor_values_never_flag() {
    let mut bars: Vec<FactorBar> = (0..100).map(|i| factor_bar(i, i as f64)).collect();
    bars[49].factor = f64::NAN;
    let flags = signals(&bars, &params(true)).unwrap();
    assert_eq!(flags[50], Default::default());
}

#[test]
fn empty_fit_window_is_an_error() {
    let bars: Vec<FactorBar> = (0..100).map(|i| factor_bar(i, i as f64)).collect();
    let params = FactorQuantileParams {
        quantiles: 10,
        positive_corr: true,
        fit_start: 1_000_000,
        fit_end: 2_000_000,
    };
    assert!(signals(&bars, &params).is_err());
}

#[test]
fn constant_factor_is_an_error() {
    let bars: Vec<FactorBar> = (0..100).map(|i| factor_bar(i, 1.0)).collect();
    assert!(signals(&bars, &params(true)).is_err());
}

#[test]
fn fit_window_bounds_the_breakpoints() {
    // Fit only on the first half, where the factor tops out at 49.
    let bars: Vec<FactorBar> = (0..100).map(|i| factor_bar(i, i as f64)).collect();
    let params = FactorQuantileParams {
        quantiles: 10,
        positive_corr: true,
        fit_start: 0,
        fit_end: 50 * 60,
    };
    let flags = signals(&bars, &params).unwrap();
    // 60 is above the fitted top decile even though it is mid-series.
    assert!(flags[61].open_long);
}
