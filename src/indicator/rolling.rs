//! Dense rolling-window transforms.
//!
//! Each function maps a full series to a series of the same length. The
//! first `window - 1` slots are NaN: downstream comparisons against NaN are
//! false, which is the intended "hold previous state" policy of the feature
//! builder.

/// Trailing sum over `window` values.
pub fn ts_sum(series: &[f64], window: usize) -> Vec<f64> {
    assert!(window > 0, "rolling window must be > 0");
    let mut out = vec![f64::NAN; series.len()];
    if series.len() < window {
        return out;
    }
    let mut sum: f64 = series[..window].iter().sum();
    out[window - 1] = sum;
    for i in window..series.len() {
        sum += series[i] - series[i - window];
        out[i] = sum;
    }
    out
}

/// Trailing simple moving average over `window` values.
pub fn ts_ma(series: &[f64], window: usize) -> Vec<f64> {
    let mut out = ts_sum(series, window);
    for v in out.iter_mut() {
        *v /= window as f64;
    }
    out
}

/// Trailing maximum over `window` values.
pub fn ts_max(series: &[f64], window: usize) -> Vec<f64> {
    rolling_extreme(series, window, |a, b| a > b)
}

/// Trailing minimum over `window` values.
pub fn ts_min(series: &[f64], window: usize) -> Vec<f64> {
    rolling_extreme(series, window, |a, b| a < b)
}

fn rolling_extreme(series: &[f64], window: usize, better: impl Fn(f64, f64) -> bool) -> Vec<f64> {
    assert!(window > 0, "rolling window must be > 0");
    let mut out = vec![f64::NAN; series.len()];
    for i in (window - 1)..series.len() {
        let mut best = series[i + 1 - window];
        for &v in &series[(i + 2 - window)..=i] {
            if better(v, best) {
                best = v;
            }
        }
        out[i] = best;
    }
    out
}

/// Bars elapsed since the trailing-window minimum (first occurrence),
/// i.e. `(window - 1) - argmin` over the window. 0 means the current bar
/// is the lowest of the window.
pub fn ts_lowday(series: &[f64], window: usize) -> Vec<f64> {
    assert!(window > 0, "rolling window must be > 0");
    let mut out = vec![f64::NAN; series.len()];
    for i in (window - 1)..series.len() {
        let start = i + 1 - window;
        let mut argmin = 0usize;
        let mut min = series[start];
        for (k, &v) in series[start..=i].iter().enumerate() {
            if v < min {
                min = v;
                argmin = k;
            }
        }
        out[i] = ((window - 1) - argmin) as f64;
    }
    out
}

/// First difference; the first slot is NaN.
pub fn diff(series: &[f64]) -> Vec<f64> {
    let mut out = vec![f64::NAN; series.len()];
    for i in 1..series.len() {
        out[i] = series[i] - series[i - 1];
    }
    out
}

/// Shift the series forward by `n` slots, filling the head with NaN.
pub fn shift(series: &[f64], n: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; series.len()];
    for i in n..series.len() {
        out[i] = series[i - n];
    }
    out
}
