use crate::error::BacktestError;
use crate::model::bar::FactorBar;
use crate::model::signal::SignalFlags;

/// Parameters of the alpha-factor decile strategy.
#[derive(Debug, Clone)]
pub struct FactorQuantileParams {
    pub quantiles: usize,
    /// Sign of the factor-return correlation; flips long/short orientation.
    pub positive_corr: bool,
    /// Fit window for the quantile breakpoints: `[fit_start, fit_end)`.
    pub fit_start: i64,
    pub fit_end: i64,
}

/// Quantile breakpoints over `values`: `q + 1` points at fractions
/// `0, 1/q, ..., 1` with linear interpolation, duplicates dropped.
pub fn quantile_bins(values: &[f64], q: usize) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    if sorted.is_empty() {
        return Vec::new();
    }

    let mut bins = Vec::with_capacity(q + 1);
    for k in 0..=q {
        let pos = (k as f64 / q as f64) * (sorted.len() - 1) as f64;
        let lo = pos.floor() as usize;
        let hi = pos.ceil() as usize;
        let val = if lo == hi {
            sorted[lo]
        } else {
            sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
        };
        if bins.last().map_or(true, |&prev| val > prev) {
            bins.push(val);
        }
    }
    bins
}

/// Decile entry/exit signals on the shift-by-1 factor value.
///
/// With positive correlation the top decile opens longs and the bottom
/// decile opens shorts; negative correlation mirrors the orientation. Bars
/// whose previous factor value is NaN never flag.
pub fn signals(
    bars: &[FactorBar],
    params: &FactorQuantileParams,
) -> Result<Vec<SignalFlags>, BacktestError> {
    let fit: Vec<f64> = bars
        .iter()
        .filter(|b| b.timestamp >= params.fit_start && b.timestamp < params.fit_end)
        .map(|b| b.factor)
        .filter(|v| !v.is_nan())
        .collect();
    if fit.is_empty() {
        return Err(BacktestError::EmptyFitWindow(format!(
            "no factor values in [{}, {})",
            params.fit_start, params.fit_end
        )));
    }

    let bins = quantile_bins(&fit, params.quantiles);
    if bins.len() < 3 {
        return Err(BacktestError::EmptyFitWindow(format!(
            "factor collapses to {} distinct breakpoint(s)",
            bins.len()
        )));
    }
    let lower = bins[1];
    let upper = bins[bins.len() - 2];

    let mut flags = vec![SignalFlags::default(); bars.len()];
    for i in 1..bars.len() {
        let f = bars[i - 1].factor;
        flags[i] = if params.positive_corr {
            SignalFlags {
                open_long: f >= upper,
                close_long: f < upper,
                open_short: f <= lower,
                close_short: f > lower,
            }
        } else {
            SignalFlags {
                open_long: f <= lower,
                close_long: f > lower,
                open_short: f >= upper,
                close_short: f < upper,
            }
        };
    }
    Ok(flags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decile_breakpoints_of_uniform_series() {
        let values: Vec<f64> = (0..=100).map(|v| v as f64).collect();
        let bins = quantile_bins(&values, 10);
        assert_eq!(bins.len(), 11);
        assert_eq!(bins[0], 0.0);
        assert_eq!(bins[1], 10.0);
        assert_eq!(bins[9], 90.0);
        assert_eq!(bins[10], 100.0);
    }

    #[test]
    fn duplicate_breakpoints_are_dropped() {
        let values = vec![1.0; 50];
        let bins = quantile_bins(&values, 10);
        assert_eq!(bins, vec![1.0]);
    }

    #[test]
    fn bins_are_strictly_increasing() {
        let values: Vec<f64> = (0..200).map(|v| ((v * 17) % 23) as f64).collect();
        let bins = quantile_bins(&values, 10);
        for w in bins.windows(2) {
            assert!(w[1] > w[0]);
        }
    }
}
