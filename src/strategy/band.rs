use crate::config::BandConfig;
use crate::indicator::atr::Atr;
use crate::indicator::ema::Ema;
use crate::model::bar::Bar;
use crate::model::signal::SignalFlags;

/// ATR-envelope re-entry signals around an EMA.
///
/// A long opens when the close re-enters the envelope from below the lower
/// band (yesterday back inside, the bar before still outside) and closes
/// when the close crosses up through the EMA; shorts mirror this against
/// the upper band. Bars whose indicators are still warming up never flag.
pub fn signals(bars: &[Bar], params: &BandConfig) -> Vec<SignalFlags> {
    let n = bars.len();

    let mut ema = Ema::new(params.ema_period);
    let mut atr = Atr::new(params.atr_period);
    let mut mid = vec![f64::NAN; n];
    let mut lower = vec![f64::NAN; n];
    let mut upper = vec![f64::NAN; n];
    for (i, bar) in bars.iter().enumerate() {
        let m = ema.push(bar.close);
        let a = atr.push(bar);
        if let (Some(m), Some(a)) = (m, a) {
            mid[i] = m;
            lower[i] = m - a * params.atr_mult;
            upper[i] = m + a * params.atr_mult;
        }
    }

    let mut flags = vec![SignalFlags::default(); n];
    for i in 2..n {
        let c1 = bars[i - 1].close;
        let c2 = bars[i - 2].close;
        flags[i] = SignalFlags {
            open_long: c1 > lower[i - 1] && c2 < lower[i - 2],
            close_long: c1 > mid[i - 1] && c2 < mid[i - 2],
            open_short: c1 < upper[i - 1] && c2 > upper[i - 2],
            close_short: c1 < mid[i - 1] && c2 > mid[i - 2],
        };
    }
    flags
}
