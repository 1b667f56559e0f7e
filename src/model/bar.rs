use serde::{Deserialize, Serialize};

/// Aggregated OHLC observation over a fixed period.
///
/// `timestamp` is unix seconds of the bar open, matching the tick ids of the
/// tick stream it is merged with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Bar {
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }
}

/// Bar plus one pre-computed alpha-factor value for the quantile strategy.
#[derive(Debug, Clone)]
pub struct FactorBar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub factor: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bullish_and_bearish() {
        let up = Bar {
            timestamp: 0,
            open: 100.0,
            high: 105.0,
            low: 99.0,
            close: 104.0,
        };
        assert!(up.is_bullish());

        let down = Bar { close: 98.0, ..up };
        assert!(!down.is_bullish());
    }
}
