use super::sma::Sma;

/// Streaming exponential moving average, seeded with an SMA of the first
/// `period` values.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    alpha: f64,
    current: Option<f64>,
    seed: Sma,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "EMA period must be > 0");
        Self {
            period,
            alpha: 2.0 / (period as f64 + 1.0),
            current: None,
            seed: Sma::new(period),
        }
    }

    pub fn push(&mut self, value: f64) -> Option<f64> {
        self.current = match self.current {
            Some(prev) => Some(prev + (value - prev) * self.alpha),
            None => self.seed.push(value),
        };
        self.current
    }

    pub fn value(&self) -> Option<f64> {
        self.current
    }

    pub fn is_ready(&self) -> bool {
        self.current.is_some()
    }

    pub fn period(&self) -> usize {
        self.period
    }
}
