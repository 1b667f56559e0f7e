use crate::model::bar::Bar;

/// Streaming Average True Range with Wilder smoothing.
///
/// The first value is the plain average of the first `period` true ranges
/// (the first bar contributes `high - low`); afterwards
/// `atr = (prev * (period - 1) + tr) / period`.
#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    prev_close: Option<f64>,
    tr_sum: f64,
    tr_count: usize,
    current: Option<f64>,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "ATR period must be > 0");
        Self {
            period,
            prev_close: None,
            tr_sum: 0.0,
            tr_count: 0,
            current: None,
        }
    }

    pub fn push(&mut self, bar: &Bar) -> Option<f64> {
        let tr = match self.prev_close {
            Some(pc) => (bar.high - bar.low)
                .max((bar.high - pc).abs())
                .max((bar.low - pc).abs()),
            None => bar.high - bar.low,
        };
        self.prev_close = Some(bar.close);

        match self.current {
            Some(prev) => {
                self.current = Some((prev * (self.period - 1) as f64 + tr) / self.period as f64);
            }
            None => {
                self.tr_sum += tr;
                self.tr_count += 1;
                if self.tr_count == self.period {
                    self.current = Some(self.tr_sum / self.period as f64);
                }
            }
        }
        self.current
    }

    pub fn value(&self) -> Option<f64> {
        self.current
    }

    pub fn is_ready(&self) -> bool {
        self.current.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(high: f64, low: f64, close: f64) -> Bar {
        Bar {
            timestamp: 0,
            open: close,
            high,
            low,
            close,
        }
    }

    #[test]
    fn seeds_with_mean_true_range() {
        let mut atr = Atr::new(3);
        assert_eq!(atr.push(&bar(12.0, 10.0, 11.0)), None); // tr = 2
        assert_eq!(atr.push(&bar(12.0, 11.0, 11.5)), None); // tr = 1
        let v = atr.push(&bar(14.0, 11.0, 13.0)).unwrap(); // tr = 3
        assert!((v - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn gap_extends_true_range() {
        let mut atr = Atr::new(1);
        atr.push(&bar(10.0, 9.0, 10.0));
        // Gap up: high-prev_close dominates high-low.
        let v = atr.push(&bar(15.0, 14.0, 14.5)).unwrap();
        assert!((v - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn wilder_smoothing_after_seed() {
        let mut atr = Atr::new(2);
        atr.push(&bar(11.0, 10.0, 10.5)); // tr = 1
        let seeded = atr.push(&bar(11.5, 10.5, 11.0)).unwrap(); // tr = 1
        assert!((seeded - 1.0).abs() < f64::EPSILON);
        // tr = 3 -> (1*1 + 3)/2 = 2
        let v = atr.push(&bar(14.0, 11.0, 13.0)).unwrap();
        assert!((v - 2.0).abs() < f64::EPSILON);
    }
}
