/// Streaming simple moving average over a fixed-size ring buffer.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    ring: Vec<f64>,
    next: usize,
    filled: usize,
    running_sum: f64,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "SMA period must be > 0");
        Self {
            period,
            ring: vec![0.0; period],
            next: 0,
            filled: 0,
            running_sum: 0.0,
        }
    }

    /// Push a value; returns the average once the window is full.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        if self.filled == self.period {
            self.running_sum -= self.ring[self.next];
        } else {
            self.filled += 1;
        }
        self.ring[self.next] = value;
        self.running_sum += value;
        self.next = (self.next + 1) % self.period;
        self.value()
    }

    pub fn value(&self) -> Option<f64> {
        (self.filled == self.period).then(|| self.running_sum / self.period as f64)
    }

    pub fn is_ready(&self) -> bool {
        self.filled == self.period
    }

    pub fn period(&self) -> usize {
        self.period
    }
}
