use serde::{Deserialize, Serialize};

/// A single trade print: unix-seconds timestamp plus traded price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tick {
    pub timestamp: i64,
    pub price: f64,
}

impl Tick {
    /// Synthetic tick for tests and warm-up sequences.
    pub fn at(timestamp: i64, price: f64) -> Self {
        Self { timestamp, price }
    }
}
