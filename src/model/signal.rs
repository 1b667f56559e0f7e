use serde::Serialize;

/// Per-tick decision emitted by the breakout strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

/// Vectorized per-bar signal columns for the portfolio engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalFlags {
    pub open_long: bool,
    pub close_long: bool,
    pub open_short: bool,
    pub close_short: bool,
}

/// Labels of the sparse execution log.
///
/// The codes follow the research convention of the net-value reports:
/// `b0` open long, `s0` close long, `s1` open short, `b1` close short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SignalLabel {
    #[serde(rename = "b0")]
    OpenLong,
    #[serde(rename = "s0")]
    CloseLong,
    #[serde(rename = "s1")]
    OpenShort,
    #[serde(rename = "b1")]
    CloseShort,
}

impl SignalLabel {
    pub fn opens(&self) -> bool {
        matches!(self, SignalLabel::OpenLong | SignalLabel::OpenShort)
    }
}

/// One row of the execution log. Appended once per bar, never mutated.
///
/// Bars without an execution are logged with `label: None` and the current
/// exposure in `target_pos`, mirroring the NaN rows of the research logs.
#[derive(Debug, Clone, Serialize)]
pub struct SignalRecord {
    pub timestamp: i64,
    pub label: Option<SignalLabel>,
    pub price: Option<f64>,
    pub target_pos: f64,
}

impl SignalRecord {
    pub fn executed(timestamp: i64, label: SignalLabel, price: f64, target_pos: f64) -> Self {
        Self {
            timestamp,
            label: Some(label),
            price: Some(price),
            target_pos,
        }
    }

    pub fn held(timestamp: i64, pos: f64) -> Self {
        Self {
            timestamp,
            label: None,
            price: None,
            target_pos: pos,
        }
    }
}
