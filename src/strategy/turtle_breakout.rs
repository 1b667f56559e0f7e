use crate::feature::StrategyRow;
use crate::model::signal::Signal;

/// Arming stages of the breakout confirmation sequence. Only one stage is
/// live at a time; stages advance in fixed priority order and reset on
/// entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakoutStage {
    Idle,
    /// Close broke below the slow-channel low.
    ArmedBelowSlow,
    /// While armed, close broke above the mid-channel high.
    ConfirmedAboveMid,
    /// While confirmed, close broke below the fast-channel low.
    ConfirmedBelowFast,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PositionState {
    Flat,
    Long,
}

/// Multi-stage breakout/trend strategy evaluated once per merged tick row.
///
/// Entry requires the full `ArmedBelowSlow -> ConfirmedAboveMid -> ConfirmedBelowFast`
/// sequence, then a close above the slow-channel high together with the
/// entry gate. Exit fires unconditionally on either exit flag while long.
#[derive(Debug)]
pub struct TurtleBreakoutStrategy {
    stage: BreakoutStage,
    position: PositionState,
}

impl TurtleBreakoutStrategy {
    pub fn new() -> Self {
        Self {
            stage: BreakoutStage::Idle,
            position: PositionState::Flat,
        }
    }

    pub fn stage(&self) -> BreakoutStage {
        self.stage
    }

    pub fn is_long(&self) -> bool {
        self.position == PositionState::Long
    }

    pub fn on_row(&mut self, row: &StrategyRow) -> Signal {
        match self.position {
            PositionState::Flat => {
                // Stage transitions are checked in priority order; a single
                // row can only satisfy one of them since the thresholds are
                // ordered, but the cascade keeps the arming sequence exact.
                if row.break_below_slow {
                    self.stage = BreakoutStage::ArmedBelowSlow;
                }
                if self.stage == BreakoutStage::ArmedBelowSlow && row.break_above_mid {
                    self.stage = BreakoutStage::ConfirmedAboveMid;
                }
                if self.stage == BreakoutStage::ConfirmedAboveMid && row.break_below_fast {
                    self.stage = BreakoutStage::ConfirmedBelowFast;
                }

                if self.stage == BreakoutStage::ConfirmedBelowFast && row.break_above_slow {
                    self.stage = BreakoutStage::Idle;
                    if row.entry_gate {
                        self.position = PositionState::Long;
                        return Signal::Buy;
                    }
                }
                Signal::Hold
            }
            PositionState::Long => {
                if row.exit_channel || row.exit_trend {
                    self.position = PositionState::Flat;
                    Signal::Sell
                } else {
                    Signal::Hold
                }
            }
        }
    }
}

impl Default for TurtleBreakoutStrategy {
    fn default() -> Self {
        Self::new()
    }
}
