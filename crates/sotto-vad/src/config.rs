use serde::{Deserialize, Serialize};

use super::constants::{
    DEFAULT_RMS_THRESHOLD, ENERGY_HISTORY_WINDOW, FORCE_DECODE_SILENT_TICKS,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnergyGateConfig {
    /// Speech is present when the window peak reaches this RMS level, or
    /// the window average reaches half of it.
    pub rms_threshold: f32,
    /// Trailing RMS samples inspected per decision.
    pub history_window: usize,
    /// Consecutive silent decisions before a forced Proceed.
    pub force_decode_silent_ticks: u32,
}

impl Default for EnergyGateConfig {
    fn default() -> Self {
        Self {
            rms_threshold: DEFAULT_RMS_THRESHOLD,
            history_window: ENERGY_HISTORY_WINDOW,
            force_decode_silent_ticks: FORCE_DECODE_SILENT_TICKS,
        }
    }
}
