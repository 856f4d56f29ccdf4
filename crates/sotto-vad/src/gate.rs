use crate::config::EnergyGateConfig;

/// Whether the current polling tick should run a decode pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    Skip,
}

/// Decides, from a short history of RMS energy values, whether the current
/// window contains speech. RMS computation happens on the capture side;
/// this gate only consumes the values, so decisions are deterministic.
#[derive(Debug, Clone)]
pub struct EnergyGate {
    config: EnergyGateConfig,
}

impl EnergyGate {
    pub fn new(config: EnergyGateConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EnergyGateConfig {
        &self.config
    }

    /// Inspect the trailing window of `history` and decide this tick.
    ///
    /// `consecutive_silent` is caller-held: it resets to 0 on speech,
    /// increments on silence, and once it reaches the force-decode
    /// threshold the gate proceeds anyway. The counter keeps growing past
    /// the threshold so the caller's adaptive delay and no-signal timeout
    /// can key off it.
    pub fn decide(&self, history: &[f32], consecutive_silent: &mut u32) -> GateDecision {
        if self.window_has_speech(history) {
            *consecutive_silent = 0;
            return GateDecision::Proceed;
        }

        *consecutive_silent += 1;
        if *consecutive_silent >= self.config.force_decode_silent_ticks {
            tracing::trace!(
                target: "vad",
                "Forcing decode after {} silent ticks",
                consecutive_silent
            );
            GateDecision::Proceed
        } else {
            GateDecision::Skip
        }
    }

    /// Peak/average test over the trailing window. An empty history counts
    /// as silence.
    pub fn window_has_speech(&self, history: &[f32]) -> bool {
        let window_start = history.len().saturating_sub(self.config.history_window);
        let window = &history[window_start..];
        if window.is_empty() {
            return false;
        }

        let peak = window.iter().copied().fold(0.0f32, f32::max);
        let avg = window.iter().copied().sum::<f32>() / window.len() as f32;

        peak >= self.config.rms_threshold || avg >= self.config.rms_threshold * 0.5
    }
}

impl Default for EnergyGate {
    fn default() -> Self {
        Self::new(EnergyGateConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> EnergyGate {
        EnergyGate::default()
    }

    #[test]
    fn speech_peak_proceeds_and_resets_counter() {
        let g = gate();
        let mut silent = 5;
        let history = vec![0.001, 0.001, 0.2];
        assert_eq!(g.decide(&history, &mut silent), GateDecision::Proceed);
        assert_eq!(silent, 0);
    }

    #[test]
    fn silence_skips_then_forces() {
        let g = gate();
        let mut silent = 0;
        let history = vec![0.0001; 10];
        assert_eq!(g.decide(&history, &mut silent), GateDecision::Skip);
        assert_eq!(silent, 1);
        assert_eq!(g.decide(&history, &mut silent), GateDecision::Proceed);
        assert_eq!(silent, 2);
        // Still forced, counter keeps counting.
        assert_eq!(g.decide(&history, &mut silent), GateDecision::Proceed);
        assert_eq!(silent, 3);
    }

    #[test]
    fn average_alone_can_declare_speech() {
        let g = gate();
        let mut silent = 0;
        // Peak below threshold, average above threshold/2.
        let history = vec![0.010; 10];
        assert_eq!(g.decide(&history, &mut silent), GateDecision::Proceed);
        assert_eq!(silent, 0);
    }
}
