/// How many trailing RMS samples the gate inspects per decision.
pub const ENERGY_HISTORY_WINDOW: usize = 10;

/// Consecutive silent decisions after which the gate proceeds anyway, so
/// confirmed chunks still flush during total silence and the no-signal
/// timeout downstream can fire.
pub const FORCE_DECODE_SILENT_TICKS: u32 = 2;

/// Default RMS presence threshold. The two native tunings disagreed
/// (0.3 peak-normalized vs 0.0015 raw); this sits above typical phone-mic
/// ambient noise and well below speech on the raw [0,1] RMS scale.
pub const DEFAULT_RMS_THRESHOLD: f32 = 0.015;
