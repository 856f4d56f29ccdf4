pub mod config;
pub mod constants;
pub mod gate;

pub use config::EnergyGateConfig;
pub use constants::{ENERGY_HISTORY_WINDOW, FORCE_DECODE_SILENT_TICKS};
pub use gate::{EnergyGate, GateDecision};
