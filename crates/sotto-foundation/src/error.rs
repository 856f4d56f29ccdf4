use std::time::Duration;
use thiserror::Error;

/// Errors surfaced to the embedding application by a session.
///
/// Ring-buffer and window-manager operations never fail on out-of-range
/// input (they clamp); only the session controller produces these.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("ASR model is not ready")]
    ModelNotReady,

    #[error("No microphone signal for {timeout:?} with no text produced")]
    NoMicrophoneSignal { timeout: Duration },

    #[error("Engine transcription failed: {0}")]
    EngineTranscribeFailed(#[from] EngineError),

    /// Internal invariant violation. Should never reach a caller; kept in
    /// the taxonomy so the debug-assert path has a typed carrier.
    #[error("Invalid slice request: {0}")]
    InvalidSliceRequest(String),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

/// Errors from the external ASR engine boundary.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Engine is not ready")]
    NotReady,

    #[error("Transcription failed: {0}")]
    Transcribe(String),

    #[error("Engine task aborted: {0}")]
    TaskAborted(String),
}
