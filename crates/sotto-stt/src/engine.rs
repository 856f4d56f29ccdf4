//! Capability-tagged ASR engine boundary.
//!
//! Batch engines decode a whole slice per call (whisper-style); streaming
//! engines are fed incrementally and polled (transducer-style). The
//! variant makes the capability explicit instead of hiding it behind one
//! interface with silently-ignored default methods.

use crate::types::Segment;
use sotto_foundation::EngineError;

/// One-shot decode over a complete audio slice. Blocking by contract;
/// the session controller runs calls on a blocking task.
pub trait BatchEngine: Send {
    fn is_ready(&self) -> bool;

    /// Decode f32 PCM in [-1.0, 1.0] at the given rate. Returned segment
    /// timestamps are relative to the start of `samples`.
    fn transcribe(
        &mut self,
        samples: &[f32],
        sample_rate_hz: u32,
    ) -> Result<Vec<Segment>, EngineError>;
}

/// Incremental decode: feed audio, poll for segments, reset at utterance
/// endpoints.
pub trait StreamingEngine: Send {
    fn is_ready(&self) -> bool;

    fn feed(&mut self, samples: &[f32], sample_rate_hz: u32) -> Result<(), EngineError>;

    /// Current decode of everything fed since the last reset.
    fn poll(&mut self) -> Result<Vec<Segment>, EngineError>;

    /// Whether the engine has detected the speaker pausing/stopping.
    fn endpoint_reached(&self) -> bool;

    fn reset(&mut self);
}

/// An ASR engine tagged by capability.
pub enum SttEngine {
    Batch(Box<dyn BatchEngine>),
    Streaming(Box<dyn StreamingEngine>),
}

impl SttEngine {
    pub fn is_ready(&self) -> bool {
        match self {
            SttEngine::Batch(e) => e.is_ready(),
            SttEngine::Streaming(e) => e.is_ready(),
        }
    }

    /// Decode one slice regardless of capability. Batch engines get the
    /// slice as a single call; streaming engines are fed the slice and
    /// polled, with a reset once they report an endpoint so the next slice
    /// starts a fresh utterance.
    pub fn transcribe_slice(
        &mut self,
        samples: &[f32],
        sample_rate_hz: u32,
    ) -> Result<Vec<Segment>, EngineError> {
        match self {
            SttEngine::Batch(e) => e.transcribe(samples, sample_rate_hz),
            SttEngine::Streaming(e) => {
                e.feed(samples, sample_rate_hz)?;
                let segments = e.poll()?;
                if e.endpoint_reached() {
                    e.reset();
                }
                Ok(segments)
            }
        }
    }
}

impl std::fmt::Debug for SttEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SttEngine::Batch(_) => f.write_str("SttEngine::Batch"),
            SttEngine::Streaming(_) => f.write_str("SttEngine::Streaming"),
        }
    }
}
