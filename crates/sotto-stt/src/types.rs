//! Core types for the chunked transcription pipeline

use serde::{Deserialize, Serialize};

/// A transcript fragment produced by the ASR engine.
///
/// Timestamps are slice-relative as returned by the engine and become
/// absolute once the window manager applies the slice offset. Immutable
/// after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    /// Start time in ms (slice-relative until offset-adjusted).
    pub start_ms: i64,
    /// End time in ms (slice-relative until offset-adjusted).
    pub end_ms: i64,
    /// Language the engine detected for this segment, if any.
    pub detected_language: Option<String>,
}

impl Segment {
    pub fn new(text: impl Into<String>, start_ms: i64, end_ms: i64) -> Self {
        Self {
            text: text.into(),
            start_ms,
            end_ms,
            detected_language: None,
        }
    }
}

/// Which portion of the capture buffer to decode next, plus the offset
/// that makes the returned slice-relative timestamps absolute.
///
/// `end_sample > start_sample` always, and the slice length never exceeds
/// the configured chunk size in samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceRequest {
    pub start_sample: u64,
    pub end_sample: u64,
    pub offset_ms: i64,
}

impl SliceRequest {
    pub fn len_samples(&self) -> u64 {
        self.end_sample - self.start_sample
    }
}

/// The published transcript surface: text the session will never retract,
/// and the still-revisable tail.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranscriptSnapshot {
    pub confirmed_text: String,
    pub hypothesis_text: String,
}
