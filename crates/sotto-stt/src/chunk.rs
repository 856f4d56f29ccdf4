//! Chunk-window manager: the confirmation algorithm.
//!
//! Audio is decoded in overlapping passes over a bounded window. A prefix
//! of segments that survives two consecutive passes unchanged is treated
//! as converged and locked in; everything past the divergence point stays
//! revisable. When the buffer grows past the chunk boundary the open
//! window is flushed wholesale and the watermark jumps to the boundary,
//! which caps each decode at `chunk_seconds` of audio.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::text::{join_nonblank, normalize_whitespace, render_segments};
use crate::types::{Segment, SliceRequest};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChunkWindowConfig {
    pub sample_rate_hz: u32,
    /// Fixed duration of one revisable window.
    pub chunk_seconds: f64,
    /// Base polling interval, scaled up by `adaptive_delay` during silence.
    pub min_poll_interval_ms: u64,
}

impl Default for ChunkWindowConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 16_000,
            chunk_seconds: 15.0,
            min_poll_interval_ms: 500,
        }
    }
}

impl ChunkWindowConfig {
    pub fn chunk_ms(&self) -> i64 {
        (self.chunk_seconds * 1000.0).round() as i64
    }

    pub fn chunk_samples(&self) -> u64 {
        (self.chunk_seconds * self.sample_rate_hz as f64).round() as u64
    }

    pub fn ms_to_samples(&self, ms: i64) -> u64 {
        (ms.max(0) as u64) * self.sample_rate_hz as u64 / 1000
    }
}

/// Per-session window state. All mutation happens through
/// `compute_slice` / `process_result` / `finalize_trailing` / `reset`.
pub struct ChunkWindowManager {
    config: ChunkWindowConfig,
    /// Segments of the open chunk the session will never retract.
    confirmed_segments: Vec<Segment>,
    /// Latest hypothesis for the open chunk, subject to revision.
    prev_unconfirmed: Vec<Segment>,
    /// High-water mark; also the open chunk's current slice start.
    last_confirmed_end_ms: i64,
    /// Text of every finalized chunk, space-joined. Append-only.
    completed_chunks_text: String,
    confirmed_text: String,
    hypothesis_text: String,
}

impl ChunkWindowManager {
    pub fn new(config: ChunkWindowConfig) -> Self {
        Self {
            config,
            confirmed_segments: Vec::new(),
            prev_unconfirmed: Vec::new(),
            last_confirmed_end_ms: 0,
            completed_chunks_text: String::new(),
            confirmed_text: String::new(),
            hypothesis_text: String::new(),
        }
    }

    pub fn config(&self) -> &ChunkWindowConfig {
        &self.config
    }

    pub fn confirmed_text(&self) -> &str {
        &self.confirmed_text
    }

    pub fn hypothesis_text(&self) -> &str {
        &self.hypothesis_text
    }

    pub fn completed_chunks_text(&self) -> &str {
        &self.completed_chunks_text
    }

    pub fn last_confirmed_end_ms(&self) -> i64 {
        self.last_confirmed_end_ms
    }

    /// Compute the next inference slice, finalizing the open chunk first
    /// when the buffer has grown past its boundary. Returns `None` when no
    /// new audio lies past the watermark.
    pub fn compute_slice(&mut self, total_buffered_samples: u64) -> Option<SliceRequest> {
        let chunk_end_ms = self.last_confirmed_end_ms + self.config.chunk_ms();
        let buffered_ms =
            total_buffered_samples as i64 * 1000 / self.config.sample_rate_hz as i64;

        if buffered_ms > chunk_end_ms {
            self.finalize_chunk();
            // Watermark jumps to the boundary, not the buffer head, so the
            // next slice still starts at the chunk edge and decode cost
            // stays capped at chunk_seconds.
            self.last_confirmed_end_ms = chunk_end_ms;
            tracing::debug!(
                target: "chunk",
                "Chunk finalized at {}ms ({}ms buffered)",
                chunk_end_ms,
                buffered_ms
            );
        }

        let start_sample = self.config.ms_to_samples(self.last_confirmed_end_ms);
        let end_sample = total_buffered_samples
            .min(start_sample + self.config.chunk_samples());

        if end_sample <= start_sample {
            return None;
        }

        let request = SliceRequest {
            start_sample,
            end_sample,
            offset_ms: self.last_confirmed_end_ms,
        };
        debug_assert!(
            request.len_samples() <= self.config.chunk_samples(),
            "slice exceeds chunk bound: {:?}",
            request
        );
        Some(request)
    }

    /// Reconcile a fresh decode pass against the previous hypothesis,
    /// confirming the longest matching prefix.
    pub fn process_result(&mut self, mut new_segments: Vec<Segment>, offset_ms: i64) {
        adjust_offsets(&mut new_segments, offset_ms);

        let matched = matching_prefix_len(&self.prev_unconfirmed, &new_segments);
        if matched > 0 {
            let remaining = new_segments.split_off(matched);
            // `matched > 0` guarantees a last element.
            if let Some(last) = new_segments.last() {
                // Engine timestamps are not trusted to be monotone; the
                // watermark never moves backwards.
                self.last_confirmed_end_ms = self.last_confirmed_end_ms.max(last.end_ms);
            }
            tracing::debug!(
                target: "chunk",
                "Confirmed {} segment(s), watermark {}ms, {} still open",
                matched,
                self.last_confirmed_end_ms,
                remaining.len()
            );
            self.confirmed_segments.extend(new_segments);
            self.prev_unconfirmed = remaining;
        } else {
            // No stable prefix (or either side empty): the new pass
            // replaces the hypothesis wholesale.
            self.prev_unconfirmed = new_segments;
        }

        self.republish();
    }

    /// End-of-stream flush: everything remaining is final, no matching
    /// pass required.
    pub fn finalize_trailing(&mut self, mut segments: Vec<Segment>, offset_ms: i64) {
        adjust_offsets(&mut segments, offset_ms);
        if let Some(last) = segments.last() {
            self.last_confirmed_end_ms = self.last_confirmed_end_ms.max(last.end_ms);
        }
        self.confirmed_segments.extend(segments);
        self.prev_unconfirmed.clear();
        self.republish();
    }

    /// Polling delay for the caller, stretched while the gate keeps
    /// reporting silence.
    pub fn adaptive_delay(&self, consecutive_silent: u32) -> Duration {
        let factor = if consecutive_silent > 5 {
            3
        } else if consecutive_silent > 2 {
            2
        } else {
            1
        };
        Duration::from_millis(self.config.min_poll_interval_ms * factor)
    }

    /// Return to the freshly-constructed state. Callable at any time.
    pub fn reset(&mut self) {
        self.confirmed_segments.clear();
        self.prev_unconfirmed.clear();
        self.last_confirmed_end_ms = 0;
        self.completed_chunks_text.clear();
        self.confirmed_text.clear();
        self.hypothesis_text.clear();
    }

    /// Flush the open chunk (confirmed + hypothesis) into the completed
    /// text and clear the window.
    fn finalize_chunk(&mut self) {
        let confirmed = render_segments(&self.confirmed_segments);
        let open = render_segments(&self.prev_unconfirmed);
        let chunk_text = join_nonblank(&confirmed, &open);
        if !chunk_text.is_empty() {
            self.completed_chunks_text =
                join_nonblank(&self.completed_chunks_text, &chunk_text);
        }
        self.confirmed_segments.clear();
        self.prev_unconfirmed.clear();
        self.republish();
    }

    fn republish(&mut self) {
        self.confirmed_text = join_nonblank(
            &self.completed_chunks_text,
            &render_segments(&self.confirmed_segments),
        );
        self.hypothesis_text = render_segments(&self.prev_unconfirmed);
    }
}

impl Default for ChunkWindowManager {
    fn default() -> Self {
        Self::new(ChunkWindowConfig::default())
    }
}

fn adjust_offsets(segments: &mut [Segment], offset_ms: i64) {
    if offset_ms > 0 {
        for s in segments.iter_mut() {
            s.start_ms += offset_ms;
            s.end_ms += offset_ms;
        }
    }
}

/// Longest prefix over which both passes agree, compared in normalized
/// form. Zero when either side is empty.
fn matching_prefix_len(prev: &[Segment], new: &[Segment]) -> usize {
    prev.iter()
        .zip(new.iter())
        .take_while(|(a, b)| normalize_whitespace(&a.text) == normalize_whitespace(&b.text))
        .count()
}
