//! Chunk-window manager tests
//!
//! Tests cover:
//! - Monotonic confirmation (confirmed text never shrinks, watermark never
//!   moves backwards)
//! - Slice bounding and boundary arithmetic
//! - Prefix confirmation, no-match replacement, whitespace tolerance
//! - Chunk finalization and trailing flush
//! - Idempotent reset

use sotto_stt::chunk::{ChunkWindowConfig, ChunkWindowManager};
use sotto_stt::types::Segment;

fn manager() -> ChunkWindowManager {
    ChunkWindowManager::new(ChunkWindowConfig {
        sample_rate_hz: 16_000,
        chunk_seconds: 15.0,
        min_poll_interval_ms: 500,
    })
}

fn seg(text: &str, start_ms: i64, end_ms: i64) -> Segment {
    Segment::new(text, start_ms, end_ms)
}

// ─── Confirmation ────────────────────────────────────────────────────

#[test]
fn stable_prefix_is_confirmed() {
    let mut mgr = manager();
    mgr.process_result(vec![seg("A", 0, 500), seg("B", 500, 1000)], 0);
    assert_eq!(mgr.confirmed_text(), "");
    assert_eq!(mgr.hypothesis_text(), "A B");

    mgr.process_result(
        vec![seg("A", 0, 500), seg("B", 500, 1000), seg("C", 1000, 1500)],
        0,
    );
    assert_eq!(mgr.confirmed_text(), "A B");
    assert_eq!(mgr.hypothesis_text(), "C");
    assert_eq!(mgr.last_confirmed_end_ms(), 1000);
}

#[test]
fn no_match_replaces_hypothesis_without_confirming() {
    let mut mgr = manager();
    mgr.process_result(vec![seg("A", 0, 500)], 0);
    mgr.process_result(vec![seg("Z", 0, 500)], 0);
    assert_eq!(mgr.confirmed_text(), "");
    assert_eq!(mgr.hypothesis_text(), "Z");
    assert_eq!(mgr.last_confirmed_end_ms(), 0);
}

#[test]
fn whitespace_differences_do_not_block_confirmation() {
    let mut mgr = manager();
    mgr.process_result(vec![seg(" Hello ", 0, 700)], 0);
    mgr.process_result(vec![seg("Hello", 0, 700), seg("world", 700, 1200)], 0);
    assert_eq!(mgr.confirmed_text(), "Hello");
    assert_eq!(mgr.hypothesis_text(), "world");
}

#[test]
fn confirmed_text_never_shrinks() {
    let mut mgr = manager();
    let mut longest_confirmed = String::new();
    let mut last_watermark = 0;

    let passes: Vec<Vec<Segment>> = vec![
        vec![seg("one", 0, 400)],
        vec![seg("one", 0, 400), seg("two", 400, 900)],
        vec![seg("two", 0, 500)], // still matches the open hypothesis
        vec![seg("one", 0, 300)], // diverges from the (now empty) hypothesis
        vec![seg("one", 0, 300), seg("three", 300, 800)],
    ];
    for pass in passes {
        mgr.process_result(pass, 0);
        let confirmed = mgr.confirmed_text().to_string();
        assert!(
            confirmed.starts_with(&longest_confirmed),
            "confirmed text was rewritten: {:?} -> {:?}",
            longest_confirmed,
            confirmed
        );
        if confirmed.len() > longest_confirmed.len() {
            longest_confirmed = confirmed;
        }
        assert!(mgr.last_confirmed_end_ms() >= last_watermark);
        last_watermark = mgr.last_confirmed_end_ms();
    }
}

#[test]
fn watermark_clamped_against_backwards_timestamps() {
    let mut mgr = manager();
    mgr.process_result(vec![seg("A", 0, 2000)], 0);
    mgr.process_result(vec![seg("A", 0, 2000), seg("B", 2000, 2500)], 0);
    assert_eq!(mgr.last_confirmed_end_ms(), 2000);

    // Next pass confirms B with an earlier end timestamp than the current
    // watermark; the watermark must not move backwards.
    mgr.process_result(vec![seg("B", 0, 100)], 0);
    mgr.process_result(vec![seg("B", 0, 100), seg("C", 100, 200)], 0);
    assert_eq!(mgr.last_confirmed_end_ms(), 2000);
}

#[test]
fn offset_adjusts_timestamps_before_confirmation() {
    let mut mgr = manager();
    mgr.process_result(vec![seg("tail", 0, 2000)], 15_000);
    mgr.process_result(vec![seg("tail", 0, 2000), seg("end", 2000, 3000)], 15_000);
    // tail confirmed with absolute end 17000ms.
    assert_eq!(mgr.confirmed_text(), "tail");
    assert_eq!(mgr.last_confirmed_end_ms(), 17_000);
}

// ─── Slice computation ───────────────────────────────────────────────

#[test]
fn slice_never_exceeds_chunk_bound() {
    let mut mgr = manager();
    let chunk_samples = 15 * 16_000;
    for total in [1_u64, 8000, 16_000, 240_000, 256_000, 1_000_000, 5_000_000] {
        if let Some(req) = mgr.compute_slice(total) {
            assert!(
                req.len_samples() <= chunk_samples,
                "slice {} exceeds bound for total {}",
                req.len_samples(),
                total
            );
            assert!(req.end_sample > req.start_sample);
        }
    }
}

#[test]
fn empty_buffer_yields_no_slice() {
    let mut mgr = manager();
    assert_eq!(mgr.compute_slice(0), None);
}

#[test]
fn slice_starts_at_watermark_with_matching_offset() {
    let mut mgr = manager();
    mgr.process_result(vec![seg("A", 0, 2000)], 0);
    mgr.process_result(vec![seg("A", 0, 2000), seg("B", 2000, 2600)], 0);
    assert_eq!(mgr.last_confirmed_end_ms(), 2000);

    let req = mgr.compute_slice(160_000).unwrap(); // 10s buffered
    assert_eq!(req.start_sample, 32_000); // 2s * 16kHz
    assert_eq!(req.end_sample, 160_000);
    assert_eq!(req.offset_ms, 2000);
}

#[test]
fn buffer_past_boundary_finalizes_chunk() {
    let mut mgr = manager();
    mgr.process_result(vec![seg("chunk one text", 0, 3000)], 0);

    // 16s of audio at 16kHz crosses the 15s boundary.
    let req = mgr.compute_slice(256_000).unwrap();
    assert_eq!(mgr.last_confirmed_end_ms(), 15_000);
    assert_eq!(mgr.completed_chunks_text(), "chunk one text");
    assert_eq!(mgr.confirmed_text(), "chunk one text");
    assert_eq!(mgr.hypothesis_text(), "");

    // The next slice starts at the boundary, not the buffer head.
    assert_eq!(req.start_sample, 240_000);
    assert_eq!(req.end_sample, 256_000);
    assert_eq!(req.offset_ms, 15_000);
}

#[test]
fn silent_chunk_finalization_appends_nothing() {
    let mut mgr = manager();
    // No hypothesis at all; crossing the boundary must not grow the text.
    mgr.compute_slice(256_000);
    assert_eq!(mgr.completed_chunks_text(), "");
    assert_eq!(mgr.last_confirmed_end_ms(), 15_000);
}

#[test]
fn consecutive_chunks_accumulate_in_order() {
    let mut mgr = manager();
    mgr.process_result(vec![seg("first chunk", 0, 3000)], 0);
    mgr.compute_slice(256_000); // past 15s
    mgr.process_result(vec![seg("second chunk", 0, 2000)], 15_000);
    mgr.compute_slice(496_000); // past 30s
    assert_eq!(mgr.completed_chunks_text(), "first chunk second chunk");
    assert_eq!(mgr.last_confirmed_end_ms(), 30_000);
}

// ─── Trailing flush ──────────────────────────────────────────────────

#[test]
fn trailing_flush_appends_without_matching() {
    let mut mgr = manager();
    mgr.process_result(vec![seg("first chunk", 0, 3000)], 0);
    mgr.compute_slice(256_000);
    assert_eq!(mgr.completed_chunks_text(), "first chunk");

    mgr.finalize_trailing(vec![seg("trailing text", 0, 3000)], 15_000);
    assert_eq!(mgr.confirmed_text(), "first chunk trailing text");
    assert_eq!(mgr.hypothesis_text(), "");
    assert_eq!(mgr.last_confirmed_end_ms(), 18_000);
}

#[test]
fn trailing_flush_clears_open_hypothesis() {
    let mut mgr = manager();
    mgr.process_result(vec![seg("maybe", 0, 1000)], 0);
    mgr.finalize_trailing(vec![seg("definitely", 0, 1000)], 0);
    assert_eq!(mgr.confirmed_text(), "definitely");
    assert_eq!(mgr.hypothesis_text(), "");
}

// ─── Reset ───────────────────────────────────────────────────────────

#[test]
fn reset_is_indistinguishable_from_fresh() {
    let mut mgr = manager();
    mgr.process_result(vec![seg("some", 0, 500), seg("text", 500, 1000)], 0);
    mgr.process_result(
        vec![seg("some", 0, 500), seg("text", 500, 1000), seg("more", 1000, 1500)],
        0,
    );
    mgr.compute_slice(256_000);
    mgr.finalize_trailing(vec![seg("end", 0, 500)], 15_000);

    mgr.reset();

    let fresh = manager();
    assert_eq!(mgr.confirmed_text(), fresh.confirmed_text());
    assert_eq!(mgr.hypothesis_text(), fresh.hypothesis_text());
    assert_eq!(mgr.completed_chunks_text(), fresh.completed_chunks_text());
    assert_eq!(mgr.last_confirmed_end_ms(), fresh.last_confirmed_end_ms());
    // And it behaves like fresh afterwards.
    assert_eq!(mgr.compute_slice(0), None);
    let req = mgr.compute_slice(16_000).unwrap();
    assert_eq!(req.start_sample, 0);
    assert_eq!(req.offset_ms, 0);
}
