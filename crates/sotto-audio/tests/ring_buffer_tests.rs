//! Ring buffer tests
//!
//! Tests cover:
//! - Absolute-index addressing across appends and discards
//! - Clamping semantics (never panic, never error)
//! - Concurrent writer/reader access

use sotto_audio::AudioRingBuffer;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn empty_buffer_reads_empty() {
    let buf = AudioRingBuffer::new();
    assert!(buf.is_empty());
    assert_eq!(buf.total_appended(), 0);
    assert_eq!(buf.read_range(0, 10), Vec::<f32>::new());
}

#[test]
fn total_appended_counts_across_discards() {
    let buf = AudioRingBuffer::new();
    buf.append(&[0.0; 1000]);
    buf.discard_before(600);
    buf.append(&[0.0; 500]);
    assert_eq!(buf.total_appended(), 1500);
    assert_eq!(buf.len(), 900);
    assert_eq!(buf.discarded(), 600);
}

#[test]
fn read_range_after_discard_and_append() {
    let buf = AudioRingBuffer::new();
    let first: Vec<f32> = (0..10).map(|i| i as f32).collect();
    buf.append(&first);
    buf.discard_before(4);

    let second: Vec<f32> = (10..14).map(|i| i as f32).collect();
    buf.append(&second);

    // Absolute indices 4..14 now span the old tail plus the new samples.
    let got = buf.read_range(8, 12);
    assert_eq!(got, vec![8.0, 9.0, 10.0, 11.0]);
}

#[test]
fn discard_past_end_drops_everything() {
    let buf = AudioRingBuffer::new();
    buf.append(&[0.5; 100]);
    assert_eq!(buf.discard_before(u64::MAX), 100);
    assert!(buf.is_empty());
    assert_eq!(buf.total_appended(), 100);
}

#[test]
fn clear_resets_absolute_indexing() {
    let buf = AudioRingBuffer::new();
    buf.append(&[0.5; 100]);
    buf.discard_before(50);
    buf.clear();
    assert_eq!(buf.total_appended(), 0);
    buf.append(&[1.0, 2.0]);
    assert_eq!(buf.read_range(0, 2), vec![1.0, 2.0]);
}

#[test]
fn buffered_duration_at_16khz() {
    let buf = AudioRingBuffer::new();
    buf.append(&[0.0; 16000]);
    let d = buf.buffered_duration(16_000);
    assert!((d.as_secs_f64() - 1.0).abs() < 1e-9);
}

#[test]
fn concurrent_writer_and_reader() {
    let buf = Arc::new(AudioRingBuffer::new());
    let writer = {
        let buf = Arc::clone(&buf);
        thread::spawn(move || {
            for _ in 0..100 {
                buf.append(&[0.25; 160]);
                thread::sleep(Duration::from_micros(50));
            }
        })
    };
    let reader = {
        let buf = Arc::clone(&buf);
        thread::spawn(move || {
            for _ in 0..100 {
                let total = buf.total_appended();
                let chunk = buf.read_range(total.saturating_sub(160), total);
                assert!(chunk.len() <= 160);
                buf.discard_before(total.saturating_sub(1600));
            }
        })
    };
    writer.join().unwrap();
    reader.join().unwrap();

    assert_eq!(buf.total_appended(), 100 * 160);
}
