//! Session orchestration: the polling loop around the window manager.
//!
//! One controller per session. The spawned polling task is the sole
//! mutator of the window manager while recording; `stop()` and
//! `clear_error()` only touch it after the task has been joined. Stop is
//! made immediately authoritative by a session token that every async
//! step re-checks before mutating shared state.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::chunk::{ChunkWindowConfig, ChunkWindowManager};
use crate::engine::SttEngine;
use crate::types::{Segment, TranscriptSnapshot};
use sotto_audio::AudioRingBuffer;
use sotto_foundation::{EngineError, SessionError, SessionState, SessionStateMachine};
use sotto_vad::{EnergyGate, EnergyGateConfig, GateDecision};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub window: ChunkWindowConfig,
    pub energy: EnergyGateConfig,
    /// Minimum new audio past the last-seen pointer before a tick does
    /// any work.
    pub min_new_audio_ms: u64,
    /// With no speech heard and no text produced for this long, the
    /// session errors out with `NoMicrophoneSignal`.
    pub no_signal_timeout: Duration,
    /// Bound on the rolling RMS history kept for the gate.
    pub energy_history_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            window: ChunkWindowConfig::default(),
            energy: EnergyGateConfig::default(),
            min_new_audio_ms: 500,
            no_signal_timeout: Duration::from_secs(10),
            energy_history_len: 50,
        }
    }
}

impl SessionConfig {
    fn min_new_audio_samples(&self) -> u64 {
        self.window.sample_rate_hz as u64 * self.min_new_audio_ms / 1000
    }
}

/// Per-session counters, logged when the polling loop exits.
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    pub ticks: u64,
    pub gate_skips: u64,
    pub busy_skips: u64,
    pub decode_calls: u64,
    pub errors: u64,
}

pub struct SessionController {
    config: SessionConfig,
    ring: Arc<AudioRingBuffer>,
    engine: Arc<Mutex<SttEngine>>,
    manager: Arc<Mutex<ChunkWindowManager>>,
    gate: EnergyGate,
    state: Arc<SessionStateMachine>,
    /// Current session token. Minted on every entry into Recording;
    /// stale tokens make in-flight work a no-op.
    token: Arc<AtomicU64>,
    /// Non-blocking single-flight guard around the engine call.
    inference_busy: Arc<AtomicBool>,
    energy_history: Arc<Mutex<VecDeque<f32>>>,
    transcript_tx: Arc<watch::Sender<TranscriptSnapshot>>,
    stats: Arc<Mutex<SessionStats>>,
    loop_handle: Mutex<Option<JoinHandle<()>>>,
}

impl SessionController {
    pub fn new(engine: SttEngine, config: SessionConfig) -> Self {
        let gate = EnergyGate::new(config.energy);
        let manager = ChunkWindowManager::new(config.window);
        let (transcript_tx, _) = watch::channel(TranscriptSnapshot::default());
        Self {
            config,
            ring: Arc::new(AudioRingBuffer::new()),
            engine: Arc::new(Mutex::new(engine)),
            manager: Arc::new(Mutex::new(manager)),
            gate,
            state: Arc::new(SessionStateMachine::new()),
            token: Arc::new(AtomicU64::new(0)),
            inference_busy: Arc::new(AtomicBool::new(false)),
            energy_history: Arc::new(Mutex::new(VecDeque::new())),
            transcript_tx: Arc::new(transcript_tx),
            stats: Arc::new(Mutex::new(SessionStats::default())),
            loop_handle: Mutex::new(None),
        }
    }

    /// Buffer the capture side appends into.
    pub fn ring(&self) -> Arc<AudioRingBuffer> {
        Arc::clone(&self.ring)
    }

    /// Push one RMS energy value from the capture side.
    pub fn push_rms(&self, rms: f32) {
        let mut history = self.energy_history.lock();
        history.push_back(rms);
        while history.len() > self.config.energy_history_len {
            history.pop_front();
        }
    }

    pub fn transcript(&self) -> watch::Receiver<TranscriptSnapshot> {
        self.transcript_tx.subscribe()
    }

    pub fn snapshot(&self) -> TranscriptSnapshot {
        self.transcript_tx.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.state.current()
    }

    pub fn subscribe_state(&self) -> crossbeam_channel::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats.lock().clone()
    }

    /// Begin recording. Requires a tokio runtime; the polling loop runs as
    /// a spawned task until `stop()` or an error.
    pub fn start(&self) -> Result<(), SessionError> {
        if !self.engine.lock().is_ready() {
            return Err(SessionError::ModelNotReady);
        }
        self.state.transition(SessionState::Recording)?;

        let my_token = self.token.fetch_add(1, Ordering::SeqCst) + 1;
        self.manager.lock().reset();
        self.ring.clear();
        self.energy_history.lock().clear();
        *self.stats.lock() = SessionStats::default();
        self.transcript_tx.send_replace(TranscriptSnapshot::default());

        let worker = PollWorker {
            config: self.config.clone(),
            ring: Arc::clone(&self.ring),
            engine: Arc::clone(&self.engine),
            manager: Arc::clone(&self.manager),
            gate: self.gate.clone(),
            state: Arc::clone(&self.state),
            token: Arc::clone(&self.token),
            my_token,
            inference_busy: Arc::clone(&self.inference_busy),
            energy_history: Arc::clone(&self.energy_history),
            transcript_tx: Arc::clone(&self.transcript_tx),
            stats: Arc::clone(&self.stats),
        };
        let handle = tokio::spawn(worker.run());
        *self.loop_handle.lock() = Some(handle);

        info!(target: "session", "Recording started (token {})", my_token);
        Ok(())
    }

    /// Stop recording: invalidate the token, join the polling task, flush
    /// the trailing audio, return to Idle.
    pub async fn stop(&self) -> Result<(), SessionError> {
        self.state.transition(SessionState::Stopping)?;
        self.token.fetch_add(1, Ordering::SeqCst);

        let handle = self.loop_handle.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(target: "session", "Polling task join failed: {}", e);
            }
        }

        match self.flush_trailing().await {
            Ok(()) => {
                self.state.transition(SessionState::Idle)?;
                info!(target: "session", "Recording stopped");
                Ok(())
            }
            Err(e) => {
                let _ = self.state.transition(SessionState::Error {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Leave the Error state. The manager and buffers reset fully, so the
    /// next `start()` runs against clean engine-facing state.
    pub fn clear_error(&self) -> Result<(), SessionError> {
        self.state.transition(SessionState::Idle)?;
        self.manager.lock().reset();
        self.ring.clear();
        self.energy_history.lock().clear();
        self.transcript_tx.send_replace(TranscriptSnapshot::default());
        Ok(())
    }

    /// One last decode over everything past the confirmed watermark. The
    /// polling task has been joined, so the engine and manager are free.
    async fn flush_trailing(&self) -> Result<(), SessionError> {
        let total = self.ring.total_appended();
        let request = self.manager.lock().compute_slice(total);
        let Some(request) = request else {
            publish(&self.transcript_tx, &self.manager);
            return Ok(());
        };

        let samples = self.ring.read_range(request.start_sample, request.end_sample);
        if samples.is_empty() {
            publish(&self.transcript_tx, &self.manager);
            return Ok(());
        }

        self.stats.lock().decode_calls += 1;
        let segments =
            run_decode(&self.engine, samples, self.config.window.sample_rate_hz).await?;
        debug!(
            target: "session",
            "Trailing flush decoded {} segment(s) at offset {}ms",
            segments.len(),
            request.offset_ms
        );
        self.manager.lock().finalize_trailing(segments, request.offset_ms);
        publish(&self.transcript_tx, &self.manager);
        Ok(())
    }
}

struct PollWorker {
    config: SessionConfig,
    ring: Arc<AudioRingBuffer>,
    engine: Arc<Mutex<SttEngine>>,
    manager: Arc<Mutex<ChunkWindowManager>>,
    gate: EnergyGate,
    state: Arc<SessionStateMachine>,
    token: Arc<AtomicU64>,
    my_token: u64,
    inference_busy: Arc<AtomicBool>,
    energy_history: Arc<Mutex<VecDeque<f32>>>,
    transcript_tx: Arc<watch::Sender<TranscriptSnapshot>>,
    stats: Arc<Mutex<SessionStats>>,
}

impl PollWorker {
    fn is_current(&self) -> bool {
        self.token.load(Ordering::SeqCst) == self.my_token
    }

    async fn run(self) {
        let min_new_samples = self.config.min_new_audio_samples();
        let mut last_seen_samples: u64 = 0;
        let mut consecutive_silent: u32 = 0;
        let mut last_speech = Instant::now();

        loop {
            if !self.is_current() || !self.state.is_recording() {
                break;
            }
            self.stats.lock().ticks += 1;

            if self.no_signal_expired(last_speech) {
                self.fail(SessionError::NoMicrophoneSignal {
                    timeout: self.config.no_signal_timeout,
                });
                break;
            }

            let total = self.ring.total_appended();
            if total.saturating_sub(last_seen_samples) < min_new_samples {
                self.sleep(consecutive_silent).await;
                continue;
            }

            let decision = {
                let history = self.energy_history.lock();
                let window: Vec<f32> = history.iter().copied().collect();
                self.gate.decide(&window, &mut consecutive_silent)
            };
            if consecutive_silent == 0 {
                last_speech = Instant::now();
            }
            if decision == GateDecision::Skip {
                // Advance past the silent audio without transcribing it.
                self.stats.lock().gate_skips += 1;
                last_seen_samples = total;
                self.sleep(consecutive_silent).await;
                continue;
            }

            // Never queue a second inference; a held guard skips the tick.
            if self
                .inference_busy
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                self.stats.lock().busy_skips += 1;
                self.sleep(consecutive_silent).await;
                continue;
            }

            let request = self.manager.lock().compute_slice(total);
            let outcome = match request {
                Some(request) => self.decode_tick(request).await,
                None => Ok(()),
            };
            self.inference_busy.store(false, Ordering::SeqCst);

            if let Err(e) = outcome {
                self.fail(e);
                break;
            }

            last_seen_samples = total;
            self.sleep(consecutive_silent).await;
        }

        let stats = self.stats.lock().clone();
        info!(
            target: "session",
            "Polling loop exit (token {}): ticks={} gate_skips={} busy_skips={} decodes={} errors={}",
            self.my_token,
            stats.ticks,
            stats.gate_skips,
            stats.busy_skips,
            stats.decode_calls,
            stats.errors
        );
    }

    async fn decode_tick(&self, request: crate::types::SliceRequest) -> Result<(), SessionError> {
        let samples = self.ring.read_range(request.start_sample, request.end_sample);
        if samples.is_empty() {
            return Ok(());
        }

        self.stats.lock().decode_calls += 1;
        debug!(
            target: "session",
            "Decoding slice [{}, {}) at offset {}ms",
            request.start_sample,
            request.end_sample,
            request.offset_ms
        );
        let segments =
            run_decode(&self.engine, samples, self.config.window.sample_rate_hz).await?;

        // A stale token means stop() has taken over; the result is dropped
        // without touching shared state.
        if !self.is_current() {
            debug!(target: "session", "Dropping decode result for stale token {}", self.my_token);
            return Ok(());
        }

        let trim_to = {
            let mut manager = self.manager.lock();
            manager.process_result(segments, request.offset_ms);
            manager
                .config()
                .ms_to_samples(manager.last_confirmed_end_ms())
        };
        // Only samples already consumed into confirmed text are dropped;
        // everything past the watermark may still be re-decoded.
        self.ring.discard_before(trim_to);
        publish(&self.transcript_tx, &self.manager);
        Ok(())
    }

    fn no_signal_expired(&self, last_speech: Instant) -> bool {
        if last_speech.elapsed() < self.config.no_signal_timeout {
            return false;
        }
        let manager = self.manager.lock();
        manager.confirmed_text().is_empty() && manager.hypothesis_text().is_empty()
    }

    fn fail(&self, error: SessionError) {
        warn!(target: "session", "Session failed: {}", error);
        self.stats.lock().errors += 1;
        // The window manager is left untouched so confirmed text stays
        // readable from the Error state.
        let _ = self.state.transition(SessionState::Error {
            message: error.to_string(),
        });
    }

    async fn sleep(&self, consecutive_silent: u32) {
        let delay = self.manager.lock().adaptive_delay(consecutive_silent);
        tokio::time::sleep(delay).await;
    }
}

async fn run_decode(
    engine: &Arc<Mutex<SttEngine>>,
    samples: Vec<f32>,
    sample_rate_hz: u32,
) -> Result<Vec<Segment>, SessionError> {
    let engine = Arc::clone(engine);
    let result = tokio::task::spawn_blocking(move || {
        engine.lock().transcribe_slice(&samples, sample_rate_hz)
    })
    .await;

    match result {
        Ok(Ok(segments)) => Ok(segments),
        Ok(Err(e)) => Err(SessionError::EngineTranscribeFailed(e)),
        Err(join_err) => Err(SessionError::EngineTranscribeFailed(
            EngineError::TaskAborted(join_err.to_string()),
        )),
    }
}

fn publish(
    tx: &Arc<watch::Sender<TranscriptSnapshot>>,
    manager: &Arc<Mutex<ChunkWindowManager>>,
) {
    let snapshot = {
        let manager = manager.lock();
        TranscriptSnapshot {
            confirmed_text: manager.confirmed_text().to_string(),
            hypothesis_text: manager.hypothesis_text().to_string(),
        }
    };
    tx.send_replace(snapshot);
}
