//! Scripted mock engines for testing the pipeline

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::{BatchEngine, StreamingEngine};
use crate::types::Segment;
use sotto_foundation::EngineError;

/// Configuration for the scripted batch engine
#[derive(Debug, Clone, Default)]
pub struct ScriptedConfig {
    /// Segment lists returned per call, in order. Once exhausted, calls
    /// return an empty result.
    pub script: Vec<Vec<Segment>>,

    /// Simulated decode time per call.
    pub processing_delay: Duration,

    /// Fail every call from the Nth onward (1-based).
    pub fail_from_call: Option<usize>,

    /// Report not-ready from `is_ready`.
    pub not_ready: bool,
}

#[derive(Debug, Default)]
struct ScriptedState {
    pending: VecDeque<Vec<Segment>>,
    calls_made: usize,
    /// Sample counts of every slice received, for assertions.
    slice_lens: Vec<usize>,
}

/// Scripted batch engine: returns pre-baked segment lists call by call and
/// records what it was handed.
#[derive(Debug, Clone)]
pub struct ScriptedBatchEngine {
    config: ScriptedConfig,
    state: Arc<Mutex<ScriptedState>>,
}

impl ScriptedBatchEngine {
    pub fn new(config: ScriptedConfig) -> Self {
        let pending = config.script.iter().cloned().collect();
        Self {
            config,
            state: Arc::new(Mutex::new(ScriptedState {
                pending,
                ..Default::default()
            })),
        }
    }

    /// One segment list per call, each spanning the given duration.
    pub fn with_script(script: Vec<Vec<Segment>>) -> Self {
        Self::new(ScriptedConfig {
            script,
            ..Default::default()
        })
    }

    pub fn failing_from_call(n: usize) -> Self {
        Self::new(ScriptedConfig {
            fail_from_call: Some(n),
            ..Default::default()
        })
    }

    pub fn not_ready() -> Self {
        Self::new(ScriptedConfig {
            not_ready: true,
            ..Default::default()
        })
    }

    pub fn calls_made(&self) -> usize {
        self.state.lock().calls_made
    }

    pub fn slice_lens(&self) -> Vec<usize> {
        self.state.lock().slice_lens.clone()
    }
}

impl BatchEngine for ScriptedBatchEngine {
    fn is_ready(&self) -> bool {
        !self.config.not_ready
    }

    fn transcribe(
        &mut self,
        samples: &[f32],
        _sample_rate_hz: u32,
    ) -> Result<Vec<Segment>, EngineError> {
        // Record the call before the simulated delay so tests can observe
        // an in-flight decode.
        let next = {
            let mut state = self.state.lock();
            state.calls_made += 1;
            state.slice_lens.push(samples.len());

            if let Some(n) = self.config.fail_from_call {
                if state.calls_made >= n {
                    return Err(EngineError::Transcribe("scripted failure".into()));
                }
            }
            state.pending.pop_front()
        };

        if !self.config.processing_delay.is_zero() {
            std::thread::sleep(self.config.processing_delay);
        }

        Ok(next.unwrap_or_default())
    }
}

/// Minimal streaming mock: echoes back a fixed hypothesis for everything
/// fed since the last reset, reporting an endpoint after a configurable
/// amount of audio.
pub struct ScriptedStreamingEngine {
    hypothesis: Vec<Segment>,
    fed_samples: usize,
    endpoint_after_samples: usize,
    resets: Arc<std::sync::atomic::AtomicUsize>,
}

impl ScriptedStreamingEngine {
    pub fn new(hypothesis: Vec<Segment>, endpoint_after_samples: usize) -> Self {
        Self {
            hypothesis,
            fed_samples: 0,
            endpoint_after_samples,
            resets: Arc::new(std::sync::atomic::AtomicUsize::new(0)),
        }
    }

    /// Counter handle that stays observable after the engine is boxed.
    pub fn reset_counter(&self) -> Arc<std::sync::atomic::AtomicUsize> {
        Arc::clone(&self.resets)
    }
}

impl StreamingEngine for ScriptedStreamingEngine {
    fn is_ready(&self) -> bool {
        true
    }

    fn feed(&mut self, samples: &[f32], _sample_rate_hz: u32) -> Result<(), EngineError> {
        self.fed_samples += samples.len();
        Ok(())
    }

    fn poll(&mut self) -> Result<Vec<Segment>, EngineError> {
        if self.fed_samples == 0 {
            Ok(Vec::new())
        } else {
            Ok(self.hypothesis.clone())
        }
    }

    fn endpoint_reached(&self) -> bool {
        self.fed_samples >= self.endpoint_after_samples
    }

    fn reset(&mut self) {
        self.fed_samples = 0;
        self.resets
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}
