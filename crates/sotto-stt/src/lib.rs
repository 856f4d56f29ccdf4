//! Incremental chunked transcription core.
//!
//! Turns a continuously growing capture buffer plus a sequence of
//! overlapping decode results into a single, monotonically growing
//! transcript. The ASR engine itself is an opaque collaborator behind
//! [`engine::SttEngine`]; audio device I/O, model loading, and UI all live
//! outside this crate.

pub mod chunk;
pub mod engine;
pub mod mock;
pub mod session;
pub mod text;
pub mod types;

pub use chunk::{ChunkWindowConfig, ChunkWindowManager};
pub use engine::{BatchEngine, SttEngine, StreamingEngine};
pub use session::{SessionConfig, SessionController, SessionStats};
pub use types::{Segment, SliceRequest, TranscriptSnapshot};
