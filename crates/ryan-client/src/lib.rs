//! # Ryan Client
//!
//! Async host for `ryan-core`: the HTTP backend, the orb's decay ticker and frame
//! driver, speech gating, and the chat/logs/memory sessions a UI binds to.

pub mod backend;
pub mod error;
pub mod orb;
pub mod session;
pub mod speech;

pub use backend::{Backend, HttpBackend};
pub use error::{ClientError, ClientResult};
pub use orb::{shared, DecayTicker, FrameSource, IntervalFrames, OrbDriver, OrbSignal, SharedController};
pub use session::{ChatSession, LogsSection, MemorySection};
pub use speech::{SimulatedSpeaker, Speaker, SpeechOutput};
