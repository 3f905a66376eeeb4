//! # Ryan Core
//!
//! Host-independent state for the Ryan chat client: the orb animation engine,
//! the log pager, the creative output store, the memory board and the chat reply
//! projection. Every component is a plain owned value; hosts (`ryan-client`, the
//! terminal add-on) own the instances and drive them from their event loops.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                      ryan-core                            │
//! │  ┌────────────┐   ┌──────────────┐   ┌───────────────┐    │
//! │  │  protocol  │ → │     chat     │ → │   creative    │    │
//! │  │ (wire DTO) │   │ (projection) │   │ (outputs +    │    │
//! │  └────────────┘   └──────────────┘   │  selection)   │    │
//! │        ↓                 ↓           └───────────────┘    │
//! │  ┌────────────┐   ┌──────────────┐   ┌───────────────┐    │
//! │  │    logs    │   │  orb engine  │   │    memory     │    │
//! │  │  (pager)   │   │ decay/distort│   │   (board)     │    │
//! │  └────────────┘   └──────────────┘   └───────────────┘    │
//! └───────────────────────────────────────────────────────────┘
//! ```

pub mod chat;
pub mod config;
pub mod creative;
pub mod logs;
pub mod memory;
pub mod orb;
pub mod protocol;

pub use chat::{project_response, render_text, Bubble, BubbleContent, BubbleStyle, Reply, Sender};
pub use config::{ClientConfig, ConfigError, OrbConfig};
pub use creative::{CreativeKind, CreativeOutput, CreativeStore, Dropdown, OutputView};
pub use logs::{LogEntry, LogLine, LogPager, LogRequest, LogRow, PageOutcome, PagerState, Placement, Severity};
pub use memory::{MemoryBoard, MemoryCommand, MemoryNotice, MemoryView};
pub use orb::{AnimationController, AnimationState, DecayConfig, DecayOutcome, Material, OrbGeometry, RenderLoop};
pub use protocol::{ChatRequest, ChatResponse, ContentMessage, Failure, LogsResponse, MemoryItem, UploadRequest};
