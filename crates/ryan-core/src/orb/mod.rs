//! The orb: a particle sphere whose surface ripples with assistant activity.
//!
//! ```text
//!  response ──► AnimationController ──(intensity, material)──┐
//!                 ▲ decay tick (host scheduler)               ▼
//!  speech / mic ─────────────────────────────────────► RenderLoop::frame
//!                                                      │  distort(base → display)
//!                                                      ▼
//!                                                   Renderer
//! ```

pub mod controller;
pub mod distortion;
pub mod geometry;
pub mod material;
pub mod render;

pub use controller::{AnimationController, AnimationState, DecayConfig, DecayOutcome};
pub use distortion::{
    displace_vertex, distort, distorted_positions, jitter_bound, Amplitudes, DistortionInput,
};
pub use geometry::{OrbGeometry, Vec3, ORB_RADIUS, ORB_SEGMENTS};
pub use material::{Material, Rgb};
pub use render::{
    select_signal_source, speech_envelope, FrameContext, FrequencySource, OrbFrame, RenderConfig,
    RenderLoop, Renderer, Rotation, SignalSource,
};
