//! One frame of the orb render loop.
//!
//! The host calls [`RenderLoop::frame`] from its own frame-scheduling primitive. The
//! loop picks a signal source, re-runs the distortion over the whole buffer, advances
//! the rotation and hands the result to a [`Renderer`].

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::controller::AnimationState;
use super::distortion::{distort, Amplitudes, DistortionInput};
use super::geometry::{OrbGeometry, Vec3};
use super::material::{Material, Rgb};

/// Draw target for the orb. Implemented by the host (WebGL, terminal, test recorder).
pub trait Renderer {
    fn draw(&mut self, frame: &OrbFrame<'_>);
}

/// Live frequency data, e.g. a microphone analyser. `None` when nothing is available.
pub trait FrequencySource {
    fn frequency_data(&mut self) -> Option<&[u8]>;
}

/// Everything a renderer needs for one draw call.
#[derive(Debug)]
pub struct OrbFrame<'a> {
    pub positions: &'a [Vec3],
    pub colors: &'a [Rgb],
    pub material: Material,
    pub rotation: Rotation,
    /// True when the position buffer changed since the last upload.
    pub needs_upload: bool,
    pub source: SignalSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation {
    pub x: f32,
    pub y: f32,
}

/// Which external signal drove a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalSource {
    Speech,
    Microphone,
    Idle,
}

/// Speech wins over the microphone, the microphone over pure idle motion.
pub fn select_signal_source(speaking: bool, microphone_available: bool) -> SignalSource {
    if speaking {
        SignalSource::Speech
    } else if microphone_available {
        SignalSource::Microphone
    } else {
        SignalSource::Idle
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_idle_amplitudes")]
    pub idle: Amplitudes,
    #[serde(default = "default_speaking_amplitudes")]
    pub speaking: Amplitudes,
    /// Rotation added per frame, radians.
    #[serde(default = "default_rotation_step")]
    pub rotation_step: Rotation,
    #[serde(default = "default_envelope_center")]
    pub envelope_center: f32,
    #[serde(default = "default_envelope_amplitude")]
    pub envelope_amplitude: f32,
    /// Phase advance per vertex index.
    #[serde(default = "default_envelope_frequency")]
    pub envelope_frequency: f32,
    /// Envelope time runs this many times faster than wall time.
    #[serde(default = "default_envelope_speed")]
    pub envelope_speed: f32,
}

fn default_idle_amplitudes() -> Amplitudes {
    Amplitudes::new(0.9, 2.5)
}

fn default_speaking_amplitudes() -> Amplitudes {
    Amplitudes::new(1.5, 3.0)
}

fn default_rotation_step() -> Rotation {
    Rotation { x: 0.0008, y: 0.0015 }
}

fn default_envelope_center() -> f32 {
    128.0
}

fn default_envelope_amplitude() -> f32 {
    80.0
}

fn default_envelope_frequency() -> f32 {
    0.15
}

fn default_envelope_speed() -> f32 {
    4.0
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            idle: default_idle_amplitudes(),
            speaking: default_speaking_amplitudes(),
            rotation_step: default_rotation_step(),
            envelope_center: default_envelope_center(),
            envelope_amplitude: default_envelope_amplitude(),
            envelope_frequency: default_envelope_frequency(),
            envelope_speed: default_envelope_speed(),
        }
    }
}

/// Fills `out` with the synthetic speech envelope: one byte per vertex.
pub fn speech_envelope(config: &RenderConfig, time: f32, len: usize, out: &mut Vec<u8>) {
    let t = time * config.envelope_speed;
    out.clear();
    out.extend((0..len).map(|i| {
        let v = config.envelope_center
            + (t + i as f32 * config.envelope_frequency).sin() * config.envelope_amplitude;
        v.clamp(0.0, 255.0) as u8
    }));
}

/// Per-frame inputs sampled by the host.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext {
    /// Seconds since the loop started.
    pub time: f32,
    pub animation: AnimationState,
    pub material: Material,
    pub speaking: bool,
}

pub struct RenderLoop {
    geometry: OrbGeometry,
    config: RenderConfig,
    rotation: Rotation,
    envelope: Vec<u8>,
    frames: u64,
}

impl RenderLoop {
    pub fn new(geometry: OrbGeometry, config: RenderConfig) -> Self {
        Self {
            geometry,
            config,
            rotation: Rotation::default(),
            envelope: Vec::new(),
            frames: 0,
        }
    }

    pub fn geometry(&self) -> &OrbGeometry {
        &self.geometry
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    /// Runs one frame and submits it. Returns the signal source that was used.
    pub fn frame<R: Rng>(
        &mut self,
        ctx: &FrameContext,
        microphone: Option<&mut dyn FrequencySource>,
        renderer: &mut dyn Renderer,
        rng: &mut R,
    ) -> SignalSource {
        let mic_data = if ctx.speaking {
            None
        } else {
            microphone.and_then(|m| m.frequency_data())
        };
        let source = select_signal_source(ctx.speaking, mic_data.is_some());

        let (amplitudes, signal): (Amplitudes, Option<&[u8]>) = match source {
            SignalSource::Speech => {
                speech_envelope(
                    &self.config,
                    ctx.time,
                    self.geometry.vertex_count(),
                    &mut self.envelope,
                );
                (self.config.speaking, Some(self.envelope.as_slice()))
            }
            SignalSource::Microphone => (self.config.idle, mic_data),
            SignalSource::Idle => (self.config.idle, None),
        };

        let input = DistortionInput {
            time: ctx.time,
            intensity: ctx.animation.intensity,
            amplitudes,
            signal,
        };
        distort(&mut self.geometry, &input, rng);

        self.rotation.x += self.config.rotation_step.x;
        self.rotation.y += self.config.rotation_step.y;
        self.frames += 1;

        let frame = OrbFrame {
            positions: self.geometry.positions(),
            colors: self.geometry.colors(),
            material: ctx.material,
            rotation: self.rotation,
            needs_upload: self.geometry.needs_update(),
            source,
        };
        renderer.draw(&frame);
        self.geometry.clear_dirty();

        trace!(frame = self.frames, ?source, "orb frame submitted");
        source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orb::distortion::{displace_vertex, jitter_bound};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[derive(Default)]
    struct Recorder {
        draws: usize,
        uploads: usize,
        last_rotation: Rotation,
    }

    impl Renderer for Recorder {
        fn draw(&mut self, frame: &OrbFrame<'_>) {
            self.draws += 1;
            if frame.needs_upload {
                self.uploads += 1;
            }
            self.last_rotation = frame.rotation;
        }
    }

    struct FixedMic(Vec<u8>);

    impl FrequencySource for FixedMic {
        fn frequency_data(&mut self) -> Option<&[u8]> {
            Some(&self.0)
        }
    }

    fn ctx(speaking: bool) -> FrameContext {
        FrameContext {
            time: 0.5,
            animation: AnimationState { intensity: 0.0, is_error: false },
            material: Material::idle(),
            speaking,
        }
    }

    #[test]
    fn source_priority() {
        assert_eq!(select_signal_source(true, true), SignalSource::Speech);
        assert_eq!(select_signal_source(false, true), SignalSource::Microphone);
        assert_eq!(select_signal_source(false, false), SignalSource::Idle);
    }

    #[test]
    fn envelope_matches_vertex_count() {
        let mut out = Vec::new();
        speech_envelope(&RenderConfig::default(), 0.0, 10, &mut out);
        assert_eq!(out.len(), 10);
        assert_eq!(out[0], 128);
        assert!(out.iter().all(|&v| (48..=208).contains(&v)));
    }

    #[test]
    fn every_frame_uploads_and_rotates() {
        let mut rl = RenderLoop::new(OrbGeometry::sphere(4.0, 8, 8), RenderConfig::default());
        let mut rec = Recorder::default();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..3 {
            assert_eq!(rl.frame(&ctx(false), None, &mut rec, &mut rng), SignalSource::Idle);
        }
        assert_eq!(rec.draws, 3);
        assert_eq!(rec.uploads, 3);
        assert!((rec.last_rotation.y - 0.0045).abs() < 1e-6);
        assert!((rec.last_rotation.x - 0.0024).abs() < 1e-6);
        assert!(!rl.geometry().needs_update());
    }

    #[test]
    fn speaking_ignores_microphone() {
        let mut rl = RenderLoop::new(OrbGeometry::sphere(4.0, 8, 8), RenderConfig::default());
        let mut rec = Recorder::default();
        let mut rng = StdRng::seed_from_u64(2);
        let mut mic = FixedMic(vec![200; 16]);
        assert_eq!(
            rl.frame(&ctx(true), Some(&mut mic), &mut rec, &mut rng),
            SignalSource::Speech
        );
        assert_eq!(
            rl.frame(&ctx(false), Some(&mut mic), &mut rec, &mut rng),
            SignalSource::Microphone
        );
    }

    #[test]
    fn speaking_frame_uses_envelope_and_speaking_amplitudes() {
        let config = RenderConfig::default();
        let mut rl = RenderLoop::new(OrbGeometry::sphere(4.0, 8, 8), config);
        let mut rec = Recorder::default();
        let mut rng = StdRng::seed_from_u64(5);
        rl.frame(&ctx(true), None, &mut rec, &mut rng);

        let n = rl.geometry().vertex_count();
        let mut envelope = Vec::new();
        speech_envelope(&config, 0.5, n, &mut envelope);
        let speaking = DistortionInput {
            time: 0.5,
            intensity: 0.0,
            amplitudes: config.speaking,
            signal: Some(&envelope),
        };
        let idle = DistortionInput {
            amplitudes: config.idle,
            signal: None,
            ..speaking
        };
        let bound = jitter_bound(config.speaking.base) + 1e-4;

        let mut departs_from_idle = false;
        let geometry = rl.geometry();
        for (i, (&p, &b)) in geometry.positions().iter().zip(geometry.base_positions()).enumerate() {
            let expected = displace_vertex(b, i, &speaking);
            assert!(p.sub(expected).length() <= bound, "vertex {i} off the speech envelope");
            if p.sub(displace_vertex(b, i, &idle)).length() > bound {
                departs_from_idle = true;
            }
        }
        assert!(departs_from_idle);
    }

    #[test]
    fn microphone_pushes_every_vertex_outward() {
        let config = RenderConfig::default();
        let mut with_mic = RenderLoop::new(OrbGeometry::sphere(4.0, 8, 8), config);
        let mut without = RenderLoop::new(OrbGeometry::sphere(4.0, 8, 8), config);
        let mut rec = Recorder::default();
        let mut mic = FixedMic(vec![255; 4]);

        let used = with_mic.frame(&ctx(false), Some(&mut mic), &mut rec, &mut StdRng::seed_from_u64(9));
        assert_eq!(used, SignalSource::Microphone);
        let used = without.frame(&ctx(false), None, &mut rec, &mut StdRng::seed_from_u64(9));
        assert_eq!(used, SignalSource::Idle);

        let expected = 255.0 / 256.0 * config.idle.base * 0.4;
        for (i, (a, b)) in with_mic
            .geometry()
            .positions()
            .iter()
            .zip(without.geometry().positions())
            .enumerate()
        {
            let offset = a.sub(*b).length();
            assert!((offset - expected).abs() < 1e-3, "vertex {i}: {offset} vs {expected}");
        }
    }
}
