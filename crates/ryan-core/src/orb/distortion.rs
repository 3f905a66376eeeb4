//! Wave distortion of the orb surface.
//!
//! Each vertex is pushed along its own outward normal by a weighted sum of sine and
//! cosine terms whose phases depend on the vertex's base position, so neighbouring
//! points move together and the surface ripples instead of boiling. An optional
//! external signal (speech envelope or microphone spectrum) and a small random jitter
//! are added on top. Everything except the jitter is a pure function of the inputs.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geometry::{OrbGeometry, Vec3};

/// Idle and response amplitudes; the effective amplitude interpolates between them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Amplitudes {
    pub base: f32,
    pub response: f32,
}

impl Amplitudes {
    pub const fn new(base: f32, response: f32) -> Self {
        Self { base, response }
    }

    /// `base + intensity * (response - base)`.
    pub fn at(&self, intensity: f32) -> f32 {
        let i = intensity.clamp(0.0, 1.0);
        self.base + i * (self.response - self.base)
    }
}

const WAVE_SCALE: f32 = 0.8;
const SIGNAL_SCALE: f32 = 0.4;
const JITTER_SCALE: f32 = 0.1;

/// Inputs shared by every vertex in one distortion pass.
#[derive(Debug, Clone, Copy)]
pub struct DistortionInput<'a> {
    /// Seconds.
    pub time: f32,
    pub intensity: f32,
    pub amplitudes: Amplitudes,
    pub signal: Option<&'a [u8]>,
}

impl DistortionInput<'_> {
    pub fn amplitude(&self) -> f32 {
        self.amplitudes.at(self.intensity)
    }
}

/// Three-axis wave displacement for a base position, before radial projection.
pub fn wave_displacement(base: Vec3, time: f32, amplitude: f32) -> Vec3 {
    let (ox, oy, oz) = (base.x, base.y, base.z);
    let t = time;
    let scale = amplitude * WAVE_SCALE;

    let dx = ((t * 1.5 + ox * 1.0 + oy * 0.7).sin() * 0.7
        + (t * 1.0 + oy * 1.2 + oz * 0.9).sin() * 0.5
        + (t * 1.8 + ox * 0.5 + oz * 1.4).sin() * 0.4
        + (t * 0.9 + ox * 1.3 + oy * 0.6).sin() * 0.3)
        * scale;

    let dy = ((t * 1.8 + oy * 1.0 + oz * 0.8).cos() * 0.8
        + (t * 1.2 + ox * 1.1 + oz * 0.5).cos() * 0.6
        + (t * 1.0 + oy * 0.6 + ox * 1.4).cos() * 0.5
        + (t * 1.6 + oy * 1.4 + oz * 0.9).cos() * 0.4)
        * scale;

    let dz = ((t * 1.3 + oz * 1.1 + ox * 0.6).sin() * 0.9
        + (t * 1.6 + ox * 0.8 + oy * 1.3).sin() * 0.7
        + (t * 0.8 + oz * 1.5 + oy * 1.0).sin() * 0.5
        + (t * 1.1 + oz * 0.7 + ox * 1.2).sin() * 0.4)
        * scale;

    Vec3::new(dx, dy, dz)
}

/// Contribution of the external signal for vertex `index`.
pub fn signal_displacement(signal: Option<&[u8]>, index: usize, amplitude: f32) -> f32 {
    match signal {
        Some(data) if !data.is_empty() => {
            f32::from(data[index % data.len()]) / 256.0 * amplitude * SIGNAL_SCALE
        }
        _ => 0.0,
    }
}

/// Deterministic part of the displaced position: waves plus signal, projected radially.
pub fn displace_vertex(base: Vec3, index: usize, input: &DistortionInput<'_>) -> Vec3 {
    displace_with_jitter(base, index, input, 0.0)
}

fn displace_with_jitter(base: Vec3, index: usize, input: &DistortionInput<'_>, jitter: f32) -> Vec3 {
    let amplitude = input.amplitude();
    let normal = base.normalize();
    let wave = wave_displacement(base, input.time, amplitude);
    let radial = wave.dot(normal) + signal_displacement(input.signal, index, amplitude) + jitter;
    base.add(normal.scale(radial))
}

/// Jitter bound for an amplitude: samples lie in `[-bound, bound)`.
pub fn jitter_bound(amplitude: f32) -> f32 {
    0.5 * JITTER_SCALE * amplitude
}

/// Recomputes every displayed vertex from its base position.
pub fn distort<R: Rng>(geometry: &mut OrbGeometry, input: &DistortionInput<'_>, rng: &mut R) {
    let amplitude = input.amplitude();
    let (base, positions) = geometry.buffers_mut();
    for (index, (out, &b)) in positions.iter_mut().zip(base.iter()).enumerate() {
        let jitter = (rng.random::<f32>() - 0.5) * JITTER_SCALE * amplitude;
        *out = displace_with_jitter(b, index, input, jitter);
    }
    geometry.mark_dirty();
}

/// Same as [`distort`] but returns a fresh buffer instead of writing in place.
pub fn distorted_positions<R: Rng>(
    base: &[Vec3],
    input: &DistortionInput<'_>,
    rng: &mut R,
) -> Vec<Vec3> {
    let amplitude = input.amplitude();
    base.iter()
        .enumerate()
        .map(|(index, &b)| {
            let jitter = (rng.random::<f32>() - 0.5) * JITTER_SCALE * amplitude;
            displace_with_jitter(b, index, input, jitter)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn input(intensity: f32) -> DistortionInput<'static> {
        DistortionInput {
            time: 1.25,
            intensity,
            amplitudes: Amplitudes::new(0.9, 2.5),
            signal: None,
        }
    }

    #[test]
    fn amplitude_interpolates() {
        let a = Amplitudes::new(0.9, 2.5);
        assert!((a.at(0.0) - 0.9).abs() < 1e-6);
        assert!((a.at(1.0) - 2.5).abs() < 1e-6);
        assert!((a.at(0.5) - 1.7).abs() < 1e-6);
    }

    #[test]
    fn displacement_is_radial() {
        let base = Vec3::new(1.0, 2.0, 2.0);
        let out = displace_vertex(base, 0, &input(0.7));
        let delta = out.sub(base);
        let n = base.normalize();
        let along = delta.dot(n);
        let off_axis = delta.sub(n.scale(along)).length();
        assert!(off_axis < 1e-4, "off-axis component {}", off_axis);
    }

    #[test]
    fn signal_index_wraps() {
        let data = [0u8, 128, 255];
        let a = signal_displacement(Some(&data[..]), 4, 1.0);
        let b = signal_displacement(Some(&data[..]), 1, 1.0);
        assert_eq!(a, b);
        assert_eq!(signal_displacement(Some(&[][..]), 3, 1.0), 0.0);
    }

    #[test]
    fn jitter_stays_bounded() {
        let geometry = OrbGeometry::sphere(4.0, 16, 16);
        let mut rng = StdRng::seed_from_u64(7);
        let inp = input(1.0);
        let bound = jitter_bound(inp.amplitude());
        let out = distorted_positions(geometry.base_positions(), &inp, &mut rng);
        for (i, (&b, &o)) in geometry.base_positions().iter().zip(out.iter()).enumerate() {
            let exact = displace_vertex(b, i, &inp);
            assert!(o.sub(exact).length() <= bound + 1e-4);
        }
    }
}
