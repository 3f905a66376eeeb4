//! Sphere geometry buffer for the orb.
//!
//! Base positions are captured once when the mesh is built and never touched again.
//! The displayed buffer is overwritten in full on every frame by the distortion pass.

use super::material::Rgb;

/// Default orb radius in world units.
pub const ORB_RADIUS: f32 = 4.0;

/// Default segment count along both sphere axes.
pub const ORB_SEGMENTS: u32 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Unit vector in the same direction, or zero for a degenerate input.
    pub fn normalize(self) -> Vec3 {
        let len = self.length();
        if len <= f32::EPSILON {
            return Vec3::ZERO;
        }
        self.scale(1.0 / len)
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn scale(self, s: f32) -> Vec3 {
        Vec3::new(self.x * s, self.y * s, self.z * s)
    }

    pub fn add(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn sub(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

/// Vertex buffer of a UV sphere: immutable base positions plus the displayed copy.
#[derive(Debug, Clone)]
pub struct OrbGeometry {
    radius: f32,
    base: Vec<Vec3>,
    positions: Vec<Vec3>,
    colors: Vec<Rgb>,
    needs_update: bool,
}

impl OrbGeometry {
    /// Builds a sphere with `width_segments + 1` by `height_segments + 1` vertices,
    /// laid out row by row from the north pole (three.js `SphereGeometry` order).
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);
        let mut base =
            Vec::with_capacity(((width_segments + 1) * (height_segments + 1)) as usize);

        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let phi = u * std::f32::consts::TAU;
                let theta = v * std::f32::consts::PI;
                base.push(Vec3::new(
                    -radius * phi.cos() * theta.sin(),
                    radius * theta.cos(),
                    radius * phi.sin() * theta.sin(),
                ));
            }
        }

        let colors = base
            .iter()
            .map(|p| {
                // Vertical gradient: darker blue at the south pole.
                let shade = (0.5 + 0.5 * (p.y / radius)).clamp(0.0, 1.0);
                Rgb::new(0.0, 0.0, shade)
            })
            .collect();

        Self {
            radius,
            positions: base.clone(),
            base,
            colors,
            needs_update: false,
        }
    }

    /// The default orb mesh (radius 4, 128 x 128 segments).
    pub fn orb() -> Self {
        Self::sphere(ORB_RADIUS, ORB_SEGMENTS, ORB_SEGMENTS)
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn vertex_count(&self) -> usize {
        self.base.len()
    }

    pub fn base_positions(&self) -> &[Vec3] {
        &self.base
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    /// Split borrow used by the distortion pass: read-only base, writable display buffer.
    pub(crate) fn buffers_mut(&mut self) -> (&[Vec3], &mut [Vec3]) {
        (&self.base, &mut self.positions)
    }

    /// Flags the displayed buffer for upload on the next draw.
    pub fn mark_dirty(&mut self) {
        self.needs_update = true;
    }

    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Called by renderers once the buffer has been uploaded.
    pub fn clear_dirty(&mut self) {
        self.needs_update = false;
    }
}
