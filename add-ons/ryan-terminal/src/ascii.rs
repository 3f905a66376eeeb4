//! ASCII point projector for the orb. Demonstration quality only.

use std::sync::{Arc, Mutex};

use ryan_core::orb::{OrbFrame, Renderer, Rotation, Vec3, ORB_RADIUS};

const SHADES: &[u8] = b".:-=+*#%@";

/// Orthographic projection of the point cloud onto a character grid, nearest point wins.
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    extent: f32,
    snapshot: Arc<Mutex<String>>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width: width.max(2),
            height: height.max(2),
            extent: ORB_RADIUS * 1.5,
            snapshot: Arc::new(Mutex::new(String::new())),
        }
    }

    /// Latest rendered frame; shared with the REPL while the driver owns the renderer.
    pub fn snapshot(&self) -> Arc<Mutex<String>> {
        Arc::clone(&self.snapshot)
    }

    fn rasterize(&self, positions: &[Vec3], rotation: Rotation) -> String {
        let mut depth = vec![f32::NEG_INFINITY; self.width * self.height];
        for &p in positions {
            let p = rotate(p, rotation);
            let col = ((p.x / self.extent + 1.0) * 0.5 * (self.width - 1) as f32).round();
            let row = ((1.0 - p.y / self.extent) * 0.5 * (self.height - 1) as f32).round();
            if col < 0.0 || row < 0.0 || col >= self.width as f32 || row >= self.height as f32 {
                continue;
            }
            let cell = row as usize * self.width + col as usize;
            if p.z > depth[cell] {
                depth[cell] = p.z;
            }
        }

        let mut out = String::with_capacity((self.width + 1) * self.height);
        for row in depth.chunks(self.width) {
            for &z in row {
                out.push(shade(z, self.extent));
            }
            out.push('\n');
        }
        out
    }
}

impl Renderer for AsciiRenderer {
    fn draw(&mut self, frame: &OrbFrame<'_>) {
        let mut text = format!(
            "orb #{:06x} size {:.2} {:?}\n",
            frame.material.color.to_hex(),
            frame.material.size,
            frame.source
        );
        text.push_str(&self.rasterize(frame.positions, frame.rotation));
        *self.snapshot.lock().unwrap_or_else(|e| e.into_inner()) = text;
    }
}

fn rotate(p: Vec3, r: Rotation) -> Vec3 {
    let (sx, cx) = r.x.sin_cos();
    let (sy, cy) = r.y.sin_cos();
    let y = p.y * cx - p.z * sx;
    let z = p.y * sx + p.z * cx;
    Vec3::new(p.x * cy + z * sy, y, -p.x * sy + z * cy)
}

fn shade(z: f32, extent: f32) -> char {
    if !z.is_finite() {
        return ' ';
    }
    let t = ((z / extent + 1.0) * 0.5).clamp(0.0, 1.0);
    let idx = (t * (SHADES.len() - 1) as f32).round() as usize;
    SHADES[idx] as char
}

#[cfg(test)]
mod tests {
    use super::*;
    use ryan_core::orb::{Material, OrbGeometry, SignalSource};

    fn frame<'a>(geometry: &'a OrbGeometry) -> OrbFrame<'a> {
        OrbFrame {
            positions: geometry.positions(),
            colors: geometry.colors(),
            material: Material::idle(),
            rotation: Rotation::default(),
            needs_upload: true,
            source: SignalSource::Idle,
        }
    }

    #[test]
    fn draws_header_and_grid() {
        let geometry = OrbGeometry::sphere(ORB_RADIUS, 16, 16);
        let mut renderer = AsciiRenderer::new(20, 10);
        let snapshot = renderer.snapshot();
        renderer.draw(&frame(&geometry));

        let text = snapshot.lock().unwrap().clone();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("orb #0077ff size 0.05 Idle"));
        let grid: Vec<&str> = lines.collect();
        assert_eq!(grid.len(), 10);
        assert!(grid.iter().all(|l| l.chars().count() == 20));
        assert!(grid.iter().any(|l| l.contains('%')));
    }

    #[test]
    fn empty_cells_are_blank() {
        let renderer = AsciiRenderer::new(5, 5);
        let text = renderer.rasterize(&[Vec3::ZERO], Rotation::default());
        assert_eq!(text.matches(|c: char| c != ' ' && c != '\n').count(), 1);
        assert_eq!(text.lines().nth(2).map(|l| l.chars().nth(2)), Some(Some('+')));
    }

    #[test]
    fn half_turn_flips_depth() {
        let p = rotate(Vec3::new(0.0, 0.0, 1.0), Rotation { x: 0.0, y: std::f32::consts::PI });
        assert!((p.z + 1.0).abs() < 1e-5);
    }
}
