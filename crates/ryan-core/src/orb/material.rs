//! Point material colours and sizes for idle, success and error feedback.

use serde::{Deserialize, Serialize};

/// Linear RGB colour with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// `0xRRGGBB` -> colour.
    pub fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    pub fn to_hex(self) -> u32 {
        let c = |v: f32| ((v.clamp(0.0, 1.0) * 255.0).round() as u32) & 0xff;
        (c(self.r) << 16) | (c(self.g) << 8) | c(self.b)
    }

    /// Interpolates from `from` (t = 0) to `to` (t = 1).
    pub fn lerp(from: Rgb, to: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        Rgb {
            r: from.r + (to.r - from.r) * t,
            g: from.g + (to.g - from.g) * t,
            b: from.b + (to.b - from.b) * t,
        }
    }
}

pub const BASE_COLOR_HEX: u32 = 0x0077ff;
pub const SUCCESS_COLOR_HEX: u32 = 0x3399ff;
pub const ERROR_COLOR_HEX: u32 = 0xff0000;

pub const BASE_POINT_SIZE: f32 = 0.05;
pub const ERROR_POINT_SIZE: f32 = 0.1;

/// Colour and point size the renderer should use for the orb.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: Rgb,
    pub size: f32,
}

impl Material {
    pub fn idle() -> Self {
        Self {
            color: Rgb::from_hex(BASE_COLOR_HEX),
            size: BASE_POINT_SIZE,
        }
    }

    /// Peak look right after a response: red and enlarged on error, brighter blue otherwise.
    pub fn peak(is_error: bool) -> Self {
        if is_error {
            Self {
                color: Rgb::from_hex(ERROR_COLOR_HEX),
                size: ERROR_POINT_SIZE,
            }
        } else {
            Self {
                color: Rgb::from_hex(SUCCESS_COLOR_HEX),
                size: BASE_POINT_SIZE,
            }
        }
    }

    /// Blend between idle and the peak look by `intensity`.
    pub fn blended(is_error: bool, intensity: f32) -> Self {
        let idle = Self::idle();
        let peak = Self::peak(is_error);
        let t = intensity.clamp(0.0, 1.0);
        Self {
            color: Rgb::lerp(idle.color, peak.color, t),
            size: idle.size + (peak.size - idle.size) * t,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::idle()
    }
}
