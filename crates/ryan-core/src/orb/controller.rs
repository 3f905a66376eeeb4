//! Animation intensity controller.
//!
//! A decaying scalar driven by response triggers. The controller itself is a plain
//! state machine; the periodic tick that calls [`AnimationController::decay`] is owned
//! by the host scheduler, which must cancel any pending tick before honouring a new
//! trigger (see `ryan_client::DecayTicker`).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::material::Material;

/// Tuning for the decay sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecayConfig {
    /// Intensity removed per tick.
    #[serde(default = "default_decay_step")]
    pub step: f32,
    /// Tick period in milliseconds.
    #[serde(default = "default_decay_period_ms")]
    pub period_ms: u64,
}

fn default_decay_step() -> f32 {
    0.05
}

fn default_decay_period_ms() -> u64 {
    50
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            step: default_decay_step(),
            period_ms: default_decay_period_ms(),
        }
    }
}

/// Smallest step honoured by [`AnimationController::decay`].
pub const MIN_DECAY_STEP: f32 = 0.001;

impl DecayConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms.max(1))
    }

    /// A step must lie in `(0, 1]`, otherwise the sequence never reaches rest.
    pub fn validate(&self) -> Result<(), String> {
        if self.step > 0.0 && self.step <= 1.0 {
            Ok(())
        } else {
            Err(format!("orb.decay.step must be in (0, 1], got {}", self.step))
        }
    }

    /// Step actually applied per tick, clamped into `[MIN_DECAY_STEP, 1]`.
    pub fn effective_step(&self) -> f32 {
        if self.step.is_nan() {
            return default_decay_step();
        }
        self.step.clamp(MIN_DECAY_STEP, 1.0)
    }
}

/// Snapshot of the animation state read by the render loop each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationState {
    pub intensity: f32,
    pub is_error: bool,
}

/// What a single decay tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecayOutcome {
    /// Intensity dropped and the tick should fire again.
    Continue,
    /// Intensity reached zero on this tick; the tick must stop.
    Finished,
    /// Nothing to do: no decay sequence is running.
    Idle,
    /// The tick belongs to a sequence replaced by a later trigger.
    Superseded,
}

#[derive(Debug, Clone)]
pub struct AnimationController {
    config: DecayConfig,
    intensity: f32,
    is_error: bool,
    ticking: bool,
    sequence: u64,
    material: Material,
}

impl AnimationController {
    pub fn new(config: DecayConfig) -> Self {
        Self {
            config,
            intensity: 0.0,
            is_error: false,
            ticking: false,
            sequence: 0,
            material: Material::idle(),
        }
    }

    pub fn config(&self) -> &DecayConfig {
        &self.config
    }

    /// Jump to full intensity and (re)arm the decay sequence.
    pub fn trigger(&mut self, is_error: bool) {
        info!("Triggering orb animation. is_error: {}", is_error);
        self.intensity = 1.0;
        self.is_error = is_error;
        self.ticking = true;
        self.sequence = self.sequence.wrapping_add(1);
        self.material = Material::peak(is_error);
    }

    /// Identifies the decay sequence started by the latest trigger.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Decay tick issued on behalf of `sequence`. Ticks from an older sequence are ignored.
    pub fn decay_for(&mut self, sequence: u64) -> DecayOutcome {
        if sequence != self.sequence {
            debug!("Ignoring decay tick from superseded sequence {}", sequence);
            return DecayOutcome::Superseded;
        }
        self.decay()
    }

    /// One decay tick. Calling this while no sequence is running is a no-op.
    pub fn decay(&mut self) -> DecayOutcome {
        if !self.ticking {
            return DecayOutcome::Idle;
        }

        self.intensity = (self.intensity - self.config.effective_step()).max(0.0);
        if self.intensity <= 0.0 {
            self.intensity = 0.0;
            self.is_error = false;
            self.ticking = false;
            self.material = Material::idle();
            debug!("Orb animation finished. State reset.");
            return DecayOutcome::Finished;
        }

        self.material = if self.is_error {
            Material::blended(true, self.intensity)
        } else {
            // Success keeps the idle point size; only the colour fades.
            Material {
                size: Material::idle().size,
                ..Material::blended(false, self.intensity)
            }
        };
        DecayOutcome::Continue
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn is_error(&self) -> bool {
        self.is_error
    }

    /// True while a decay sequence is armed.
    pub fn is_ticking(&self) -> bool {
        self.ticking
    }

    pub fn material(&self) -> Material {
        self.material
    }

    pub fn state(&self) -> AnimationState {
        AnimationState {
            intensity: self.intensity,
            is_error: self.is_error,
        }
    }
}

impl Default for AnimationController {
    fn default() -> Self {
        Self::new(DecayConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_trigger_decays_to_exact_zero() {
        let mut c = AnimationController::default();
        c.trigger(true);
        assert_eq!(c.intensity(), 1.0);
        assert!(c.is_error());
        assert_eq!(c.material(), Material::peak(true));

        let mut ticks = 0;
        while c.decay() == DecayOutcome::Continue {
            ticks += 1;
            assert!(ticks < 100, "decay never finished");
        }
        assert_eq!(c.intensity(), 0.0);
        assert!(!c.is_error());
        assert!(!c.is_ticking());
        assert_eq!(c.material(), Material::idle());
        // No further ticks are honoured until the next trigger.
        assert_eq!(c.decay(), DecayOutcome::Idle);
    }

    #[test]
    fn retrigger_restarts_from_full() {
        let mut c = AnimationController::default();
        c.trigger(false);
        for _ in 0..5 {
            c.decay();
        }
        assert!(c.intensity() < 1.0);
        c.trigger(true);
        assert_eq!(c.intensity(), 1.0);
        assert!(c.is_error());
    }

    #[test]
    fn non_positive_step_still_reaches_rest() {
        for step in [0.0, -0.5, f32::NAN] {
            let mut c = AnimationController::new(DecayConfig { step, period_ms: 50 });
            c.trigger(true);
            let mut ticks = 0;
            while c.decay() == DecayOutcome::Continue {
                ticks += 1;
                assert!(ticks < 2_000, "decay never reached rest with step {step}");
            }
            assert_eq!(c.intensity(), 0.0);
            assert!(!c.is_ticking());
        }
    }

    #[test]
    fn step_validation() {
        assert!(DecayConfig::default().validate().is_ok());
        assert!(DecayConfig { step: 1.0, period_ms: 50 }.validate().is_ok());
        assert!(DecayConfig { step: 0.0, period_ms: 50 }.validate().is_err());
        assert!(DecayConfig { step: 1.5, period_ms: 50 }.validate().is_err());
        assert!(DecayConfig { step: f32::NAN, period_ms: 50 }.validate().is_err());
    }

    #[test]
    fn stale_sequence_tick_is_ignored() {
        let mut c = AnimationController::default();
        c.trigger(false);
        let first = c.sequence();
        c.trigger(true);
        assert_eq!(c.decay_for(first), DecayOutcome::Superseded);
        assert_eq!(c.intensity(), 1.0);
        assert_eq!(c.decay_for(c.sequence()), DecayOutcome::Continue);
        assert!(c.intensity() < 1.0);
    }

    #[test]
    fn success_fade_keeps_point_size() {
        let mut c = AnimationController::default();
        c.trigger(false);
        c.decay();
        assert_eq!(c.material().size, Material::idle().size);
        assert_ne!(c.material().color, Material::idle().color);
    }
}
