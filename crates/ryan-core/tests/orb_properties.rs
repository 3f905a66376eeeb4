//! Orb engine properties: amplitude response, decay termination and frame flow.
//!
//! Run with: `cargo test -p ryan-core --test orb_properties`

use rand::rngs::StdRng;
use rand::SeedableRng;
use ryan_core::orb::{
    displace_vertex, jitter_bound, Amplitudes, DistortionInput, FrameContext, OrbFrame, RenderConfig,
    Renderer, SignalSource,
};
use ryan_core::{AnimationController, DecayConfig, DecayOutcome, Material, OrbGeometry, RenderLoop};

fn mean_displacement(geometry: &OrbGeometry, intensity: f32, time: f32) -> f32 {
    let input = DistortionInput {
        time,
        intensity,
        amplitudes: Amplitudes::new(0.9, 2.5),
        signal: None,
    };
    let total: f32 = geometry
        .base_positions()
        .iter()
        .enumerate()
        .map(|(i, &b)| displace_vertex(b, i, &input).sub(b).length())
        .sum();
    total / geometry.vertex_count() as f32
}

#[test]
fn displacement_grows_with_intensity() {
    let geometry = OrbGeometry::sphere(4.0, 32, 32);
    for &t in &[0.0_f32, 0.7, 3.2, 11.5] {
        let low = mean_displacement(&geometry, 0.0, t);
        let mid = mean_displacement(&geometry, 0.5, t);
        let high = mean_displacement(&geometry, 1.0, t);
        assert!(low < mid && mid < high, "t={t}: {low} {mid} {high}");
    }
}

#[test]
fn jitter_scales_with_amplitude() {
    let idle = Amplitudes::new(0.9, 2.5);
    assert!(jitter_bound(idle.at(0.0)) < jitter_bound(idle.at(1.0)));
    assert!((jitter_bound(2.5) - 0.125).abs() < 1e-6);
}

#[test]
fn error_trigger_decays_to_exact_rest() {
    let mut controller = AnimationController::new(DecayConfig::default());
    controller.trigger(true);
    assert_eq!(controller.material(), Material::peak(true));

    let mut ticks = 0;
    loop {
        ticks += 1;
        match controller.decay() {
            DecayOutcome::Continue => assert!(controller.intensity() > 0.0),
            DecayOutcome::Finished => break,
            DecayOutcome::Idle | DecayOutcome::Superseded => panic!("ticker stopped early"),
        }
        assert!(ticks <= 25, "decay never finished");
    }

    assert_eq!(controller.intensity(), 0.0);
    assert!(!controller.is_error());
    assert!(!controller.is_ticking());
    assert_eq!(controller.material(), Material::idle());
    assert_eq!(controller.decay(), DecayOutcome::Idle);
}

#[test]
fn retrigger_restarts_from_full_intensity() {
    let mut controller = AnimationController::default();
    controller.trigger(false);
    for _ in 0..10 {
        controller.decay();
    }
    assert!(controller.intensity() < 0.6);
    controller.trigger(true);
    assert_eq!(controller.intensity(), 1.0);
    assert!(controller.is_error());
}

struct Counter(Vec<SignalSource>);

impl Renderer for Counter {
    fn draw(&mut self, frame: &OrbFrame<'_>) {
        assert!(frame.needs_upload);
        assert_eq!(frame.positions.len(), frame.colors.len());
        self.0.push(frame.source);
    }
}

#[test]
fn controller_drives_render_loop() {
    let mut controller = AnimationController::default();
    let mut render = RenderLoop::new(OrbGeometry::sphere(4.0, 12, 12), RenderConfig::default());
    let mut renderer = Counter(Vec::new());
    let mut rng = StdRng::seed_from_u64(42);

    controller.trigger(false);
    for frame in 0..5 {
        let ctx = FrameContext {
            time: frame as f32 / 60.0,
            animation: controller.state(),
            material: controller.material(),
            speaking: frame >= 3,
        };
        render.frame(&ctx, None, &mut renderer, &mut rng);
        controller.decay();
    }

    assert_eq!(render.frames_rendered(), 5);
    assert_eq!(
        renderer.0,
        vec![
            SignalSource::Idle,
            SignalSource::Idle,
            SignalSource::Idle,
            SignalSource::Speech,
            SignalSource::Speech
        ]
    );
}
