//! Orb drivers: the decay ticker and the frame loop.
//!
//! Both run as tokio tasks and share one [`AnimationController`] through a
//! [`SharedController`]. Locks are taken for a single call and never held across
//! an `.await`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use ryan_core::orb::{FrameContext, FrequencySource, Renderer};
use ryan_core::{AnimationController, DecayOutcome, RenderLoop};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

pub type SharedController = Arc<Mutex<AnimationController>>;

pub fn shared(controller: AnimationController) -> SharedController {
    Arc::new(Mutex::new(controller))
}

fn lock(controller: &SharedController) -> MutexGuard<'_, AnimationController> {
    controller.lock().unwrap_or_else(|e| e.into_inner())
}

/// Anything that reacts to assistant responses.
pub trait OrbSignal: Send + Sync {
    fn trigger(&self, is_error: bool);
}

/// Owns the repeating decay task. A new trigger cancels the pending task before
/// starting another, so at most one sequence is ever running.
pub struct DecayTicker {
    controller: SharedController,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl DecayTicker {
    pub fn new(controller: SharedController) -> Self {
        Self {
            controller,
            task: Mutex::new(None),
        }
    }

    pub fn controller(&self) -> &SharedController {
        &self.controller
    }

    /// True while a decay task is alive.
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|t| !t.is_finished())
    }

    pub fn stop(&self) {
        if let Some(task) = self.task.lock().unwrap_or_else(|e| e.into_inner()).take() {
            task.abort();
        }
    }
}

impl OrbSignal for DecayTicker {
    fn trigger(&self, is_error: bool) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No tokio runtime; orb trigger ignored");
            return;
        };

        let mut slot = self.task.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = slot.take() {
            previous.abort();
        }

        let (period, sequence) = {
            let mut controller = lock(&self.controller);
            controller.trigger(is_error);
            (controller.config().period(), controller.sequence())
        };

        let controller = Arc::clone(&self.controller);
        *slot = Some(runtime.spawn(async move {
            let mut ticks = tokio::time::interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                let outcome = lock(&controller).decay_for(sequence);
                if outcome != DecayOutcome::Continue {
                    debug!("Decay ticker {} stopped: {:?}", sequence, outcome);
                    break;
                }
            }
        }));
    }
}

impl Drop for DecayTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Host frame clock. Yields seconds since the loop started, or `None` on teardown.
#[async_trait::async_trait]
pub trait FrameSource: Send {
    async fn next_frame(&mut self) -> Option<f32>;
}

/// Fixed-rate frame clock for hosts without a native one.
pub struct IntervalFrames {
    ticks: tokio::time::Interval,
    started: Instant,
    remaining: Option<u64>,
}

impl IntervalFrames {
    pub fn new(period: Duration) -> Self {
        let mut ticks = tokio::time::interval(period.max(Duration::from_millis(1)));
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            ticks,
            started: Instant::now(),
            remaining: None,
        }
    }

    /// Ends the clock after `frames` frames.
    pub fn limited(period: Duration, frames: u64) -> Self {
        Self {
            remaining: Some(frames),
            ..Self::new(period)
        }
    }
}

#[async_trait::async_trait]
impl FrameSource for IntervalFrames {
    async fn next_frame(&mut self) -> Option<f32> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return None;
            }
            *remaining -= 1;
        }
        self.ticks.tick().await;
        Some(self.started.elapsed().as_secs_f32())
    }
}

/// Runs the render loop once per host frame until the frame source ends.
pub struct OrbDriver {
    render: RenderLoop,
    controller: SharedController,
    speaking: Arc<AtomicBool>,
    rng: StdRng,
}

impl OrbDriver {
    pub fn new(render: RenderLoop, controller: SharedController, speaking: Arc<AtomicBool>) -> Self {
        Self {
            render,
            controller,
            speaking,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic jitter, for tests and recordings.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn render_loop(&self) -> &RenderLoop {
        &self.render
    }

    pub async fn run(
        &mut self,
        frames: &mut dyn FrameSource,
        renderer: &mut (dyn Renderer + Send),
        mut microphone: Option<&mut (dyn FrequencySource + Send)>,
    ) -> u64 {
        info!("Orb render loop started");
        let mut count = 0;
        while let Some(time) = frames.next_frame().await {
            let (animation, material) = {
                let controller = lock(&self.controller);
                (controller.state(), controller.material())
            };
            let ctx = FrameContext {
                time,
                animation,
                material,
                speaking: self.speaking.load(Ordering::SeqCst),
            };
            let mic = microphone
                .as_deref_mut()
                .map(|m| m as &mut dyn FrequencySource);
            self.render.frame(&ctx, mic, &mut *renderer, &mut self.rng);
            count += 1;
        }
        info!("Orb render loop stopped after {} frames", count);
        count
    }
}
