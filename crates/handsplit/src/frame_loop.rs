//! The per-frame detect and render cycle.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use crate::canvas::Canvas;
use crate::config::LoopOptions;
use crate::error::LoopError;
use crate::estimator::HandEstimator;
use crate::image::Resolution;
use crate::render::Renderer;
use crate::side::{Side, SideClassifier, SideStates, SideUpdate};
use crate::timer::{FpsCounter, Timer};
use crate::video::FrameSource;

/// Result of [`Scheduler::wait`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Run the next cycle now.
    Run,
    /// Stop the loop.
    Stop,
}

/// Decides when the next cycle of a [`FrameLoop`] runs.
pub trait Scheduler {
    /// Blocks until the next cycle should run.
    fn wait(&mut self) -> Tick;
}

impl<F: FnMut() -> Tick> Scheduler for F {
    fn wait(&mut self) -> Tick {
        self()
    }
}

/// Paces cycles to a display refresh rate.
///
/// If a cycle takes longer than one refresh interval, the next one starts right away. Missed
/// intervals are skipped rather than caught up on.
#[derive(Debug)]
pub struct RefreshScheduler {
    interval: Duration,
    next: Option<Instant>,
}

impl RefreshScheduler {
    /// Creates a scheduler running at most `refresh_hz` cycles per second.
    ///
    /// A rate of 0 disables pacing.
    pub fn new(refresh_hz: u32) -> Self {
        let interval = match refresh_hz {
            0 => Duration::ZERO,
            hz => Duration::from_secs(1) / hz,
        };
        Self {
            interval,
            next: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Scheduler for RefreshScheduler {
    fn wait(&mut self) -> Tick {
        if let Some(next) = self.next {
            let now = Instant::now();
            if next > now {
                thread::sleep(next - now);
            }
        }
        self.next = Some(Instant::now() + self.interval);
        Tick::Run
    }
}

/// A flag that asks a running [`FrameLoop`] to stop.
///
/// Clones share the same flag, so a clone can be handed to another thread.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes [`FrameLoop::run`] return once the current cycle is done.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }
}

/// What happened during one [`FrameLoop::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    /// Size of the frame the hands were detected on.
    pub resolution: Resolution,
    /// Number of hands the estimator found.
    pub detections: usize,
    /// What was drawn on the left and right canvas.
    pub sides: [SideUpdate; 2],
}

impl FrameReport {
    pub fn side(&self, side: Side) -> SideUpdate {
        match side {
            Side::Left => self.sides[0],
            Side::Right => self.sides[1],
        }
    }
}

/// Reads frames, finds hands, and draws them on the left or right canvas.
///
/// The loop owns all of its collaborators and the per-side state; one cycle runs to completion
/// before the next one starts.
pub struct FrameLoop<S, E, C> {
    source: S,
    estimator: E,
    left: C,
    right: C,
    options: LoopOptions,
    classifier: SideClassifier,
    renderer: Renderer,
    states: SideStates,
    fps: FpsCounter,
    t_estimate: Timer,
    t_render: Timer,
}

impl<S, E, C> FrameLoop<S, E, C>
where
    S: FrameSource,
    E: HandEstimator,
    C: Canvas,
{
    pub fn new(source: S, estimator: E, left: C, right: C, options: LoopOptions) -> Self {
        Self {
            source,
            estimator,
            left,
            right,
            options,
            classifier: SideClassifier::new(options.get_tie_break()),
            renderer: Renderer::new(
                options.get_marker_radius(),
                options.is_rescaling_to_surface(),
            ),
            states: SideStates::new(),
            fps: FpsCounter::new("frame loop"),
            t_estimate: Timer::new("estimate"),
            t_render: Timer::new("render"),
        }
    }

    /// Returns the hand currently shown on each side.
    pub fn states(&self) -> &SideStates {
        &self.states
    }

    pub fn canvas(&self, side: Side) -> &C {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Runs a single detect and render cycle.
    pub fn step(&mut self) -> anyhow::Result<FrameReport> {
        let frame = self.source.read()?;
        let resolution = frame.resolution();
        if resolution.is_empty() {
            return Err(LoopError::EmptyFrame.into());
        }

        let estimate_options = self.options.estimate_options();
        let detections = self
            .t_estimate
            .time(|| self.estimator.estimate(&frame, estimate_options))?;
        let num_detections = detections.len();

        let assignment = self.classifier.assign(detections, resolution.width());
        let sides = self
            .states
            .update(assignment, self.options.is_holding_last_pose());

        let render_guard = self.t_render.start();
        self.left.clear();
        self.right.clear();
        for side in Side::ALL {
            let Some(detection) = self.states.get(side) else {
                continue;
            };
            let canvas = match side {
                Side::Left => &mut self.left,
                Side::Right => &mut self.right,
            };
            self.renderer
                .draw_hand(canvas, side, detection, resolution);
        }
        self.left.present()?;
        self.right.present()?;
        drop(render_guard);

        log::trace!(
            "{} hands in {} frame, left: {:?}, right: {:?}",
            num_detections,
            resolution,
            sides[0],
            sides[1],
        );
        self.fps.tick_with(
            [&self.t_estimate, &self.t_render]
                .into_iter()
                .chain(self.source.timers())
                .chain(self.estimator.timers()),
        );

        Ok(FrameReport {
            resolution,
            detections: num_detections,
            sides,
        })
    }

    /// Runs cycles until `scheduler` or `stop` ends the loop, or a canvas is closed.
    ///
    /// Returns the number of completed cycles, or the first error.
    pub fn run<T: Scheduler + ?Sized>(
        &mut self,
        scheduler: &mut T,
        stop: &StopSignal,
    ) -> anyhow::Result<u64> {
        let mut frames = 0;
        loop {
            if stop.is_stopped() {
                log::debug!("stop requested after {frames} frames");
                break;
            }
            if !self.left.is_open() || !self.right.is_open() {
                log::debug!("canvas closed after {frames} frames");
                break;
            }
            if scheduler.wait() == Tick::Stop {
                break;
            }

            self.step()?;
            frames += 1;
        }
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_interval() {
        assert_eq!(RefreshScheduler::new(0).interval(), Duration::ZERO);
        assert_eq!(
            RefreshScheduler::new(50).interval(),
            Duration::from_millis(20)
        );
    }

    #[test]
    fn refresh_pacing() {
        let mut scheduler = RefreshScheduler::new(100);
        let start = Instant::now();
        for _ in 0..4 {
            assert_eq!(scheduler.wait(), Tick::Run);
        }
        // The first tick is immediate, the remaining three wait 10ms each.
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn late_cycle_is_not_caught_up() {
        let mut scheduler = RefreshScheduler::new(20);
        scheduler.wait();

        // Overrun the 50ms interval by a lot.
        thread::sleep(Duration::from_millis(200));
        let start = Instant::now();
        assert_eq!(scheduler.wait(), Tick::Run);
        assert!(start.elapsed() < Duration::from_millis(25));

        // The missed intervals do not turn into a burst of immediate ticks.
        let start = Instant::now();
        scheduler.wait();
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn stop_signal_is_shared() {
        let signal = StopSignal::new();
        let remote = signal.clone();
        assert!(!signal.is_stopped());
        thread::spawn(move || remote.stop()).join().unwrap();
        assert!(signal.is_stopped());
    }
}
