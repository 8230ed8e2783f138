//! Replay runner - drives a display through a scenario.
//!
//! One replay step mirrors one host frame:
//!
//! ```text
//! generator ──► bus.publish ──► transport.drain ──► display.on_message
//!                                                          │
//!                            scenario events ──► display.tick
//! ```

use nalgebra::Isometry3;
use odomtrail_core::{
    DisplayConfig, DisplayServices, FrameTree, HeadlessHost, HeadlessScene, MessageOutcome,
    OdometryDisplay,
};
use odomtrail_env::{LoopbackBus, LoopbackTransport, SceneRenderer};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ReplayError;
use crate::exporter::{ArrowPosition, TrailExport, TrailFrame};
use crate::scenarios::{ScenarioEvent, ScenarioId, MAP_FRAME, WORLD_FRAME};
use crate::trajectory::{TrajectoryGenerator, ODOM_FRAME};

/// Topic used when the configuration leaves it empty.
pub const DEFAULT_TOPIC: &str = "/odom";

/// Display type every replay drives.
pub type ReplayDisplay<R> = OdometryDisplay<LoopbackTransport, FrameTree, R, HeadlessHost>;

/// Counters collected over a replay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayStats {
    /// Messages handed to the bus
    pub published: u64,

    pub accepted: u64,
    pub filtered: u64,
    pub transform_failures: u64,

    /// Arrows destroyed by `tick`
    pub evicted: u64,

    /// Messages the subscriber queue discarded before delivery
    pub queue_dropped: u64,

    /// Longest trail observed after a tick
    pub max_trail_len: usize,

    pub final_trail_len: usize,

    /// Ticks that ended with more than `keep` arrows
    pub keep_violations: u64,
}

impl ReplayStats {
    /// True when the trail never outgrew `keep` after a tick.
    pub fn passed(&self) -> bool {
        self.keep_violations == 0
    }
}

/// Runs scenarios against a display.
pub struct ReplayRunner {
    /// Seed for the trajectory noise
    seed: u64,

    /// Publish rate in Hz (one message per step)
    rate_hz: f64,

    /// Duration in seconds
    duration_secs: f64,

    /// Display configuration
    config: DisplayConfig,

    /// Steps between export snapshots
    export_interval: u64,
}

impl ReplayRunner {
    /// Creates a runner with a 10 s, 10 Hz replay and the default
    /// display configuration.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rate_hz: 10.0,
            duration_secs: 10.0,
            config: DisplayConfig::default(),
            export_interval: 5,
        }
    }

    pub fn with_rate(mut self, rate_hz: f64) -> Self {
        self.rate_hz = rate_hz;
        self
    }

    pub fn with_duration(mut self, secs: f64) -> Self {
        self.duration_secs = secs;
        self
    }

    pub fn with_config(mut self, config: DisplayConfig) -> Self {
        self.config = config;
        self
    }

    /// Snapshots the trail every `steps` steps when exporting.
    pub fn with_export_interval(mut self, steps: u64) -> Self {
        self.export_interval = steps.max(1);
        self
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    /// Prepares a step-by-step replay rendering into `renderer`.
    pub fn session<R: SceneRenderer>(
        &self,
        scenario: ScenarioId,
        renderer: R,
    ) -> Result<ReplaySession<R>, ReplayError> {
        if !(self.duration_secs.is_finite() && self.duration_secs >= 0.0) {
            return Err(ReplayError::InvalidDuration(self.duration_secs));
        }

        let (position_std, yaw_std) = scenario.noise();
        let generator = TrajectoryGenerator::new(scenario.shape(), self.seed, self.rate_hz)?
            .with_noise(position_std, yaw_std)?;

        let mut config = self.config.clone();
        if config.topic.is_empty() {
            config.topic = DEFAULT_TOPIC.to_string();
        }
        let topic = config.topic.clone();
        let keep = config.keep;

        let bus = LoopbackBus::new();
        let mut display = OdometryDisplay::new(
            scenario.name(),
            MAP_FRAME,
            config,
            DisplayServices {
                transport: bus.transport(),
                transforms: scenario_frames(),
                renderer,
                host: HeadlessHost::new(),
            },
        );
        display.enable();

        let total_steps = (self.duration_secs * self.rate_hz).round() as u64;
        info!(
            scenario = scenario.name(),
            seed = self.seed,
            steps = total_steps,
            "Starting replay"
        );

        Ok(ReplaySession {
            scenario,
            topic,
            bus,
            generator,
            display,
            events: scenario.events(self.duration_secs, keep),
            next_event: 0,
            step: 0,
            total_steps,
            published: 0,
            max_trail_len: 0,
            keep_violations: 0,
        })
    }

    /// Runs `scenario` headless and returns its counters.
    pub fn run(&self, scenario: ScenarioId) -> Result<ReplayStats, ReplayError> {
        let mut session = self.session(scenario, HeadlessScene::new())?;
        while session.step() {}
        Ok(session.finish())
    }

    /// Runs `scenario` headless, snapshotting the trail along the way.
    pub fn run_with_export(
        &self,
        scenario: ScenarioId,
    ) -> Result<(ReplayStats, TrailExport), ReplayError> {
        let mut session = self.session(scenario, HeadlessScene::new())?;
        let mut export = TrailExport::new(scenario.name(), self.seed);

        while session.step() {
            if session.steps_done() % self.export_interval == 0 {
                export.add_frame(session.snapshot());
            }
        }
        export.add_frame(session.snapshot());

        let stats = session.finish();
        export.finalize(stats.clone());
        Ok((stats, export))
    }
}

/// Transforms every scenario relies on: `world → map → odom`.
///
/// `odom` sits 1 m ahead of `map`; `map` sits 10 m along `world`'s x axis.
pub fn scenario_frames() -> FrameTree {
    let mut frames = FrameTree::new();
    frames.set_transform(MAP_FRAME, ODOM_FRAME, Isometry3::translation(1.0, 0.0, 0.0));
    frames.set_transform(WORLD_FRAME, MAP_FRAME, Isometry3::translation(10.0, 0.0, 0.0));
    frames
}

/// A replay in progress.
pub struct ReplaySession<R: SceneRenderer> {
    scenario: ScenarioId,
    topic: String,
    bus: LoopbackBus,
    generator: TrajectoryGenerator,
    display: ReplayDisplay<R>,
    events: Vec<(f64, ScenarioEvent)>,
    next_event: usize,
    step: u64,
    total_steps: u64,
    published: u64,
    max_trail_len: usize,
    keep_violations: u64,
}

impl<R: SceneRenderer> ReplaySession<R> {
    /// Advances one host frame. Returns `false` once the replay is over.
    pub fn step(&mut self) -> bool {
        if self.step >= self.total_steps {
            return false;
        }

        // Step 1: fire scenario events due at this step
        let now = self.generator.time();
        let horizon = now + 0.5 * self.generator.period();
        while let Some((at, event)) = self.events.get(self.next_event) {
            if *at > horizon {
                break;
            }
            let event = event.clone();
            self.next_event += 1;
            self.apply(event);
        }

        // Step 2: publish and deliver
        let msg = self.generator.next_message();
        self.bus.publish(&self.topic, msg);
        self.published += 1;

        for msg in self.display.transport_mut().drain() {
            if let MessageOutcome::Accepted(arrow) = self.display.on_message(&msg) {
                debug!(%arrow, t = now, "arrow added");
            }
        }

        // Step 3: trim
        self.display.tick();

        let len = self.display.arrow_count();
        self.max_trail_len = self.max_trail_len.max(len);
        let keep = self.display.config().keep as usize;
        if keep > 0 && len > keep {
            self.keep_violations += 1;
        }

        self.step += 1;
        true
    }

    fn apply(&mut self, event: ScenarioEvent) {
        info!(scenario = self.scenario.name(), ?event, "Scenario event");
        match event {
            ScenarioEvent::SwitchFixedFrame(frame) => self.display.on_fixed_frame_changed(frame),
            ScenarioEvent::RetagFrame(frame) => self.generator.set_frame(frame),
            ScenarioEvent::SetKeep(keep) => self.display.set_keep(keep),
        }
    }

    pub fn scenario(&self) -> ScenarioId {
        self.scenario
    }

    /// Replay time of the next step, in seconds.
    pub fn time(&self) -> f64 {
        self.generator.time()
    }

    /// Time between steps, in seconds.
    pub fn period(&self) -> f64 {
        self.generator.period()
    }

    pub fn steps_done(&self) -> u64 {
        self.step
    }

    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    pub fn display(&self) -> &ReplayDisplay<R> {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut ReplayDisplay<R> {
        &mut self.display
    }

    /// Counters so far.
    pub fn stats(&self) -> ReplayStats {
        let display = self.display.stats();
        ReplayStats {
            published: self.published,
            accepted: display.accepted,
            filtered: display.filtered,
            transform_failures: display.transform_failures,
            evicted: display.evicted,
            queue_dropped: self.display.transport().dropped(),
            max_trail_len: self.max_trail_len,
            final_trail_len: self.display.arrow_count(),
            keep_violations: self.keep_violations,
        }
    }

    /// Ends the replay; the display is torn down with the session.
    pub fn finish(self) -> ReplayStats {
        let stats = self.stats();
        info!(
            scenario = self.scenario.name(),
            accepted = stats.accepted,
            filtered = stats.filtered,
            transform_failures = stats.transform_failures,
            final_trail_len = stats.final_trail_len,
            "Replay finished"
        );
        stats
    }
}

impl ReplaySession<HeadlessScene> {
    /// Current trail in scene coordinates.
    pub fn snapshot(&self) -> TrailFrame {
        let scene = self.display.renderer();
        TrailFrame {
            time_sec: self.generator.time(),
            fixed_frame: self.display.fixed_frame().to_string(),
            arrows: self
                .display
                .arrows()
                .filter_map(|handle| scene.arrow(handle).map(|s| ArrowPosition::new(handle, s)))
                .collect(),
        }
    }
}
