//! JSON exporter for replayed trails.
//!
//! Snapshots the arrows the display holds at regular intervals so a run can
//! be inspected or plotted offline.

use std::fs::File;
use std::io::Write;

use odomtrail_core::ArrowState;
use odomtrail_env::ArrowHandle;
use serde::{Deserialize, Serialize};

use crate::runner::ReplayStats;

/// One arrow in scene coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrowPosition {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub z: f32,

    /// Orientation as `[x, y, z, w]`
    pub orientation: [f32; 4],
}

impl ArrowPosition {
    pub fn new(handle: ArrowHandle, state: &ArrowState) -> Self {
        let q = state.orientation.quaternion();
        Self {
            id: handle.0,
            x: state.position.x,
            y: state.position.y,
            z: state.position.z,
            orientation: [q.i, q.j, q.k, q.w],
        }
    }
}

/// The trail at one instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrailFrame {
    /// Replay time in seconds
    pub time_sec: f64,

    pub fixed_frame: String,

    /// Arrows oldest first
    pub arrows: Vec<ArrowPosition>,
}

/// Complete replay export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrailExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Duration in seconds
    pub duration_sec: f64,

    /// All frames
    pub frames: Vec<TrailFrame>,

    /// Final counters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<ReplayStats>,
}

impl TrailExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            duration_sec: 0.0,
            frames: Vec::new(),
            stats: None,
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: TrailFrame) {
        self.duration_sec = frame.time_sec;
        self.frames.push(frame);
    }

    /// Attaches the final counters.
    pub fn finalize(&mut self, stats: ReplayStats) {
        self.stats = Some(stats);
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
