//! Replay scenarios.
//!
//! Each scenario is a trajectory plus a short script of host-side events
//! fired at fixed fractions of the run.

use crate::trajectory::PathShape;

/// Frame the display starts with.
pub const MAP_FRAME: &str = "map";

/// Alternate fixed frame used by [`ScenarioId::FrameSwitch`].
pub const WORLD_FRAME: &str = "world";

/// Frame nobody publishes a transform for.
pub const LOST_FRAME: &str = "odom_lost";

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// Steady circular drive, nothing else happens
    Circle,

    /// Parked robot with sensor jitter; the motion filter should drop most
    /// messages
    Stationary,

    /// Fixed frame switches from `map` to `world` halfway through
    FrameSwitch,

    /// Messages arrive in an unknown frame for the middle fifth of the run
    Dropout,

    /// `keep` is cut to a quarter halfway through a figure-eight
    KeepShrink,
}

/// Host-side event injected during a replay.
#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioEvent {
    /// The host's fixed frame changes
    SwitchFixedFrame(String),

    /// Odometry starts arriving in `frame`
    RetagFrame(String),

    /// The user edits the `keep` property
    SetKeep(u32),
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::Circle,
            ScenarioId::Stationary,
            ScenarioId::FrameSwitch,
            ScenarioId::Dropout,
            ScenarioId::KeepShrink,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::Circle => "circle",
            ScenarioId::Stationary => "stationary",
            ScenarioId::FrameSwitch => "frame_switch",
            ScenarioId::Dropout => "dropout",
            ScenarioId::KeepShrink => "keep_shrink",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::Circle => "5 m circle at 0.5 rad/s with light noise",
            ScenarioId::Stationary => "Parked robot, 1 cm jitter; trail should stay short",
            ScenarioId::FrameSwitch => "Fixed frame map -> world at 50%, trail restarts",
            ScenarioId::Dropout => "Unknown source frame from 40% to 60%, errors logged",
            ScenarioId::KeepShrink => "Figure-eight, keep cut to a quarter at 50%",
        }
    }

    /// Ground-truth path for this scenario.
    pub fn shape(&self) -> PathShape {
        match self {
            ScenarioId::Stationary => PathShape::Stationary,
            ScenarioId::KeepShrink => PathShape::FigureEight {
                scale: 6.0,
                angular_speed: 0.4,
            },
            ScenarioId::Circle | ScenarioId::FrameSwitch | ScenarioId::Dropout => {
                PathShape::Circle {
                    radius: 5.0,
                    angular_speed: 0.5,
                }
            }
        }
    }

    /// Position / yaw noise standard deviations.
    pub fn noise(&self) -> (f64, f64) {
        match self {
            ScenarioId::Stationary => (0.01, 0.005),
            _ => (0.02, 0.01),
        }
    }

    /// Events as `(time_sec, event)`, sorted by time.
    ///
    /// # Arguments
    /// * `duration` - Length of the run in seconds
    /// * `keep` - Capacity the run starts with
    pub fn events(&self, duration: f64, keep: u32) -> Vec<(f64, ScenarioEvent)> {
        match self {
            ScenarioId::Circle | ScenarioId::Stationary => Vec::new(),
            ScenarioId::FrameSwitch => vec![(
                duration * 0.5,
                ScenarioEvent::SwitchFixedFrame(WORLD_FRAME.to_string()),
            )],
            ScenarioId::Dropout => vec![
                (duration * 0.4, ScenarioEvent::RetagFrame(LOST_FRAME.to_string())),
                (
                    duration * 0.6,
                    ScenarioEvent::RetagFrame(crate::trajectory::ODOM_FRAME.to_string()),
                ),
            ],
            ScenarioId::KeepShrink => {
                vec![(duration * 0.5, ScenarioEvent::SetKeep((keep / 4).max(1)))]
            }
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "circle" => Ok(ScenarioId::Circle),
            "stationary" | "parked" => Ok(ScenarioId::Stationary),
            "frame_switch" | "frameswitch" => Ok(ScenarioId::FrameSwitch),
            "dropout" => Ok(ScenarioId::Dropout),
            "keep_shrink" | "keepshrink" => Ok(ScenarioId::KeepShrink),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
