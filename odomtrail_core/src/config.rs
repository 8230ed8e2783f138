//! Display configuration.
//!
//! Everything a user can tune on an odometry trail lives in
//! [`DisplayConfig`]. The display applies changes through its typed setters;
//! this struct is only the data plus (de)serialization.

use std::path::Path;

use odomtrail_env::ColorRgb;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default arrow color (orange-red).
pub const DEFAULT_COLOR: ColorRgb = ColorRgb::new(1.0, 0.1, 0.0);

/// Default number of arrows kept.
pub const DEFAULT_KEEP: u32 = 100;

/// Default position tolerance in meters.
pub const DEFAULT_POSITION_TOLERANCE: f32 = 0.1;

/// Default angle tolerance.
pub const DEFAULT_ANGLE_TOLERANCE: f32 = 0.1;

/// How the orientation change between two poses is measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleMetric {
    /// Norm of the component-wise difference of the raw `(x, y, z, w)`
    /// quaternions. Not an angle: `q` and `-q` are far apart.
    #[default]
    ComponentDifference,

    /// Rotation angle in radians between the normalized orientations.
    Geodesic,
}

impl AngleMetric {
    pub fn name(&self) -> &'static str {
        match self {
            AngleMetric::ComponentDifference => "component_difference",
            AngleMetric::Geodesic => "geodesic",
        }
    }

    pub fn all() -> [AngleMetric; 2] {
        [AngleMetric::ComponentDifference, AngleMetric::Geodesic]
    }
}

impl std::str::FromStr for AngleMetric {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "component_difference" | "component" => Ok(AngleMetric::ComponentDifference),
            "geodesic" => Ok(AngleMetric::Geodesic),
            _ => Err(ConfigError::UnknownAngleMetric(s.to_string())),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown angle metric: {0}")]
    UnknownAngleMetric(String),
}

/// User-tunable settings of an odometry trail display.
///
/// Values are taken as given: negative tolerances are not rejected, they
/// simply never filter anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Topic carrying the odometry stream
    pub topic: String,

    /// Arrow color (drawn fully opaque)
    pub color: ColorRgb,

    /// Maximum number of arrows kept; 0 keeps everything
    pub keep: u32,

    /// Messages closer than this (meters) to the last accepted one may be skipped
    pub position_tolerance: f32,

    /// Messages whose orientation differs less than this may be skipped
    pub angle_tolerance: f32,

    /// Metric used for `angle_tolerance`
    pub angle_metric: AngleMetric,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            topic: String::new(),
            color: DEFAULT_COLOR,
            keep: DEFAULT_KEEP,
            position_tolerance: DEFAULT_POSITION_TOLERANCE,
            angle_tolerance: DEFAULT_ANGLE_TOLERANCE,
            angle_metric: AngleMetric::default(),
        }
    }
}

impl DisplayConfig {
    /// Parses a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Same config with a different topic.
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    pub fn with_keep(mut self, keep: u32) -> Self {
        self.keep = keep;
        self
    }

    pub fn with_tolerances(mut self, position: f32, angle: f32) -> Self {
        self.position_tolerance = position;
        self.angle_tolerance = angle;
        self
    }
}
