//! odomtrail replay harness
//!
//! Drives an [`odomtrail_core::OdometryDisplay`] with synthetic odometry so
//! the whole message → filter → transform → trail pipeline runs without a
//! robot or a visualization host.
//!
//! # Determinism
//!
//! Trajectory noise comes from a single ChaCha8 stream seeded per run, and
//! every collaborator is in-process and single-threaded: the same
//! `(scenario, seed, rate, duration, config)` always produces the same
//! [`ReplayStats`].
//!
//! # Usage
//!
//! ```ignore
//! use odomtrail_sim::{ReplayRunner, ScenarioId};
//!
//! let stats = ReplayRunner::new(42)
//!     .with_duration(20.0)
//!     .run(ScenarioId::Dropout)?;
//! assert!(stats.passed());
//! ```

mod error;
mod exporter;
mod runner;
pub mod scenarios;
pub mod trajectory;

pub use error::ReplayError;
pub use exporter::{ArrowPosition, TrailExport, TrailFrame};
pub use runner::{scenario_frames, ReplayDisplay, ReplayRunner, ReplaySession, ReplayStats, DEFAULT_TOPIC};
pub use scenarios::{ScenarioEvent, ScenarioId};
pub use trajectory::{PathShape, TrajectoryGenerator};
