//! odomtrail Core - live odometry arrow trail
//!
//! Draws a bounded trail of arrows, one per sufficiently distinct odometry
//! estimate, in the host's fixed frame:
//! 1. **Motion filter**: poses within both tolerances of the last accepted
//!    one are skipped
//! 2. **Transform**: accepted poses are re-expressed in the fixed frame
//! 3. **Trail**: each pose becomes an arrow; a periodic tick evicts the
//!    oldest arrows beyond `keep`
//!
//! The display itself only talks to the collaborator traits from
//! `odomtrail_env`. This crate also provides the in-process collaborators
//! used by tests and the replay harness: [`FrameTree`], [`HeadlessScene`],
//! [`HeadlessHost`] and, with the `visualization` feature, a Rerun-backed
//! scene.

pub mod config;
pub mod convention;
pub mod display;
pub mod filter;
pub mod frames;
pub mod host;
pub mod properties;
pub mod scene;
pub mod trail;

#[cfg(feature = "visualization")]
pub mod visualization;

// Re-export key types for convenience
pub use config::{AngleMetric, ConfigError, DisplayConfig};
pub use convention::SceneConvention;
pub use display::{
    DisplayServices, DisplayStats, MessageOutcome, OdometryDisplay, ARROW_GEOMETRY,
    SUBSCRIBE_QUEUE_DEPTH,
};
pub use filter::MotionFilter;
pub use frames::FrameTree;
pub use host::HeadlessHost;
pub use properties::{Property, PropertyDescriptor, PropertyError, PropertyKind, PropertyValue};
pub use scene::{ArrowState, HeadlessScene};
pub use trail::ArrowTrail;

#[cfg(feature = "visualization")]
pub use visualization::RerunScene;
