//! odomtrail Environment Abstraction Layer
//!
//! This crate describes everything the odometry trail display talks to but
//! does not own:
//! - the message **transport** that delivers pose messages,
//! - the **transform service** that re-expresses poses in another frame,
//! - the **scene renderer** that owns the arrow primitives,
//! - the **host** that receives change notifications and pick associations.
//!
//! Keeping these behind traits lets the display run against a real
//! visualization host, the in-memory implementations used by tests, or the
//! replay harness.
//!
//! # Example
//!
//! ```ignore
//! use odomtrail_env::{LoopbackBus, PoseTransport};
//!
//! let bus = LoopbackBus::new();
//! let mut transport = bus.transport();
//! transport.subscribe("/odom", 5);
//! bus.publish("/odom", message);
//! for msg in transport.drain() {
//!     display.on_message(&msg);
//! }
//! ```

mod error;
mod host;
mod loopback;
mod renderer;
mod transform;
mod transport;
mod types;

pub use error::TransformError;
pub use host::DisplayHost;
pub use loopback::{LoopbackBus, LoopbackTransport};
pub use renderer::{ArrowGeometry, SceneRenderer};
pub use transform::TransformService;
pub use transport::PoseTransport;
pub use types::{
    ArrowHandle, ColorRgb, ColorRgba, DisplayId, Header, NodeHandle, OdometryMessage, Pose,
    Stamp, StampedPose,
};
