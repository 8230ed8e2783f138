//! Rerun-backed scene renderer.
//!
//! Each arrow becomes its own `Arrows3D` entity under
//! `{prefix}/nodes/{node}/arrows/{arrow}`. Destroying an arrow logs a
//! `Clear`; hiding a node clears its whole subtree and showing it again
//! re-logs every arrow it still owns.
//!
//! Enable with the `visualization` feature flag.

use std::collections::HashMap;

use nalgebra::{UnitQuaternion, Vector3};
use odomtrail_env::{ArrowGeometry, ArrowHandle, ColorRgba, NodeHandle, SceneRenderer};
use rerun::{Arrows3D, Clear, Color, RecordingStream, RecordingStreamBuilder};
use tracing::warn;

#[derive(Debug, Clone)]
struct RerunArrow {
    node: NodeHandle,
    geometry: ArrowGeometry,
    position: Vector3<f32>,
    orientation: UnitQuaternion<f32>,
    color: ColorRgba,
}

impl RerunArrow {
    /// Tail-to-tip vector: the arrow's local +x scaled to its full length.
    fn vector(&self) -> Vector3<f32> {
        self.orientation * Vector3::new(self.geometry.total_length(), 0.0, 0.0)
    }
}

/// Scene renderer that streams arrows to a Rerun recording.
pub struct RerunScene {
    rec: RecordingStream,
    prefix: String,
    nodes: HashMap<NodeHandle, bool>,
    arrows: HashMap<ArrowHandle, RerunArrow>,
    next_id: u64,
}

impl RerunScene {
    /// Spawns a Rerun viewer and streams to it.
    pub fn new(app_id: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let rec = RecordingStreamBuilder::new(app_id).spawn()?;
        Ok(Self::with_stream(rec, "world"))
    }

    /// Writes the recording to an `.rrd` file instead of a viewer.
    pub fn new_to_file(app_id: &str, path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let rec = RecordingStreamBuilder::new(app_id).save(path)?;
        Ok(Self::with_stream(rec, "world"))
    }

    /// Wraps an existing recording, logging under `prefix`.
    pub fn with_stream(rec: RecordingStream, prefix: impl Into<String>) -> Self {
        Self {
            rec,
            prefix: prefix.into(),
            nodes: HashMap::new(),
            arrows: HashMap::new(),
            next_id: 0,
        }
    }

    /// Sets the timeline position for subsequent logs.
    pub fn set_time(&self, seconds: f64) {
        self.rec.set_time_seconds("replay_time", seconds);
    }

    pub fn recording(&self) -> &RecordingStream {
        &self.rec
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn node_path(&self, node: NodeHandle) -> String {
        format!("{}/nodes/{}", self.prefix, node)
    }

    fn arrow_path(&self, node: NodeHandle, arrow: ArrowHandle) -> String {
        format!("{}/arrows/{}", self.node_path(node), arrow)
    }

    fn is_visible(&self, node: NodeHandle) -> bool {
        self.nodes.get(&node).copied().unwrap_or(false)
    }

    fn log_arrow(&self, handle: ArrowHandle) {
        let Some(arrow) = self.arrows.get(&handle) else {
            return;
        };
        if !self.is_visible(arrow.node) {
            return;
        }

        let v = arrow.vector();
        let p = arrow.position;
        let [r, g, b, a] = arrow.color.to_rgba8();
        let result = self.rec.log(
            self.arrow_path(arrow.node, handle),
            &Arrows3D::from_vectors([[v.x, v.y, v.z]])
                .with_origins([[p.x, p.y, p.z]])
                .with_colors([Color::from_unmultiplied_rgba(r, g, b, a)])
                .with_radii([arrow.geometry.shaft_diameter / 2.0]),
        );
        if let Err(e) = result {
            warn!(arrow = %handle, "Failed to log arrow: {}", e);
        }
    }

    fn clear_path(&self, path: String, recursive: bool) {
        let clear = if recursive {
            Clear::recursive()
        } else {
            Clear::flat()
        };
        if let Err(e) = self.rec.log(path, &clear) {
            warn!("Failed to clear entity: {}", e);
        }
    }
}

impl SceneRenderer for RerunScene {
    fn create_node(&mut self) -> NodeHandle {
        let node = NodeHandle(self.next_id());
        self.nodes.insert(node, true);
        node
    }

    fn destroy_node(&mut self, node: NodeHandle) {
        self.arrows.retain(|_, arrow| arrow.node != node);
        if self.nodes.remove(&node).is_some() {
            self.clear_path(self.node_path(node), true);
        }
    }

    fn set_node_visible(&mut self, node: NodeHandle, visible: bool) {
        let Some(current) = self.nodes.get_mut(&node) else {
            return;
        };
        if *current == visible {
            return;
        }
        *current = visible;

        if visible {
            let owned: Vec<ArrowHandle> = self
                .arrows
                .iter()
                .filter(|(_, arrow)| arrow.node == node)
                .map(|(handle, _)| *handle)
                .collect();
            for handle in owned {
                self.log_arrow(handle);
            }
        } else {
            self.clear_path(self.node_path(node), true);
        }
    }

    fn create_arrow(&mut self, node: NodeHandle, geometry: ArrowGeometry) -> ArrowHandle {
        let handle = ArrowHandle(self.next_id());
        self.arrows.insert(
            handle,
            RerunArrow {
                node,
                geometry,
                position: Vector3::zeros(),
                orientation: UnitQuaternion::identity(),
                color: ColorRgba {
                    r: 1.0,
                    g: 1.0,
                    b: 1.0,
                    a: 1.0,
                },
            },
        );
        self.log_arrow(handle);
        handle
    }

    fn set_arrow_color(&mut self, arrow: ArrowHandle, color: ColorRgba) {
        if let Some(state) = self.arrows.get_mut(&arrow) {
            state.color = color;
            self.log_arrow(arrow);
        }
    }

    fn set_arrow_position(&mut self, arrow: ArrowHandle, position: Vector3<f32>) {
        if let Some(state) = self.arrows.get_mut(&arrow) {
            state.position = position;
            self.log_arrow(arrow);
        }
    }

    fn set_arrow_orientation(&mut self, arrow: ArrowHandle, orientation: UnitQuaternion<f32>) {
        if let Some(state) = self.arrows.get_mut(&arrow) {
            state.orientation = orientation;
            self.log_arrow(arrow);
        }
    }

    fn destroy_arrow(&mut self, arrow: ArrowHandle) {
        if let Some(state) = self.arrows.remove(&arrow) {
            self.clear_path(self.arrow_path(state.node, arrow), false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    fn arrow(orientation: UnitQuaternion<f32>) -> RerunArrow {
        RerunArrow {
            node: NodeHandle(1),
            geometry: ArrowGeometry {
                shaft_length: 0.8,
                shaft_diameter: 0.05,
                head_length: 0.2,
                head_diameter: 0.2,
            },
            position: Vector3::zeros(),
            orientation,
            color: ColorRgba {
                r: 1.0,
                g: 0.0,
                b: 0.0,
                a: 1.0,
            },
        }
    }

    #[test]
    fn test_identity_arrow_points_along_x() {
        let v = arrow(UnitQuaternion::identity()).vector();
        assert_relative_eq!(v, Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_yawed_arrow_points_along_y() {
        let v = arrow(UnitQuaternion::from_euler_angles(0.0, 0.0, FRAC_PI_2)).vector();
        assert_relative_eq!(v, Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-6);
    }
}
