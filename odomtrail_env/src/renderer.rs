//! Scene renderer abstraction.
//!
//! The renderer owns every primitive. Callers hold opaque handles and must
//! destroy what they create; nothing is cleaned up implicitly.

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::types::{ArrowHandle, ColorRgba, NodeHandle};

/// Proportions of an arrow primitive, in scene units.
///
/// The arrow points along its local +x axis: shaft from the origin, head
/// after it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArrowGeometry {
    pub shaft_length: f32,
    pub shaft_diameter: f32,
    pub head_length: f32,
    pub head_diameter: f32,
}

impl ArrowGeometry {
    /// Overall length, tail to tip.
    pub fn total_length(&self) -> f32 {
        self.shaft_length + self.head_length
    }
}

/// Scene-graph operations needed to draw arrow trails.
///
/// Positions and orientations are in the renderer's own coordinate
/// convention; converting from robot coordinates is the caller's job.
pub trait SceneRenderer {
    /// Creates an empty, visible scene node.
    fn create_node(&mut self) -> NodeHandle;

    /// Destroys a node. Arrows still attached to it are destroyed too.
    fn destroy_node(&mut self, node: NodeHandle);

    /// Shows or hides a node and everything under it.
    fn set_node_visible(&mut self, node: NodeHandle, visible: bool);

    /// Creates an arrow under `node`, at the origin with identity orientation.
    fn create_arrow(&mut self, node: NodeHandle, geometry: ArrowGeometry) -> ArrowHandle;

    fn set_arrow_color(&mut self, arrow: ArrowHandle, color: ColorRgba);

    fn set_arrow_position(&mut self, arrow: ArrowHandle, position: Vector3<f32>);

    fn set_arrow_orientation(&mut self, arrow: ArrowHandle, orientation: UnitQuaternion<f32>);

    /// Destroys an arrow. Unknown handles are ignored.
    fn destroy_arrow(&mut self, arrow: ArrowHandle);
}

impl<R: SceneRenderer + ?Sized> SceneRenderer for &mut R {
    fn create_node(&mut self) -> NodeHandle {
        (**self).create_node()
    }

    fn destroy_node(&mut self, node: NodeHandle) {
        (**self).destroy_node(node)
    }

    fn set_node_visible(&mut self, node: NodeHandle, visible: bool) {
        (**self).set_node_visible(node, visible)
    }

    fn create_arrow(&mut self, node: NodeHandle, geometry: ArrowGeometry) -> ArrowHandle {
        (**self).create_arrow(node, geometry)
    }

    fn set_arrow_color(&mut self, arrow: ArrowHandle, color: ColorRgba) {
        (**self).set_arrow_color(arrow, color)
    }

    fn set_arrow_position(&mut self, arrow: ArrowHandle, position: Vector3<f32>) {
        (**self).set_arrow_position(arrow, position)
    }

    fn set_arrow_orientation(&mut self, arrow: ArrowHandle, orientation: UnitQuaternion<f32>) {
        (**self).set_arrow_orientation(arrow, orientation)
    }

    fn destroy_arrow(&mut self, arrow: ArrowHandle) {
        (**self).destroy_arrow(arrow)
    }
}
