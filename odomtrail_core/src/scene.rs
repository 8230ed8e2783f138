//! In-memory [`SceneRenderer`] for headless runs and tests.

use std::collections::BTreeMap;

use nalgebra::{UnitQuaternion, Vector3};
use odomtrail_env::{ArrowGeometry, ArrowHandle, ColorRgba, NodeHandle, SceneRenderer};
use serde::Serialize;

/// State of one arrow primitive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrowState {
    pub node: NodeHandle,
    pub geometry: ArrowGeometry,
    pub position: Vector3<f32>,
    pub orientation: UnitQuaternion<f32>,
    pub color: ColorRgba,
}

#[derive(Debug, Clone)]
struct NodeState {
    visible: bool,
}

/// Scene graph that only keeps bookkeeping: nodes, arrows, visibility.
#[derive(Debug, Default)]
pub struct HeadlessScene {
    nodes: BTreeMap<NodeHandle, NodeState>,
    arrows: BTreeMap<ArrowHandle, ArrowState>,
    next_id: u64,
    arrows_created: u64,
    arrows_destroyed: u64,
}

impl HeadlessScene {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn arrow(&self, arrow: ArrowHandle) -> Option<&ArrowState> {
        self.arrows.get(&arrow)
    }

    /// Live arrows, in creation order.
    pub fn arrows(&self) -> impl Iterator<Item = (ArrowHandle, &ArrowState)> {
        self.arrows.iter().map(|(handle, state)| (*handle, state))
    }

    pub fn arrow_count(&self) -> usize {
        self.arrows.len()
    }

    /// Live arrows attached to `node`.
    pub fn arrows_under(&self, node: NodeHandle) -> usize {
        self.arrows.values().filter(|a| a.node == node).count()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// `None` for unknown nodes.
    pub fn is_node_visible(&self, node: NodeHandle) -> Option<bool> {
        self.nodes.get(&node).map(|n| n.visible)
    }

    pub fn arrows_created(&self) -> u64 {
        self.arrows_created
    }

    pub fn arrows_destroyed(&self) -> u64 {
        self.arrows_destroyed
    }
}

impl SceneRenderer for HeadlessScene {
    fn create_node(&mut self) -> NodeHandle {
        let node = NodeHandle(self.next_id());
        self.nodes.insert(node, NodeState { visible: true });
        node
    }

    fn destroy_node(&mut self, node: NodeHandle) {
        if self.nodes.remove(&node).is_none() {
            return;
        }
        let before = self.arrows.len();
        self.arrows.retain(|_, arrow| arrow.node != node);
        self.arrows_destroyed += (before - self.arrows.len()) as u64;
    }

    fn set_node_visible(&mut self, node: NodeHandle, visible: bool) {
        if let Some(state) = self.nodes.get_mut(&node) {
            state.visible = visible;
        }
    }

    fn create_arrow(&mut self, node: NodeHandle, geometry: ArrowGeometry) -> ArrowHandle {
        let arrow = ArrowHandle(self.next_id());
        self.arrows.insert(
            arrow,
            ArrowState {
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
        self.arrows_created += 1;
        arrow
    }

    fn set_arrow_color(&mut self, arrow: ArrowHandle, color: ColorRgba) {
        if let Some(state) = self.arrows.get_mut(&arrow) {
            state.color = color;
        }
    }

    fn set_arrow_position(&mut self, arrow: ArrowHandle, position: Vector3<f32>) {
        if let Some(state) = self.arrows.get_mut(&arrow) {
            state.position = position;
        }
    }

    fn set_arrow_orientation(&mut self, arrow: ArrowHandle, orientation: UnitQuaternion<f32>) {
        if let Some(state) = self.arrows.get_mut(&arrow) {
            state.orientation = orientation;
        }
    }

    fn destroy_arrow(&mut self, arrow: ArrowHandle) {
        if self.arrows.remove(&arrow).is_some() {
            self.arrows_destroyed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GEOMETRY: ArrowGeometry = ArrowGeometry {
        shaft_length: 0.8,
        shaft_diameter: 0.05,
        head_length: 0.2,
        head_diameter: 0.2,
    };

    #[test]
    fn test_arrow_lifecycle() {
        let mut scene = HeadlessScene::new();
        let node = scene.create_node();
        let arrow = scene.create_arrow(node, GEOMETRY);

        scene.set_arrow_position(arrow, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(scene.arrow(arrow).unwrap().position, Vector3::new(1.0, 2.0, 3.0));

        scene.destroy_arrow(arrow);
        scene.destroy_arrow(arrow);
        assert_eq!(scene.arrow_count(), 0);
        assert_eq!(scene.arrows_destroyed(), 1);
    }

    #[test]
    fn test_destroy_node_takes_arrows() {
        let mut scene = HeadlessScene::new();
        let a = scene.create_node();
        let b = scene.create_node();
        scene.create_arrow(a, GEOMETRY);
        scene.create_arrow(a, GEOMETRY);
        scene.create_arrow(b, GEOMETRY);

        scene.destroy_node(a);

        assert_eq!(scene.arrows_under(a), 0);
        assert_eq!(scene.arrows_under(b), 1);
        assert_eq!(scene.is_node_visible(a), None);
    }

    #[test]
    fn test_visibility() {
        let mut scene = HeadlessScene::new();
        let node = scene.create_node();
        assert_eq!(scene.is_node_visible(node), Some(true));
        scene.set_node_visible(node, false);
        assert_eq!(scene.is_node_visible(node), Some(false));
    }

    #[test]
    fn test_geometry_length() {
        assert!((GEOMETRY.total_length() - 1.0).abs() < 1e-6);
    }
}
