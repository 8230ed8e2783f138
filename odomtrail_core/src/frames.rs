//! Static frame tree: a minimal [`TransformService`].
//!
//! Frames form a forest of parent → child links, each carrying the child's
//! pose in its parent. Looking up `source → target` walks both frames up to
//! their roots and composes the two chains. Transforms are time-invariant, so
//! stamps are passed through untouched.

use std::collections::HashMap;

use nalgebra::Isometry3;
use odomtrail_env::{StampedPose, TransformError, TransformService};

/// Longest parent chain followed before giving up (guards against cycles).
const MAX_CHAIN_DEPTH: usize = 256;

#[derive(Debug, Clone)]
struct FrameLink {
    parent: String,
    parent_from_child: Isometry3<f64>,
}

/// Static transform forest.
#[derive(Debug, Clone, Default)]
pub struct FrameTree {
    links: HashMap<String, FrameLink>,
}

impl FrameTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the link `parent → child`.
    ///
    /// # Arguments
    /// * `parent_from_child` - Pose of `child` expressed in `parent`
    pub fn set_transform(
        &mut self,
        parent: impl Into<String>,
        child: impl Into<String>,
        parent_from_child: Isometry3<f64>,
    ) {
        self.links.insert(
            child.into(),
            FrameLink {
                parent: parent.into(),
                parent_from_child,
            },
        );
    }

    /// Removes the link that has `child` as its child frame.
    pub fn remove_frame(&mut self, child: &str) -> bool {
        self.links.remove(child).is_some()
    }

    /// Whether `frame` appears anywhere in the tree.
    pub fn has_frame(&self, frame: &str) -> bool {
        self.links.contains_key(frame) || self.links.values().any(|link| link.parent == frame)
    }

    /// All frames mentioned by the tree, sorted.
    pub fn frames(&self) -> Vec<String> {
        let mut frames: Vec<String> = self
            .links
            .iter()
            .flat_map(|(child, link)| [child.clone(), link.parent.clone()])
            .collect();
        frames.sort();
        frames.dedup();
        frames
    }

    /// Resolves the pose of `frame` relative to its root.
    ///
    /// # Returns
    /// `(root, root_from_frame)`
    fn resolve_to_root(&self, frame: &str) -> Result<(String, Isometry3<f64>), TransformError> {
        if !self.has_frame(frame) {
            return Err(TransformError::unknown(frame));
        }

        let mut current = frame;
        let mut root_from_frame = Isometry3::identity();
        for _ in 0..MAX_CHAIN_DEPTH {
            match self.links.get(current) {
                Some(link) => {
                    root_from_frame = link.parent_from_child * root_from_frame;
                    current = &link.parent;
                }
                None => return Ok((current.to_owned(), root_from_frame)),
            }
        }

        Err(TransformError::Lookup(format!(
            "frame chain from '{frame}' exceeds {MAX_CHAIN_DEPTH} links (cycle?)"
        )))
    }

    /// Transform taking points in `source` to `target`.
    pub fn lookup(&self, target: &str, source: &str) -> Result<Isometry3<f64>, TransformError> {
        if target == source {
            return Ok(Isometry3::identity());
        }

        let (target_root, root_from_target) = self.resolve_to_root(target)?;
        let (source_root, root_from_source) = self.resolve_to_root(source)?;

        if target_root != source_root {
            return Err(TransformError::disconnected(source, target));
        }

        Ok(root_from_target.inverse() * root_from_source)
    }
}

impl TransformService for FrameTree {
    fn transform_pose(
        &self,
        target_frame: &str,
        pose: &StampedPose,
    ) -> Result<StampedPose, TransformError> {
        let target_from_source = self.lookup(target_frame, &pose.frame_id)?;
        Ok(StampedPose::new(
            target_frame,
            pose.stamp,
            target_from_source * pose.transform,
        ))
    }
}
