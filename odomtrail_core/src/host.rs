//! Minimal [`DisplayHost`] that records what displays report.

use std::collections::HashMap;

use odomtrail_env::{ArrowHandle, DisplayHost, DisplayId};

use crate::properties::Property;

/// Host without a UI: keeps the change log, render requests, and the pick
/// registry so callers can inspect them.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    changes: Vec<(DisplayId, Property)>,
    render_requests: u64,
    picks: HashMap<ArrowHandle, DisplayId>,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Property notifications received so far, oldest first.
    pub fn changes(&self) -> &[(DisplayId, Property)] {
        &self.changes
    }

    /// Takes and clears the change log.
    pub fn take_changes(&mut self) -> Vec<(DisplayId, Property)> {
        std::mem::take(&mut self.changes)
    }

    pub fn render_requests(&self) -> u64 {
        self.render_requests
    }

    /// Resolves a picked arrow to its display.
    pub fn pick(&self, arrow: ArrowHandle) -> Option<DisplayId> {
        self.picks.get(&arrow).copied()
    }

    pub fn registered_picks(&self) -> usize {
        self.picks.len()
    }
}

impl DisplayHost<Property> for HeadlessHost {
    fn property_changed(&mut self, id: DisplayId, property: Property) {
        tracing::debug!(display = %id, %property, "property changed");
        self.changes.push((id, property));
    }

    fn request_render(&mut self) {
        self.render_requests += 1;
    }

    fn register_pick(&mut self, arrow: ArrowHandle, display: DisplayId) {
        self.picks.insert(arrow, display);
    }

    fn release_pick(&mut self, arrow: ArrowHandle) {
        self.picks.remove(&arrow);
    }
}
