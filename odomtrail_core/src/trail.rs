//! Ordered buffer of arrow handles, oldest first.

use std::collections::VecDeque;

use odomtrail_env::ArrowHandle;

/// Arrival-ordered arrow handles of one display.
///
/// The trail only tracks handles. Destroying the visuals is up to the caller,
/// which receives every evicted handle through a callback.
#[derive(Debug, Default)]
pub struct ArrowTrail {
    arrows: VecDeque<ArrowHandle>,
}

impl ArrowTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the newest arrow.
    pub fn push(&mut self, arrow: ArrowHandle) {
        self.arrows.push_back(arrow);
    }

    /// Evicts from the front until at most `keep` arrows remain.
    /// `keep == 0` means unbounded and evicts nothing.
    ///
    /// # Returns
    /// Number of evicted arrows.
    pub fn trim_to(&mut self, keep: usize, mut evict: impl FnMut(ArrowHandle)) -> usize {
        if keep == 0 {
            return 0;
        }
        let mut evicted = 0;
        while self.arrows.len() > keep {
            if let Some(oldest) = self.arrows.pop_front() {
                evict(oldest);
                evicted += 1;
            }
        }
        evicted
    }

    /// Removes every arrow, oldest first.
    pub fn drain_all(&mut self, evict: impl FnMut(ArrowHandle)) {
        self.arrows.drain(..).for_each(evict);
    }

    pub fn iter(&self) -> impl Iterator<Item = ArrowHandle> + '_ {
        self.arrows.iter().copied()
    }

    pub fn newest(&self) -> Option<ArrowHandle> {
        self.arrows.back().copied()
    }

    pub fn len(&self) -> usize {
        self.arrows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrows.is_empty()
    }
}
