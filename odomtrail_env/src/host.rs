//! Host services a display reports back to.

use crate::types::{ArrowHandle, DisplayId};

/// Callbacks into the visualization host.
///
/// `P` is the display's property identifier; the host's property UI uses it
/// to refresh the matching editor.
pub trait DisplayHost<P> {
    /// A configuration value of `display` changed.
    fn property_changed(&mut self, display: DisplayId, property: P);

    /// The scene needs to be redrawn.
    fn request_render(&mut self);

    /// Associates a rendered arrow with the display that owns it, so picking
    /// the arrow can select the display.
    fn register_pick(&mut self, arrow: ArrowHandle, display: DisplayId);

    /// Forgets the association of a destroyed arrow.
    fn release_pick(&mut self, arrow: ArrowHandle);
}

impl<P, H: DisplayHost<P> + ?Sized> DisplayHost<P> for &mut H {
    fn property_changed(&mut self, display: DisplayId, property: P) {
        (**self).property_changed(display, property)
    }

    fn request_render(&mut self) {
        (**self).request_render()
    }

    fn register_pick(&mut self, arrow: ArrowHandle, display: DisplayId) {
        (**self).register_pick(arrow, display)
    }

    fn release_pick(&mut self, arrow: ArrowHandle) {
        (**self).release_pick(arrow)
    }
}
