//! Message transport abstraction for pose streams.

/// Subscription side of the message bus a display listens on.
///
/// # Implementations
///
/// - **Host**: wraps the middleware subscriber (ROS, Zenoh, ...)
/// - **Replay / tests**: [`crate::LoopbackTransport`]
///
/// Delivery is not part of this trait: the host pulls messages from its
/// subscriber and hands them to the display. Subscribing is assumed to
/// succeed; failures there belong to the transport.
pub trait PoseTransport {
    /// Subscribes to `topic`, keeping at most `queue_depth` undelivered
    /// messages. Replaces any existing subscription.
    fn subscribe(&mut self, topic: &str, queue_depth: usize);

    /// Drops the current subscription, if any, and discards pending messages.
    fn unsubscribe(&mut self);

    /// Returns the topic currently subscribed to.
    fn subscribed_topic(&self) -> Option<&str>;
}

impl<T: PoseTransport + ?Sized> PoseTransport for &mut T {
    fn subscribe(&mut self, topic: &str, queue_depth: usize) {
        (**self).subscribe(topic, queue_depth)
    }

    fn unsubscribe(&mut self) {
        (**self).unsubscribe()
    }

    fn subscribed_topic(&self) -> Option<&str> {
        (**self).subscribed_topic()
    }
}
