//! The odometry trail display.
//!
//! Turns a stream of odometry messages into a bounded trail of arrows in the
//! fixed frame:
//!
//! ```text
//! transport ──► on_message ──► motion filter ──► transform to fixed frame
//!                                                        │
//!            host ◄── pick / render ◄── renderer ◄── create arrow
//!                                                        │
//!                            tick ──► trim trail to `keep`
//! ```
//!
//! The display is driven entirely by its host: messages, setters and ticks
//! are synchronous `&mut self` calls. There is no internal threading.

use nalgebra::{UnitQuaternion, Vector3};
use odomtrail_env::{
    ArrowGeometry, ArrowHandle, ColorRgb, DisplayHost, DisplayId, NodeHandle, OdometryMessage,
    Pose, PoseTransport, SceneRenderer, StampedPose, TransformError, TransformService,
};
use tracing::{debug, error};

use crate::config::{AngleMetric, DisplayConfig};
use crate::convention::SceneConvention;
use crate::filter::MotionFilter;
use crate::properties::{Property, PropertyDescriptor, PropertyError, PropertyValue};
use crate::trail::ArrowTrail;

/// Queue depth requested when subscribing.
pub const SUBSCRIBE_QUEUE_DEPTH: usize = 5;

/// Fixed arrow proportions.
pub const ARROW_GEOMETRY: ArrowGeometry = ArrowGeometry {
    shaft_length: 0.8,
    shaft_diameter: 0.05,
    head_length: 0.2,
    head_diameter: 0.2,
};

/// What happened to an incoming message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    /// A new arrow was added to the trail
    Accepted(ArrowHandle),

    /// Too close to the last accepted pose; dropped
    Filtered,

    /// The pose could not be expressed in the fixed frame; dropped
    TransformFailed,
}

/// Running counters since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayStats {
    pub accepted: u64,
    pub filtered: u64,
    pub transform_failures: u64,
    pub evicted: u64,
}

/// Collaborators a display is wired to.
#[derive(Debug)]
pub struct DisplayServices<S, T, R, H> {
    pub transport: S,
    pub transforms: T,
    pub renderer: R,
    pub host: H,
}

/// Live trail of odometry arrows.
///
/// Starts disabled with its scene node hidden. Dropping the display
/// unsubscribes and destroys every arrow and its scene node.
pub struct OdometryDisplay<S, T, R, H>
where
    S: PoseTransport,
    T: TransformService,
    R: SceneRenderer,
    H: DisplayHost<Property>,
{
    id: DisplayId,
    name: String,
    config: DisplayConfig,
    fixed_frame: String,
    convention: SceneConvention,
    enabled: bool,
    node: NodeHandle,
    trail: ArrowTrail,
    last_accepted: Option<Pose>,
    stats: DisplayStats,

    transport: S,
    transforms: T,
    renderer: R,
    host: H,
}

impl<S, T, R, H> OdometryDisplay<S, T, R, H>
where
    S: PoseTransport,
    T: TransformService,
    R: SceneRenderer,
    H: DisplayHost<Property>,
{
    /// Creates a disabled display.
    ///
    /// # Arguments
    /// * `name` - Display name, used in log messages
    /// * `fixed_frame` - Frame every arrow is expressed in
    /// * `config` - Initial configuration (applied silently)
    /// * `services` - Transport, transform service, renderer and host
    pub fn new(
        name: impl Into<String>,
        fixed_frame: impl Into<String>,
        config: DisplayConfig,
        services: DisplayServices<S, T, R, H>,
    ) -> Self {
        let DisplayServices {
            transport,
            transforms,
            mut renderer,
            host,
        } = services;

        let node = renderer.create_node();
        renderer.set_node_visible(node, false);

        Self {
            id: DisplayId::new(),
            name: name.into(),
            config,
            fixed_frame: fixed_frame.into(),
            convention: SceneConvention::default(),
            enabled: false,
            node,
            trail: ArrowTrail::new(),
            last_accepted: None,
            stats: DisplayStats::default(),
            transport,
            transforms,
            renderer,
            host,
        }
    }

    /// Uses `convention` when handing arrows to the renderer.
    pub fn with_convention(mut self, convention: SceneConvention) -> Self {
        self.convention = convention;
        self
    }

    // ========================================================================
    // CONFIGURATION SETTERS
    // ========================================================================

    /// Moves the subscription to `topic`.
    pub fn set_topic(&mut self, topic: impl Into<String>) {
        self.unsubscribe();
        self.config.topic = topic.into();
        self.subscribe();

        self.notify(Property::Topic);
        self.host.request_render();
    }

    /// Changes the arrow color, recoloring the existing trail.
    pub fn set_color(&mut self, color: ColorRgb) {
        self.config.color = color;

        for arrow in self.trail.iter() {
            self.renderer.set_arrow_color(arrow, color.opaque());
        }

        self.notify(Property::Color);
        self.host.request_render();
    }

    /// Changes the capacity. The trail is trimmed on the next [`Self::tick`].
    pub fn set_keep(&mut self, keep: u32) {
        self.config.keep = keep;
        self.notify(Property::Keep);
    }

    pub fn set_position_tolerance(&mut self, tolerance: f32) {
        self.config.position_tolerance = tolerance;
        self.notify(Property::PositionTolerance);
    }

    pub fn set_angle_tolerance(&mut self, tolerance: f32) {
        self.config.angle_tolerance = tolerance;
        self.notify(Property::AngleTolerance);
    }

    pub fn set_angle_metric(&mut self, metric: AngleMetric) {
        self.config.angle_metric = metric;
        self.notify(Property::AngleMetric);
    }

    /// Applies every field of `config` that differs from the current one,
    /// through the regular setters.
    pub fn apply_config(&mut self, config: DisplayConfig) {
        if config.topic != self.config.topic {
            self.set_topic(config.topic);
        }
        if config.color != self.config.color {
            self.set_color(config.color);
        }
        if config.keep != self.config.keep {
            self.set_keep(config.keep);
        }
        if config.position_tolerance != self.config.position_tolerance {
            self.set_position_tolerance(config.position_tolerance);
        }
        if config.angle_tolerance != self.config.angle_tolerance {
            self.set_angle_tolerance(config.angle_tolerance);
        }
        if config.angle_metric != self.config.angle_metric {
            self.set_angle_metric(config.angle_metric);
        }
    }

    // ========================================================================
    // PROPERTY SURFACE
    // ========================================================================

    pub fn descriptors(&self) -> [PropertyDescriptor; 6] {
        Property::all().map(|p| p.descriptor())
    }

    /// Current value of `property`.
    pub fn property(&self, property: Property) -> PropertyValue {
        match property {
            Property::Color => PropertyValue::Color(self.config.color),
            Property::Topic => PropertyValue::Topic(self.config.topic.clone()),
            Property::PositionTolerance => PropertyValue::Float(self.config.position_tolerance),
            Property::AngleTolerance => PropertyValue::Float(self.config.angle_tolerance),
            Property::Keep => PropertyValue::Int(self.config.keep),
            Property::AngleMetric => PropertyValue::Metric(self.config.angle_metric),
        }
    }

    /// Sets `property` from a UI value, dispatching to the typed setter.
    pub fn set_property(
        &mut self,
        property: Property,
        value: PropertyValue,
    ) -> Result<(), PropertyError> {
        match (property, value) {
            (Property::Color, PropertyValue::Color(color)) => self.set_color(color),
            (Property::Topic, PropertyValue::Topic(topic)) => self.set_topic(topic),
            (Property::PositionTolerance, PropertyValue::Float(v)) => {
                self.set_position_tolerance(v)
            }
            (Property::AngleTolerance, PropertyValue::Float(v)) => self.set_angle_tolerance(v),
            (Property::Keep, PropertyValue::Int(keep)) => self.set_keep(keep),
            (Property::AngleMetric, PropertyValue::Metric(metric)) => self.set_angle_metric(metric),
            (property, value) => {
                return Err(PropertyError::TypeMismatch {
                    property,
                    found: value.kind_name(),
                })
            }
        }
        Ok(())
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Shows the trail and subscribes to the configured topic.
    pub fn enable(&mut self) {
        if self.enabled {
            return;
        }
        self.enabled = true;
        debug!(display = %self.name, topic = %self.config.topic, "enabled");

        self.renderer.set_node_visible(self.node, true);
        self.subscribe();
    }

    /// Unsubscribes, drops the trail and hides the scene node.
    pub fn disable(&mut self) {
        if !self.enabled {
            return;
        }
        self.enabled = false;
        debug!(display = %self.name, "disabled");

        self.unsubscribe();
        self.clear();
        self.renderer.set_node_visible(self.node, false);
    }

    /// The host's fixed frame changed. Arrows expressed in the old frame
    /// cannot be re-expressed, so the trail is dropped.
    pub fn on_fixed_frame_changed(&mut self, fixed_frame: impl Into<String>) {
        self.fixed_frame = fixed_frame.into();
        debug!(display = %self.name, fixed_frame = %self.fixed_frame, "fixed frame changed");
        self.clear();
    }

    /// Full state reset requested by the host (e.g. log playback restarted).
    pub fn reset(&mut self) {
        self.clear();
    }

    /// Periodic update: trims the trail down to `keep` arrows.
    pub fn tick(&mut self) {
        let keep = self.config.keep as usize;
        let renderer = &mut self.renderer;
        let host = &mut self.host;
        let evicted = self.trail.trim_to(keep, |arrow| {
            renderer.destroy_arrow(arrow);
            host.release_pick(arrow);
        });
        self.stats.evicted += evicted as u64;
    }

    /// Destroys every arrow and forgets the last accepted pose.
    pub fn clear(&mut self) {
        let renderer = &mut self.renderer;
        let host = &mut self.host;
        self.trail.drain_all(|arrow| {
            renderer.destroy_arrow(arrow);
            host.release_pick(arrow);
        });
        self.last_accepted = None;
    }

    // ========================================================================
    // MESSAGE HANDLING
    // ========================================================================

    /// Handles one incoming odometry message. Always requests a render.
    pub fn on_message(&mut self, message: &OdometryMessage) -> MessageOutcome {
        let outcome = self.process_message(message);
        self.host.request_render();
        outcome
    }

    fn process_message(&mut self, message: &OdometryMessage) -> MessageOutcome {
        if let Some(last) = &self.last_accepted {
            if self.motion_filter().is_redundant(last, &message.pose) {
                self.stats.filtered += 1;
                return MessageOutcome::Filtered;
            }
        }

        let (position, orientation) = match self.transform_to_fixed(message) {
            Ok(pose) => self.convention.pose_to_scene(&pose.transform),
            Err(e) => {
                error!(
                    display = %self.name,
                    source_frame = %self.source_frame(message),
                    target_frame = %self.fixed_frame,
                    "Error transforming odometry pose: {}", e
                );
                self.stats.transform_failures += 1;
                return MessageOutcome::TransformFailed;
            }
        };

        let arrow = self.spawn_arrow(position, orientation);
        self.trail.push(arrow);
        self.last_accepted = Some(message.pose);
        self.stats.accepted += 1;

        MessageOutcome::Accepted(arrow)
    }

    /// Frame the message's pose is expressed in; an empty frame id means the
    /// fixed frame.
    fn source_frame<'a>(&'a self, message: &'a OdometryMessage) -> &'a str {
        if message.header.frame_id.is_empty() {
            &self.fixed_frame
        } else {
            &message.header.frame_id
        }
    }

    fn transform_to_fixed(&self, message: &OdometryMessage) -> Result<StampedPose, TransformError> {
        let pose = StampedPose::new(
            self.source_frame(message),
            message.header.stamp,
            message.pose.to_isometry(),
        );
        self.transforms.transform_pose(&self.fixed_frame, &pose)
    }

    fn spawn_arrow(
        &mut self,
        position: Vector3<f32>,
        orientation: UnitQuaternion<f32>,
    ) -> ArrowHandle {
        let arrow = self.renderer.create_arrow(self.node, ARROW_GEOMETRY);
        self.renderer.set_arrow_position(arrow, position);
        self.renderer.set_arrow_orientation(arrow, orientation);
        self.renderer.set_arrow_color(arrow, self.config.color.opaque());
        self.host.register_pick(arrow, self.id);
        arrow
    }

    fn motion_filter(&self) -> MotionFilter {
        MotionFilter::new(
            self.config.position_tolerance,
            self.config.angle_tolerance,
            self.config.angle_metric,
        )
    }

    fn subscribe(&mut self) {
        if !self.enabled {
            return;
        }
        self.transport
            .subscribe(&self.config.topic, SUBSCRIBE_QUEUE_DEPTH);
    }

    fn unsubscribe(&mut self) {
        self.transport.unsubscribe();
    }

    fn notify(&mut self, property: Property) {
        self.host.property_changed(self.id, property);
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn id(&self) -> DisplayId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    pub fn fixed_frame(&self) -> &str {
        &self.fixed_frame
    }

    pub fn convention(&self) -> SceneConvention {
        self.convention
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn node(&self) -> NodeHandle {
        self.node
    }

    /// Arrows currently in the trail, oldest first.
    pub fn arrows(&self) -> impl Iterator<Item = ArrowHandle> + '_ {
        self.trail.iter()
    }

    pub fn arrow_count(&self) -> usize {
        self.trail.len()
    }

    pub fn last_accepted_pose(&self) -> Option<&Pose> {
        self.last_accepted.as_ref()
    }

    pub fn stats(&self) -> DisplayStats {
        self.stats
    }

    pub fn transport(&self) -> &S {
        &self.transport
    }

    /// Mutable transport access, for hosts that pull messages from it.
    pub fn transport_mut(&mut self) -> &mut S {
        &mut self.transport
    }

    pub fn transforms(&self) -> &T {
        &self.transforms
    }

    pub fn transforms_mut(&mut self) -> &mut T {
        &mut self.transforms
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn host(&self) -> &H {
        &self.host
    }
}

impl<S, T, R, H> Drop for OdometryDisplay<S, T, R, H>
where
    S: PoseTransport,
    T: TransformService,
    R: SceneRenderer,
    H: DisplayHost<Property>,
{
    fn drop(&mut self) {
        self.unsubscribe();
        self.clear();
        self.renderer.destroy_node(self.node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::FrameTree;
    use crate::host::HeadlessHost;
    use crate::scene::HeadlessScene;
    use approx::assert_relative_eq;
    use nalgebra::Isometry3;
    use odomtrail_env::{LoopbackBus, LoopbackTransport, Stamp};
    use proptest::prelude::*;

    use std::sync::{Arc, Mutex};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    type TestDisplay = OdometryDisplay<LoopbackTransport, FrameTree, HeadlessScene, HeadlessHost>;

    /// Records the level of every event emitted while installed.
    #[derive(Clone, Default)]
    struct LevelLog(Arc<Mutex<Vec<Level>>>);

    impl LevelLog {
        fn count(&self, level: Level) -> usize {
            self.0.lock().unwrap().iter().filter(|l| **l == level).count()
        }
    }

    impl<S: Subscriber> Layer<S> for LevelLog {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            self.0.lock().unwrap().push(*event.metadata().level());
        }
    }

    const TOPIC: &str = "/odom";

    fn frames() -> FrameTree {
        let mut tree = FrameTree::new();
        tree.set_transform("map", "odom", Isometry3::translation(10.0, 0.0, 0.0));
        tree
    }

    fn display_with(config: DisplayConfig) -> (LoopbackBus, TestDisplay) {
        let bus = LoopbackBus::new();
        let display = OdometryDisplay::new(
            "Odometry",
            "odom",
            config,
            DisplayServices {
                transport: bus.transport(),
                transforms: frames(),
                renderer: HeadlessScene::new(),
                host: HeadlessHost::new(),
            },
        );
        (bus, display)
    }

    fn display() -> (LoopbackBus, TestDisplay) {
        display_with(DisplayConfig::default().with_topic(TOPIC))
    }

    fn odom_at(x: f64) -> OdometryMessage {
        OdometryMessage::new("odom", Stamp::default(), Pose::from_position(x, 0.0, 0.0))
    }

    #[test]
    fn test_starts_disabled_and_hidden() {
        let (bus, display) = display();
        assert!(!display.is_enabled());
        assert_eq!(display.renderer().is_node_visible(display.node()), Some(false));
        assert_eq!(bus.subscriber_count(TOPIC), 0);
        assert_eq!(display.arrow_count(), 0);
        assert!(display.last_accepted_pose().is_none());
    }

    #[test]
    fn test_enable_subscribes_and_shows() {
        let (bus, mut display) = display();
        display.enable();

        assert!(display.is_enabled());
        assert_eq!(display.transport().subscribed_topic(), Some(TOPIC));
        assert_eq!(bus.subscriber_count(TOPIC), 1);
        assert_eq!(display.renderer().is_node_visible(display.node()), Some(true));
    }

    #[test]
    fn test_disable_unsubscribes_clears_hides() {
        let (bus, mut display) = display();
        display.enable();
        display.on_message(&odom_at(0.0));
        display.on_message(&odom_at(1.0));

        display.disable();

        assert_eq!(bus.subscriber_count(TOPIC), 0);
        assert_eq!(display.arrow_count(), 0);
        assert_eq!(display.renderer().arrow_count(), 0);
        assert!(display.last_accepted_pose().is_none());
        assert_eq!(display.renderer().is_node_visible(display.node()), Some(false));
    }

    #[test]
    fn test_disable_enable_equals_clear_then_subscribe() {
        let (bus, mut display) = display();
        display.enable();
        display.on_message(&odom_at(0.0));

        display.disable();
        display.enable();

        assert_eq!(display.arrow_count(), 0);
        assert!(display.last_accepted_pose().is_none());
        assert_eq!(bus.subscriber_count(TOPIC), 1);

        // First message after re-enabling is never filtered.
        assert!(matches!(display.on_message(&odom_at(0.0)), MessageOutcome::Accepted(_)));
    }

    #[test]
    fn test_tolerance_scenario() {
        let (_bus, mut display) =
            display_with(DisplayConfig::default().with_topic(TOPIC).with_tolerances(0.1, 0.1));
        display.enable();

        let a = odom_at(0.0);
        assert!(matches!(display.on_message(&a), MessageOutcome::Accepted(_)));
        assert_eq!(display.arrow_count(), 1);

        let b = odom_at(0.05);
        assert_eq!(display.on_message(&b), MessageOutcome::Filtered);
        assert_eq!(display.arrow_count(), 1);
        assert_eq!(display.last_accepted_pose(), Some(&a.pose));

        let c = odom_at(0.5);
        assert!(matches!(display.on_message(&c), MessageOutcome::Accepted(_)));
        assert_eq!(display.arrow_count(), 2);
        assert_eq!(display.last_accepted_pose(), Some(&c.pose));
    }

    #[test]
    fn test_keep_scenario() {
        let (_bus, mut display) = display_with(DisplayConfig::default().with_topic(TOPIC).with_keep(3));
        display.enable();

        let mut accepted = Vec::new();
        for i in 0..5 {
            match display.on_message(&odom_at(i as f64)) {
                MessageOutcome::Accepted(arrow) => accepted.push(arrow),
                other => panic!("unexpected outcome {other:?}"),
            }
        }
        assert_eq!(display.arrow_count(), 5);

        display.tick();

        let kept: Vec<_> = display.arrows().collect();
        assert_eq!(kept, accepted[2..].to_vec());
        assert_eq!(display.renderer().arrow_count(), 3);
        assert!(display.renderer().arrow(accepted[0]).is_none());
        assert_eq!(display.host().pick(accepted[0]), None);
        assert_eq!(display.stats().evicted, 2);
    }

    #[test]
    fn test_keep_zero_is_unbounded() {
        let (_bus, mut display) = display_with(DisplayConfig::default().with_topic(TOPIC).with_keep(0));
        display.enable();
        for i in 0..250 {
            display.on_message(&odom_at(i as f64));
            display.tick();
        }
        assert_eq!(display.arrow_count(), 250);
    }

    #[test]
    fn test_set_keep_trims_on_next_tick() {
        let (_bus, mut display) = display();
        display.enable();
        for i in 0..4 {
            display.on_message(&odom_at(i as f64));
        }

        display.set_keep(1);
        assert_eq!(display.arrow_count(), 4);

        display.tick();
        assert_eq!(display.arrow_count(), 1);
    }

    #[test]
    fn test_transform_failure_leaves_state_unchanged() {
        let log = LevelLog::default();
        let subscriber = tracing_subscriber::registry().with(log.clone());

        tracing::subscriber::with_default(subscriber, || {
            let (_bus, mut display) = display();
            display.enable();
            let a = odom_at(0.0);
            display.on_message(&a);
            let renders = display.host().render_requests();
            assert_eq!(log.count(Level::ERROR), 0);

            let d = OdometryMessage::new("laser", Stamp::default(), Pose::from_position(5.0, 0.0, 0.0));
            assert_eq!(display.on_message(&d), MessageOutcome::TransformFailed);

            assert_eq!(log.count(Level::ERROR), 1);
            assert_eq!(display.arrow_count(), 1);
            assert_eq!(display.last_accepted_pose(), Some(&a.pose));
            assert_eq!(display.stats().transform_failures, 1);
            assert_eq!(display.host().render_requests(), renders + 1);
        });
    }

    #[test]
    fn test_frame_added_at_runtime_is_used() {
        let (_bus, mut display) = display();
        display.enable();

        let msg = OdometryMessage::new("laser", Stamp::default(), Pose::from_position(1.0, 0.0, 0.0));
        assert_eq!(display.on_message(&msg), MessageOutcome::TransformFailed);

        display
            .transforms_mut()
            .set_transform("odom", "laser", Isometry3::translation(0.0, 2.0, 0.0));

        let MessageOutcome::Accepted(arrow) = display.on_message(&msg) else {
            panic!("laser frame should resolve once linked");
        };
        let state = display.renderer().arrow(arrow).unwrap();
        assert_relative_eq!(state.position.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(state.position.y, 2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_empty_frame_means_fixed_frame() {
        let (_bus, mut display) = display();
        display.enable();

        let msg = OdometryMessage::new("", Stamp::default(), Pose::from_position(1.0, 2.0, 3.0));
        let MessageOutcome::Accepted(arrow) = display.on_message(&msg) else {
            panic!("message in the fixed frame should be accepted");
        };

        let state = display.renderer().arrow(arrow).unwrap();
        assert_eq!(state.position, Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_arrow_is_transformed_into_fixed_frame() {
        let (_bus, mut display) = display();
        display.enable();
        display.on_fixed_frame_changed("map");

        let MessageOutcome::Accepted(arrow) = display.on_message(&odom_at(1.0)) else {
            panic!("odom -> map is resolvable");
        };
        let state = display.renderer().arrow(arrow).unwrap();
        assert_relative_eq!(state.position, Vector3::new(11.0f32, 0.0, 0.0));
        assert_eq!(state.geometry, ARROW_GEOMETRY);
        assert_eq!(state.color, DisplayConfig::default().color.opaque());
    }

    #[test]
    fn test_yup_convention_is_applied() {
        let (_bus, display) = display();
        let mut display = display.with_convention(SceneConvention::YUp);
        display.enable();

        let msg = OdometryMessage::new("odom", Stamp::default(), Pose::from_position(1.0, 2.0, 3.0));
        let MessageOutcome::Accepted(arrow) = display.on_message(&msg) else {
            panic!("expected an arrow");
        };
        assert_eq!(
            display.renderer().arrow(arrow).unwrap().position,
            Vector3::new(-2.0f32, 3.0, -1.0)
        );
    }

    #[test]
    fn test_fixed_frame_change_clears() {
        let (_bus, mut display) = display();
        display.enable();
        for i in 0..3 {
            display.on_message(&odom_at(i as f64));
        }

        display.on_fixed_frame_changed("map");

        assert_eq!(display.fixed_frame(), "map");
        assert_eq!(display.arrow_count(), 0);
        assert_eq!(display.renderer().arrow_count(), 0);
        assert!(display.last_accepted_pose().is_none());
    }

    #[test]
    fn test_reset_clears() {
        let (_bus, mut display) = display();
        display.enable();
        display.on_message(&odom_at(0.0));
        display.reset();
        assert_eq!(display.arrow_count(), 0);
        assert!(display.is_enabled());
    }

    #[test]
    fn test_set_color_recolors_trail() {
        let (_bus, mut display) = display();
        display.enable();
        display.on_message(&odom_at(0.0));
        display.on_message(&odom_at(1.0));
        let renders = display.host().render_requests();

        let blue = ColorRgb::new(0.0, 0.0, 1.0);
        display.set_color(blue);

        for arrow in display.arrows() {
            assert_eq!(display.renderer().arrow(arrow).unwrap().color, blue.opaque());
        }
        assert_eq!(display.host().changes().last(), Some(&(display.id(), Property::Color)));
        assert_eq!(display.host().render_requests(), renders + 1);
    }

    #[test]
    fn test_set_topic_while_enabled_resubscribes() {
        let (bus, mut display) = display();
        display.enable();

        display.set_topic("/wheel_odom");

        assert_eq!(bus.subscriber_count(TOPIC), 0);
        assert_eq!(bus.subscriber_count("/wheel_odom"), 1);
        assert_eq!(display.host().changes(), &[(display.id(), Property::Topic)]);
    }

    #[test]
    fn test_set_topic_while_disabled_only_stores() {
        let (bus, mut display) = display();
        display.set_topic("/wheel_odom");

        assert_eq!(display.config().topic, "/wheel_odom");
        assert_eq!(bus.subscriber_count("/wheel_odom"), 0);

        display.enable();
        assert_eq!(bus.subscriber_count("/wheel_odom"), 1);
    }

    #[test]
    fn test_setters_notify() {
        let (_bus, mut display) = display();
        display.set_keep(7);
        display.set_position_tolerance(0.5);
        display.set_angle_tolerance(0.25);
        display.set_angle_metric(AngleMetric::Geodesic);

        let changed: Vec<Property> = display.host().changes().iter().map(|(_, p)| *p).collect();
        assert_eq!(
            changed,
            vec![
                Property::Keep,
                Property::PositionTolerance,
                Property::AngleTolerance,
                Property::AngleMetric
            ]
        );
        assert_eq!(display.config().keep, 7);
        assert_eq!(display.config().angle_metric, AngleMetric::Geodesic);
    }

    #[test]
    fn test_property_surface() {
        let (_bus, mut display) = display();

        display
            .set_property(Property::Keep, PropertyValue::Int(12))
            .unwrap();
        assert_eq!(display.property(Property::Keep), PropertyValue::Int(12));

        let err = display
            .set_property(Property::Keep, PropertyValue::Float(1.5))
            .unwrap_err();
        assert_eq!(
            err,
            PropertyError::TypeMismatch {
                property: Property::Keep,
                found: "float"
            }
        );
        assert_eq!(display.config().keep, 12);

        assert_eq!(display.descriptors().len(), 6);
        assert_eq!(display.property(Property::Topic), PropertyValue::Topic(TOPIC.to_string()));
    }

    #[test]
    fn test_apply_config_only_touches_changes() {
        let (_bus, mut display) = display();
        let config = display.config().clone().with_keep(5);

        display.apply_config(config);

        assert_eq!(display.host().changes(), &[(display.id(), Property::Keep)]);
    }

    #[test]
    fn test_pick_association() {
        let (_bus, mut display) = display();
        display.enable();
        let MessageOutcome::Accepted(arrow) = display.on_message(&odom_at(0.0)) else {
            panic!("expected an arrow");
        };
        assert_eq!(display.host().pick(arrow), Some(display.id()));

        display.clear();
        assert_eq!(display.host().pick(arrow), None);
    }

    #[test]
    fn test_every_message_requests_render() {
        let (_bus, mut display) = display();
        display.enable();
        display.on_message(&odom_at(0.0));
        display.on_message(&odom_at(0.0));
        assert_eq!(display.host().render_requests(), 2);
        assert_eq!(display.stats().filtered, 1);
    }

    #[test]
    fn test_drop_tears_down() {
        let bus = LoopbackBus::new();
        let mut scene = HeadlessScene::new();
        let mut host = HeadlessHost::new();
        {
            let mut display = OdometryDisplay::new(
                "Odometry",
                "odom",
                DisplayConfig::default().with_topic(TOPIC),
                DisplayServices {
                    transport: bus.transport(),
                    transforms: frames(),
                    renderer: &mut scene,
                    host: &mut host,
                },
            );
            display.enable();
            display.on_message(&odom_at(0.0));
            display.on_message(&odom_at(1.0));
        }

        assert_eq!(bus.subscriber_count(TOPIC), 0);
        assert_eq!(scene.arrow_count(), 0);
        assert_eq!(scene.node_count(), 0);
        assert_eq!(host.registered_picks(), 0);
    }

    #[test]
    fn test_messages_from_bus() {
        let (bus, mut display) = display();
        display.enable();
        for i in 0..3 {
            bus.publish(TOPIC, odom_at(i as f64));
        }

        let messages = display.transport_mut().drain();
        for msg in &messages {
            display.on_message(msg);
        }
        assert_eq!(display.arrow_count(), 3);
    }

    proptest! {
        #[test]
        fn prop_keep_bound_after_tick(
            xs in proptest::collection::vec(-5.0f64..5.0, 0..60),
            keep in 0u32..10,
        ) {
            let (_bus, mut display) = display_with(
                DisplayConfig::default().with_topic(TOPIC).with_keep(keep),
            );
            display.enable();

            for x in xs {
                display.on_message(&odom_at(x));
                display.tick();
                if keep > 0 {
                    prop_assert!(display.arrow_count() <= keep as usize);
                } else {
                    prop_assert_eq!(display.arrow_count() as u64, display.stats().accepted);
                }
            }
            prop_assert_eq!(display.renderer().arrow_count(), display.arrow_count());
        }
    }
}
