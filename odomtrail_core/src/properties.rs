//! Property surface exposed to the host's editing UI.
//!
//! Instead of registering getter/setter closures with a generic property
//! manager, the display publishes a fixed list of [`PropertyDescriptor`]s and
//! answers typed get/set requests keyed by [`Property`].

use odomtrail_env::ColorRgb;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AngleMetric;

/// Message type the topic selector should offer.
pub const POSE_STREAM_MESSAGE_TYPE: &str = "nav_msgs/Odometry";

/// Editable properties of an odometry trail display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Property {
    Color,
    Topic,
    PositionTolerance,
    AngleTolerance,
    Keep,
    AngleMetric,
}

impl Property {
    /// Every property, in UI order.
    pub fn all() -> [Property; 6] {
        [
            Property::Color,
            Property::Topic,
            Property::PositionTolerance,
            Property::AngleTolerance,
            Property::Keep,
            Property::AngleMetric,
        ]
    }

    /// Label shown by the host.
    pub fn label(&self) -> &'static str {
        match self {
            Property::Color => "Color",
            Property::Topic => "Topic",
            Property::PositionTolerance => "Position Tolerance",
            Property::AngleTolerance => "Angle Tolerance",
            Property::Keep => "Keep",
            Property::AngleMetric => "Angle Metric",
        }
    }

    /// Kind of editor the host should bind.
    pub fn kind(&self) -> PropertyKind {
        match self {
            Property::Color => PropertyKind::Color,
            Property::Topic => PropertyKind::Topic {
                message_type: POSE_STREAM_MESSAGE_TYPE,
            },
            Property::PositionTolerance | Property::AngleTolerance => PropertyKind::Float,
            Property::Keep => PropertyKind::Int,
            Property::AngleMetric => PropertyKind::Choice {
                options: &["component_difference", "geodesic"],
            },
        }
    }

    pub fn descriptor(&self) -> PropertyDescriptor {
        PropertyDescriptor {
            property: *self,
            label: self.label(),
            kind: self.kind(),
        }
    }
}

impl std::fmt::Display for Property {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Editor kind for a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Color,

    /// Topic name, restricted to topics carrying `message_type`
    Topic { message_type: &'static str },

    Float,
    Int,

    /// One of a fixed set of names
    Choice { options: &'static [&'static str] },
}

/// Static description of one property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyDescriptor {
    pub property: Property,
    pub label: &'static str,
    pub kind: PropertyKind,
}

/// A property value as exchanged with the host UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Color(ColorRgb),
    Topic(String),
    Float(f32),
    Int(u32),
    Metric(AngleMetric),
}

impl PropertyValue {
    /// Name of the value's kind, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            PropertyValue::Color(_) => "color",
            PropertyValue::Topic(_) => "topic",
            PropertyValue::Float(_) => "float",
            PropertyValue::Int(_) => "int",
            PropertyValue::Metric(_) => "angle metric",
        }
    }
}

/// Errors from the property surface.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropertyError {
    #[error("Property '{property}' does not accept a {found} value")]
    TypeMismatch {
        property: Property,
        found: &'static str,
    },
}
