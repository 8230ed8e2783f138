//! Synthetic odometry source.
//!
//! The generator plays the role of a robot's odometry node: it follows a
//! closed-form path and publishes noisy estimates at a fixed rate. All noise
//! comes from a single seeded ChaCha8 stream, so a `(shape, seed, rate)`
//! triple always yields the same message sequence.

use std::f64::consts::FRAC_PI_2;

use odomtrail_env::{OdometryMessage, Pose, Stamp};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use crate::error::ReplayError;

/// Frame synthetic odometry is expressed in.
pub const ODOM_FRAME: &str = "odom";

/// Child frame carried by every message.
pub const BASE_FRAME: &str = "base_link";

/// Ground-truth path followed by the robot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathShape {
    /// Counter-clockwise circle around the origin
    Circle { radius: f64, angular_speed: f64 },

    /// Robot parked at the origin; only noise moves
    Stationary,

    /// Lemniscate of Gerono: `x = a·sin(ωt)`, `y = a·sin(ωt)·cos(ωt)`
    FigureEight { scale: f64, angular_speed: f64 },
}

impl PathShape {
    /// Ground-truth `(x, y, yaw)` at time `t`.
    ///
    /// Yaw follows the direction of travel.
    pub fn sample(&self, t: f64) -> (f64, f64, f64) {
        match *self {
            PathShape::Circle {
                radius,
                angular_speed,
            } => {
                let phase = angular_speed * t;
                let heading = phase + FRAC_PI_2.copysign(angular_speed);
                (radius * phase.cos(), radius * phase.sin(), heading)
            }
            PathShape::Stationary => (0.0, 0.0, 0.0),
            PathShape::FigureEight {
                scale,
                angular_speed,
            } => {
                let phase = angular_speed * t;
                let x = scale * phase.sin();
                let y = scale * phase.sin() * phase.cos();
                // d/dt of the two coordinates
                let dx = scale * angular_speed * phase.cos();
                let dy = scale * angular_speed * (2.0 * phase).cos();
                (x, y, dy.atan2(dx))
            }
        }
    }
}

/// Deterministic, noisy odometry stream.
pub struct TrajectoryGenerator {
    shape: PathShape,
    frame_id: String,
    rng: ChaCha8Rng,
    position_noise: Normal<f64>,
    yaw_noise: Normal<f64>,
    period: f64,
    index: u64,
}

impl TrajectoryGenerator {
    /// Creates a noise-free generator.
    ///
    /// # Arguments
    /// * `shape` - Ground-truth path
    /// * `seed` - Seed for the noise stream
    /// * `rate_hz` - Publish rate; must be positive
    pub fn new(shape: PathShape, seed: u64, rate_hz: f64) -> Result<Self, ReplayError> {
        if !(rate_hz.is_finite() && rate_hz > 0.0) {
            return Err(ReplayError::InvalidRate(rate_hz));
        }

        Ok(Self {
            shape,
            frame_id: ODOM_FRAME.to_string(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            position_noise: Normal::new(0.0, 0.0)?,
            yaw_noise: Normal::new(0.0, 0.0)?,
            period: 1.0 / rate_hz,
            index: 0,
        })
    }

    /// Adds zero-mean Gaussian noise to every estimate.
    ///
    /// # Arguments
    /// * `position_std` - Standard deviation on x and y (meters)
    /// * `yaw_std` - Standard deviation on heading (radians)
    pub fn with_noise(mut self, position_std: f64, yaw_std: f64) -> Result<Self, ReplayError> {
        // Normal::new only rejects non-finite deviations
        if !(position_std >= 0.0 && yaw_std >= 0.0) {
            return Err(ReplayError::InvalidNoise(format!(
                "standard deviations must be non-negative, got position {} and yaw {}",
                position_std, yaw_std
            )));
        }
        self.position_noise = Normal::new(0.0, position_std)?;
        self.yaw_noise = Normal::new(0.0, yaw_std)?;
        Ok(self)
    }

    /// Overrides the frame the next messages are stamped in.
    pub fn set_frame(&mut self, frame_id: impl Into<String>) {
        self.frame_id = frame_id.into();
    }

    pub fn frame_id(&self) -> &str {
        &self.frame_id
    }

    pub fn shape(&self) -> PathShape {
        self.shape
    }

    /// Stamp time of the next message, in seconds.
    pub fn time(&self) -> f64 {
        self.index as f64 * self.period
    }

    pub fn period(&self) -> f64 {
        self.period
    }

    /// Produces the next estimate and advances the clock by one period.
    pub fn next_message(&mut self) -> OdometryMessage {
        let t = self.time();
        let (x, y, yaw) = self.shape.sample(t);

        let pose = Pose::from_xy_yaw(
            x + self.position_noise.sample(&mut self.rng),
            y + self.position_noise.sample(&mut self.rng),
            yaw + self.yaw_noise.sample(&mut self.rng),
        );

        let mut msg = OdometryMessage::new(self.frame_id.clone(), Stamp::from_secs_f64(t), pose);
        msg.child_frame_id = BASE_FRAME.to_string();

        self.index += 1;
        msg
    }
}

impl Iterator for TrajectoryGenerator {
    type Item = OdometryMessage;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_circle_starts_on_x_axis_heading_y() {
        let shape = PathShape::Circle {
            radius: 5.0,
            angular_speed: 0.5,
        };
        let (x, y, yaw) = shape.sample(0.0);
        assert_relative_eq!(x, 5.0);
        assert_relative_eq!(y, 0.0);
        assert_relative_eq!(yaw, FRAC_PI_2);
    }

    #[test]
    fn test_circle_stays_on_radius() {
        let shape = PathShape::Circle {
            radius: 3.0,
            angular_speed: 1.3,
        };
        for i in 0..50 {
            let (x, y, _) = shape.sample(i as f64 * 0.37);
            assert_relative_eq!((x * x + y * y).sqrt(), 3.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_figure_eight_crosses_origin() {
        let shape = PathShape::FigureEight {
            scale: 4.0,
            angular_speed: 1.0,
        };
        let (x, y, _) = shape.sample(PI);
        assert_relative_eq!(x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_invalid_rate_rejected() {
        assert!(matches!(
            TrajectoryGenerator::new(PathShape::Stationary, 1, 0.0),
            Err(ReplayError::InvalidRate(_))
        ));
        assert!(TrajectoryGenerator::new(PathShape::Stationary, 1, f64::NAN).is_err());
    }

    #[test]
    fn test_negative_noise_rejected() {
        let gen = TrajectoryGenerator::new(PathShape::Stationary, 1, 10.0).unwrap();
        assert!(matches!(
            gen.with_noise(-1.0, 0.0),
            Err(ReplayError::InvalidNoise(_))
        ));
    }

    #[test]
    fn test_negative_yaw_noise_rejected() {
        let gen = TrajectoryGenerator::new(PathShape::Stationary, 1, 10.0).unwrap();
        assert!(matches!(
            gen.with_noise(0.0, -0.01),
            Err(ReplayError::InvalidNoise(_))
        ));
    }

    #[test]
    fn test_nan_noise_rejected() {
        let gen = TrajectoryGenerator::new(PathShape::Stationary, 1, 10.0).unwrap();
        assert!(matches!(
            gen.with_noise(f64::NAN, 0.0),
            Err(ReplayError::InvalidNoise(_))
        ));
    }

    #[test]
    fn test_stamps_follow_rate() {
        let mut gen = TrajectoryGenerator::new(PathShape::Stationary, 1, 4.0).unwrap();
        let stamps: Vec<f64> = (0..3).map(|_| gen.next_message().header.stamp.as_secs_f64()).collect();
        assert_relative_eq!(stamps[0], 0.0);
        assert_relative_eq!(stamps[1], 0.25, epsilon = 1e-9);
        assert_relative_eq!(stamps[2], 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_same_seed_same_stream() {
        let make = || {
            TrajectoryGenerator::new(PathShape::Stationary, 42, 10.0)
                .unwrap()
                .with_noise(0.2, 0.1)
                .unwrap()
        };
        let a: Vec<_> = make().take(20).collect();
        let b: Vec<_> = make().take(20).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_frame_override() {
        let mut gen = TrajectoryGenerator::new(PathShape::Stationary, 1, 10.0).unwrap();
        assert_eq!(gen.next_message().header.frame_id, ODOM_FRAME);
        gen.set_frame("lost");
        let msg = gen.next_message();
        assert_eq!(msg.header.frame_id, "lost");
        assert_eq!(msg.child_frame_id, BASE_FRAME);
    }
}
