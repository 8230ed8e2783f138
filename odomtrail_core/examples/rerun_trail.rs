//! odomtrail Rerun demo
//!
//! Drives a display around a circle and streams the trail to a Rerun viewer,
//! or to an `.rrd` file when a path is given.
//! Run with `--features visualization [-- trail.rrd]`.

use nalgebra::Isometry3;
use odomtrail_core::{
    DisplayConfig, DisplayServices, FrameTree, HeadlessHost, OdometryDisplay, RerunScene,
};
use odomtrail_env::{LoopbackBus, OdometryMessage, Pose, Stamp};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("odomtrail Rerun demo");

    let bus = LoopbackBus::new();
    let mut frames = FrameTree::new();
    frames.set_transform("map", "odom", Isometry3::identity());

    let scene = match std::env::args().nth(1) {
        Some(path) => RerunScene::new_to_file("odomtrail rerun demo", &path)?,
        None => RerunScene::new("odomtrail rerun demo")?,
    };

    let config = DisplayConfig::default().with_topic("/odom").with_keep(50);
    let mut display = OdometryDisplay::new(
        "Odometry",
        "map",
        config,
        DisplayServices {
            transport: bus.transport(),
            transforms: frames,
            renderer: scene,
            host: HeadlessHost::new(),
        },
    );
    display.enable();

    for frame in 0..400 {
        let t = frame as f64 * 0.05;
        display.renderer().set_time(t);

        let yaw = t * 0.5;
        let pose = Pose::from_xy_yaw(5.0 * yaw.cos(), 5.0 * yaw.sin(), yaw + std::f64::consts::FRAC_PI_2);
        bus.publish("/odom", OdometryMessage::new("odom", Stamp::from_secs_f64(t), pose));

        for msg in display.transport_mut().drain() {
            display.on_message(&msg);
        }
        display.tick();
    }

    println!("Done: {} arrows in trail", display.arrow_count());
    Ok(())
}
