//! odomtrail replay CLI
//!
//! Replays synthetic odometry scenarios through the trail display and checks
//! that the trail stays within `keep`.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use odomtrail_core::{AngleMetric, DisplayConfig, HeadlessScene};
use odomtrail_env::SceneRenderer;
use odomtrail_sim::scenarios::ScenarioId;
use odomtrail_sim::{ReplayError, ReplayRunner, ReplaySession, ReplayStats, TrailExport};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// odomtrail replay CLI
#[derive(Parser, Debug)]
#[command(name = "odomtrail-sim")]
#[command(about = "Replay synthetic odometry through the arrow trail display", long_about = None)]
struct Args {
    /// Scenario to run (circle, stationary, frame_switch, dropout, keep_shrink, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Seed for trajectory noise (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Replay duration in seconds
    #[arg(short, long, default_value = "10")]
    duration: f64,

    /// Odometry publish rate in Hz
    #[arg(short, long, default_value = "10")]
    rate: f64,

    /// Display configuration file (JSON); flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Topic to subscribe to
    #[arg(long)]
    topic: Option<String>,

    /// Number of arrows to keep (0 = unbounded)
    #[arg(short, long)]
    keep: Option<u32>,

    /// Position tolerance in meters
    #[arg(long)]
    position_tolerance: Option<f32>,

    /// Angle tolerance
    #[arg(long)]
    angle_tolerance: Option<f32>,

    /// Compare orientations by rotation angle instead of quaternion components
    #[arg(long)]
    geodesic: bool,

    /// Pace the replay in wall-clock time (Ctrl-C stops early)
    #[arg(long)]
    realtime: bool,

    /// Stream the trail to a Rerun viewer
    #[cfg(feature = "visualization")]
    #[arg(long)]
    rerun: bool,

    /// Export trail snapshots to a JSON file
    #[arg(long)]
    export: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    match run(&args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

/// Runs every requested scenario. Returns whether all of them passed.
fn run(args: &Args) -> Result<bool, ReplayError> {
    if !args.json {
        info!("odomtrail replay v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        match args.scenario.parse() {
            Ok(scenario) => vec![scenario],
            Err(e) => {
                error!("{}", e);
                error!("Available scenarios: circle, stationary, frame_switch, dropout, keep_shrink, all");
                return Ok(false);
            }
        }
    };

    if args.export.is_some() && scenarios.len() > 1 {
        error!("--export only supports a single scenario, not 'all'");
        return Ok(false);
    }

    let seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    } else {
        args.seed
    };

    let config = build_config(args)?;
    let runner = ReplayRunner::new(seed)
        .with_duration(args.duration)
        .with_rate(args.rate)
        .with_config(config);

    let mut results: Vec<(ScenarioId, ReplayStats)> = Vec::new();
    for scenario in scenarios {
        let stats = run_scenario(args, &runner, scenario, seed)?;

        if !args.json {
            if stats.passed() {
                info!(
                    "✓ {} (seed={}) PASSED: {} accepted, {} filtered, {} transform failures, trail {}",
                    scenario.name(),
                    seed,
                    stats.accepted,
                    stats.filtered,
                    stats.transform_failures,
                    stats.final_trail_len
                );
            } else {
                error!(
                    "✗ {} (seed={}) FAILED: trail exceeded keep on {} ticks",
                    scenario.name(),
                    seed,
                    stats.keep_violations
                );
            }
        }
        results.push((scenario, stats));
    }

    let total = results.len();
    let failed = results.iter().filter(|(_, s)| !s.passed()).count();

    if args.json {
        let summary = serde_json::json!({
            "total": total,
            "passed": total - failed,
            "failed": failed,
            "seed": seed,
            "results": results.iter().map(|(scenario, stats)| {
                serde_json::json!({
                    "scenario": scenario.name(),
                    "passed": stats.passed(),
                    "stats": stats,
                })
            }).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        if failed == 0 {
            info!("✅ All {} scenario runs passed!", total);
        } else {
            error!("❌ {}/{} scenario runs failed!", failed, total);
        }
    }

    Ok(failed == 0)
}

/// Loads `--config` if given, then applies flag overrides.
fn build_config(args: &Args) -> Result<DisplayConfig, ReplayError> {
    let mut config = match &args.config {
        Some(path) => DisplayConfig::load(path)?,
        None => DisplayConfig::default(),
    };

    if let Some(topic) = &args.topic {
        config.topic = topic.clone();
    }
    if let Some(keep) = args.keep {
        config.keep = keep;
    }
    if let Some(tolerance) = args.position_tolerance {
        config.position_tolerance = tolerance;
    }
    if let Some(tolerance) = args.angle_tolerance {
        config.angle_tolerance = tolerance;
    }
    if args.geodesic {
        config.angle_metric = AngleMetric::Geodesic;
    }

    Ok(config)
}

fn run_scenario(
    args: &Args,
    runner: &ReplayRunner,
    scenario: ScenarioId,
    seed: u64,
) -> Result<ReplayStats, ReplayError> {
    if !args.json {
        info!("▶ {}: {}", scenario.name(), scenario.description());
    }

    #[cfg(feature = "visualization")]
    {
        if args.rerun {
            if args.export.is_some() {
                warn!("--export is ignored when streaming to Rerun");
            }
            let scene = odomtrail_core::RerunScene::new("odomtrail-sim")
                .map_err(|e| ReplayError::Visualization(e.to_string()))?;
            let mut session = runner.session(scenario, scene)?;
            drive(&mut session, args.realtime, |s| {
                s.display().renderer().set_time(s.time())
            })?;
            return Ok(session.finish());
        }
    }

    let mut session = runner.session(scenario, HeadlessScene::new())?;
    let mut export = args
        .export
        .as_ref()
        .map(|_| TrailExport::new(scenario.name(), seed));

    // One snapshot per replay second
    let interval = (args.rate.round() as u64).max(1);
    drive(&mut session, args.realtime, |s| {
        if let Some(export) = export.as_mut() {
            if s.steps_done() % interval == 0 {
                export.add_frame(s.snapshot());
            }
        }
    })?;

    if let (Some(export), Some(path)) = (export.as_mut(), args.export.as_deref()) {
        export.add_frame(session.snapshot());
        export.finalize(session.stats());
        export.write_to_file(path)?;
        info!("Exported {} frames to {}", export.frames.len(), path);
    }

    Ok(session.finish())
}

/// Steps `session` to completion, optionally paced at its publish rate.
fn drive<R: SceneRenderer>(
    session: &mut ReplaySession<R>,
    realtime: bool,
    mut on_step: impl FnMut(&ReplaySession<R>),
) -> Result<(), ReplayError> {
    if !realtime {
        while session.step() {
            on_step(session);
        }
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(ReplayError::Runtime)?;

    let period = Duration::from_secs_f64(session.period());
    runtime.block_on(async {
        let mut interval = tokio::time::interval(period);
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if !session.step() {
                        break;
                    }
                    on_step(session);
                }
                _ = &mut ctrl_c => {
                    warn!("Interrupted after {} of {} steps", session.steps_done(), session.total_steps());
                    break;
                }
            }
        }
    });

    Ok(())
}
