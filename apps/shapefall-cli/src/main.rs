use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use shapefall_common::Viewport;
use shapefall_input::PointerEvent;
use shapefall_kernel::{HeadlessHost, SceneConfig, Session, SessionSummary};
use shapefall_render::DebugTextRenderer;
use std::f32::consts::PI;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shapefall-cli", about = "Run shapefall scenes without a window")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and the default scene configuration
    Info,
    /// Click a headless scene and step it for a number of frames
    Simulate(SimulateArgs),
}

#[derive(Args, Debug, Clone)]
struct SimulateArgs {
    /// Number of clicks, spread over the run
    #[arg(short, long, default_value = "10")]
    clicks: u32,
    /// Number of frames to run
    #[arg(short, long, default_value = "120")]
    frames: u32,
    /// Seed for the shape generator
    #[arg(short, long, default_value = "42")]
    seed: u64,
    /// Evict the oldest shape once this many exist
    #[arg(long)]
    max_entities: Option<usize>,
    /// Viewport width in pixels
    #[arg(long, default_value = "1280")]
    width: f32,
    /// Viewport height in pixels
    #[arg(long, default_value = "720")]
    height: f32,
    /// Print the last rendered frame
    #[arg(long)]
    show_frame: bool,
    /// Emit the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct EntityReport {
    index: u64,
    kind: &'static str,
    position: [f32; 3],
}

#[derive(Debug, Serialize)]
struct SimulationReport {
    seed: u64,
    clicks: u32,
    spawned: u32,
    missed: u32,
    summary: SessionSummary,
    entities: Vec<EntityReport>,
    #[serde(skip)]
    last_frame: Option<String>,
}

/// Click `i` of `n`: a golden-angle spiral around the screen center, so
/// early clicks land near the origin and later ones spread outwards.
fn click_position(i: u32, n: u32, viewport: Viewport) -> PointerEvent {
    let golden = PI * (3.0 - 5.0_f32.sqrt());
    let angle = i as f32 * golden;
    let radius = 0.35 * viewport.height * ((i + 1) as f32 / n.max(1) as f32).sqrt();
    PointerEvent::new(
        viewport.width / 2.0 + angle.cos() * radius,
        viewport.height / 2.0 + angle.sin() * radius,
    )
}

fn simulate(args: &SimulateArgs) -> anyhow::Result<SimulationReport> {
    let viewport = Viewport::new(args.width, args.height);
    let config = SceneConfig {
        seed: Some(args.seed),
        max_entities: args.max_entities,
        ..SceneConfig::default()
    };
    let mut session = Session::mount(Some(HeadlessHost::new(viewport)), config)?;
    let mut renderer = DebugTextRenderer::new();

    let mut next_click = 0;
    let mut spawned = 0;
    let mut last_frame = None;
    let mut click_until = |session: &mut Session<HeadlessHost>, frame: u32| {
        // Click i is due at frame i * frames / clicks.
        while next_click < args.clicks && next_click as u64 * args.frames as u64 / args.clicks as u64 <= frame as u64 {
            if session
                .dispatch_click(click_position(next_click, args.clicks, viewport))
                .is_some()
            {
                spawned += 1;
            }
            next_click += 1;
        }
    };

    for frame in 0..args.frames {
        click_until(&mut session, frame);
        last_frame = session
            .frame(&mut renderer)
            .with_context(|| format!("frame {frame}"))?;
    }
    click_until(&mut session, args.frames);

    let context = session
        .context()
        .context("session unmounted during simulation")?;
    let entities = context
        .registry()
        .iter()
        .filter_map(|entity| {
            let node = context.scene().get(entity.mesh)?;
            Some(EntityReport {
                index: entity.index.0,
                kind: entity.kind.name(),
                position: node.transform.position.to_array(),
            })
        })
        .collect();

    let report = SimulationReport {
        seed: args.seed,
        clicks: args.clicks,
        spawned,
        missed: args.clicks - spawned,
        summary: session.summary(),
        entities,
        last_frame,
    };
    session.teardown();
    Ok(report)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("shapefall-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("default scene configuration:");
            println!("{}", serde_json::to_string_pretty(&SceneConfig::default())?);
        }
        Commands::Simulate(args) => {
            let report = simulate(&args)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            println!(
                "Simulated {} frames, seed {}: {} clicks, {} spawned, {} missed",
                args.frames, report.seed, report.clicks, report.spawned, report.missed
            );
            println!("{}", report.summary);
            for entity in &report.entities {
                let [x, y, z] = entity.position;
                println!("  #{:<4} {:<8} ({x:.2}, {y:.2}, {z:.2})", entity.index, entity.kind);
            }
            if let (true, Some(frame)) = (args.show_frame, &report.last_frame) {
                print!("{frame}");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(clicks: u32, frames: u32) -> SimulateArgs {
        SimulateArgs {
            clicks,
            frames,
            seed: 7,
            max_entities: None,
            width: 1280.0,
            height: 720.0,
            show_frame: false,
            json: false,
        }
    }

    #[test]
    fn every_click_is_accounted_for() {
        let report = simulate(&args(12, 90)).unwrap();
        assert_eq!(report.spawned + report.missed, 12);
        assert_eq!(report.summary.entity_count, report.spawned as usize);
        assert_eq!(report.entities.len(), report.spawned as usize);
        assert_eq!(report.summary.tick, 90);
        assert!(report.spawned > 0);
    }

    #[test]
    fn first_click_lands_near_center() {
        let viewport = Viewport::new(1280.0, 720.0);
        let first = click_position(0, 100, viewport);
        assert!((first.x - 640.0).abs() < 40.0);
        assert!((first.y - 360.0).abs() < 40.0);
    }

    #[test]
    fn settled_shapes_rest_above_ground() {
        let report = simulate(&args(4, 300)).unwrap();
        for entity in &report.entities {
            assert!(entity.position[1] > 0.0, "{entity:?} sank through the ground");
            assert!(entity.position[1] < 1.5, "{entity:?} never settled");
        }
    }

    #[test]
    fn clicks_without_frames_still_spawn() {
        let report = simulate(&args(3, 0)).unwrap();
        assert_eq!(report.summary.tick, 0);
        assert_eq!(report.spawned + report.missed, 3);
    }

    #[test]
    fn cap_bounds_the_report() {
        let mut a = args(20, 40);
        a.max_entities = Some(5);
        let report = simulate(&a).unwrap();
        assert!(report.entities.len() <= 5);
        assert_eq!(report.summary.physics_bodies, report.entities.len() + 1);
    }

    #[test]
    fn report_serializes() {
        let report = simulate(&args(2, 10)).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["seed"], 7);
        assert!(json.get("last_frame").is_none());
        assert_eq!(json["summary"]["tick"], 10);
    }
}
