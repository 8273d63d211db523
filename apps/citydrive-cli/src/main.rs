use std::path::PathBuf;

use anyhow::Context;
use citydrive_input::{Control, ControlState};
use citydrive_kernel::{DriveConfig, Session, VehicleState, parse_script};
use citydrive_render::{CityScene, DebugTextRenderer, Renderer};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "citydrive-cli", about = "Headless driver for the citydrive demo")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON config file; defaults are used for missing fields
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version, default tuning and scene size
    Info,
    /// Drive a scripted sequence of controls and print the frames
    Drive {
        /// Comma-separated `keys*ticks` segments, e.g. "w*30,wa*40,*20"
        #[arg(short, long)]
        script: String,
        /// Print every Nth tick (the last tick is always printed)
        #[arg(short, long, default_value = "10")]
        every: u64,
        /// Emit one JSON object per printed frame
        #[arg(long)]
        json: bool,
        /// Include scene statistics in text output
        #[arg(long)]
        scene: bool,
    },
    /// Drive a script, then replay its log and compare the final states
    Replay {
        #[arg(short, long)]
        script: String,
    },
    /// Print the effective, validated configuration as JSON
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => DriveConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => DriveConfig::default(),
    };

    match cli.command {
        Commands::Info => {
            let scene = CityScene::generate();
            println!("citydrive-cli v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "vehicle: max_speed={} acceleration={} tick={}ms",
                config.vehicle.max_speed,
                config.vehicle.acceleration,
                config.vehicle.tick_interval_ms
            );
            println!(
                "camera: distance={} height={} smoothing={}",
                config.camera.distance, config.camera.height, config.camera.smoothing
            );
            println!("scene: {} boxes", scene.boxes().len());
        }
        Commands::Drive {
            script,
            every,
            json,
            scene,
        } => {
            let controls = parse_script(&script)?;
            let city = CityScene::generate();
            let renderer = if scene {
                DebugTextRenderer::new().with_scene()
            } else {
                DebugTextRenderer::new()
            };
            let every = every.max(1);
            let total = controls.len() as u64;

            let mut session = Session::start(config)?;
            for control in controls {
                hold(&mut session, control);
                let frame = session.tick();
                if frame.tick % every == 0 || frame.tick == total {
                    if json {
                        println!("{}", serde_json::to_string(&frame)?);
                    } else {
                        print!("{}", renderer.render(&city, &frame));
                    }
                }
            }
            let summary = session.end();
            if !json {
                println!(
                    "Drove {} ticks, {:.2} units; final heading {:.3}rad",
                    summary.ticks, summary.distance, summary.final_state.heading
                );
            }
        }
        Commands::Replay { script } => {
            let controls = parse_script(&script)?;
            let mut session = Session::start(config)?;
            for control in controls {
                hold(&mut session, control);
                session.tick();
            }

            let live = *session.vehicle();
            let replayed = session.drive_log().replay(session.controller());
            println!("Live:   ticks={} hash={:#018x}", session.tick_count(), live.state_hash());
            println!(
                "Replay: ticks={} hash={:#018x}",
                session.drive_log().len(),
                replayed.state_hash()
            );
            report_position("Live", &live);
            report_position("Replay", &replayed);
            if live != replayed {
                anyhow::bail!("replay diverged from live session");
            }
            println!("Match: OK");
        }
        Commands::Config => {
            println!("{}", config.to_json_pretty()?);
        }
    }

    Ok(())
}

/// Press or release keys so the session's sampler reports exactly `control`.
fn hold(session: &mut Session, control: ControlState) {
    for c in Control::ALL {
        let Some(key) = session
            .sampler()
            .bindings()
            .keys(c)
            .iter()
            .find(|k| !k.trim().is_empty())
            .cloned()
        else {
            continue;
        };
        if control.is_held(c) {
            session.key_down(&key);
        } else {
            session.key_up(&key);
        }
    }
}

fn report_position(label: &str, state: &VehicleState) {
    let p = state.position;
    tracing::debug!(
        "{label}: pos=({:.4}, {:.4}, {:.4}) speed={:.4}",
        p.x,
        p.y,
        p.z,
        state.speed
    );
}
