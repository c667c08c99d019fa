//! radar-entry - radar-driven door entry controller
//!
//! # Usage
//!
//! ```bash
//! # Run against the configured radar (default /dev/ttyAMA2)
//! ./radar-entry
//!
//! # Bench run with a synthetic walker, no door commands
//! ./radar-entry --simulate
//!
//! # Replay a recorded JSON-lines session without touching the door
//! ./radar-entry --replay session.jsonl --dry-run
//! ```
//!
//! # Environment Variables
//!
//! - `RADAR_ENTRY_CONFIG`: Path to the TOML config (default: ./radar_entry.toml)
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use radar_entry::acquisition::{open_source, ReplaySource, SampleSource, SimulatedSource};
use radar_entry::config::{GateConfig, IdentificationMode};
use radar_entry::gateways::{
    build_actuator, build_identifier, DoorActuator, Identifier, LogActuator, StaticIdentifier,
};
use radar_entry::pipeline::run_gate;

/// Latency of the stand-in identifier used with `--simulate`.
const SIMULATED_IDENTIFICATION_LATENCY: Duration = Duration::from_millis(300);

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "radar-entry")]
#[command(about = "Radar-driven door entry controller")]
#[command(version)]
struct CliArgs {
    /// Config file (overrides the RADAR_ENTRY_CONFIG / ./radar_entry.toml search)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Radar serial device (overrides radar.device)
    #[arg(long, value_name = "PATH")]
    device: Option<String>,

    /// Replay JSON-lines samples from a file, or "-" for stdin
    #[arg(long, value_name = "FILE", conflicts_with = "simulate")]
    replay: Option<String>,

    /// Use the synthetic walker instead of radar hardware (implies --dry-run)
    #[arg(long)]
    simulate: bool,

    /// RNG seed for --simulate
    #[arg(long, requires = "simulate")]
    seed: Option<u64>,

    /// Log door commands instead of sending them
    #[arg(long)]
    dry_run: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "RADAR_ENTRY_LOG_JSON")]
    log_json: bool,
}

// ============================================================================
// Component Selection
// ============================================================================

async fn select_source(args: &CliArgs, config: &GateConfig) -> Result<Box<dyn SampleSource>> {
    if let Some(replay) = &args.replay {
        if replay == "-" {
            info!("📥 Input: stdin (JSON-lines samples)");
            return Ok(Box::new(ReplaySource::stdin()));
        }
        info!("📥 Input: replay file {}", replay);
        let source = ReplaySource::from_file(std::path::Path::new(replay))
            .await
            .with_context(|| format!("Failed to open replay file {}", replay))?;
        return Ok(Box::new(source));
    }

    if args.simulate {
        let seed = args.seed.unwrap_or_else(rand::random);
        info!(seed, "📥 Input: simulated walker");
        let source = SimulatedSource::new(
            config.decision.expected_approach_sign,
            config.radar.poll_interval(),
            seed,
        )
        .context("Invalid simulator parameters")?;
        return Ok(Box::new(source));
    }

    info!(
        "📥 Input: {} radar on {}",
        config.radar.model, config.radar.device
    );
    let source = open_source(config)
        .await
        .with_context(|| format!("Failed to start {} radar", config.radar.model))?;
    Ok(source)
}

fn select_identifier(args: &CliArgs, config: &GateConfig) -> Arc<dyn Identifier> {
    if args.simulate && config.identification.mode == IdentificationMode::Command {
        info!("🔑 Identification: simulated (always authorized)");
        return Arc::new(
            StaticIdentifier::new(true).with_latency(SIMULATED_IDENTIFICATION_LATENCY),
        );
    }
    let identifier = build_identifier(&config.identification);
    info!("🔑 Identification: {}", identifier.name());
    identifier
}

fn select_actuator(args: &CliArgs, config: &GateConfig) -> Box<dyn DoorActuator> {
    if args.dry_run || args.simulate {
        info!("🚪 Actuator: dry run (door commands are only logged)");
        return Box::new(LogActuator::new(&config.actuator));
    }
    let actuator = build_actuator(&config.actuator);
    info!(
        "🚪 Actuator: {} (code {}, relay {}s)",
        actuator.name(),
        config.actuator.relay_code(),
        config.actuator.relay_activation_secs
    );
    actuator
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.log_json);

    let mut config = match &args.config {
        Some(path) => GateConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => GateConfig::load(),
    };
    if let Some(device) = &args.device {
        config.radar.device.clone_from(device);
    }

    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  radar-entry - Radar-driven door entry controller");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!(
        "   Approach side: {:?} | trigger within y ≤ {} mm, |x| ≤ {} mm",
        config.decision.expected_approach_sign,
        config.decision.sign_change_y_max_mm,
        config.decision.sign_change_x_max_mm
    );
    info!(
        "   Cooldown: {:.1}s | comfort delay: {:.1}s | identification budget: {:.1}s",
        config.decision.cooldown_secs,
        config.decision.comfort_delay_secs,
        config.identification.max_duration_secs
    );
    info!("");

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        info!("🛑 Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let source = select_source(&args, &config).await?;
    let identifier = select_identifier(&args, &config);
    let actuator = select_actuator(&args, &config);

    let stats = run_gate(&config, source, identifier, actuator, cancel_token).await?;
    info!(
        "✅ Shutdown complete: {} samples, {} tracks, {} door openings",
        stats.samples, stats.tracks_started, stats.door_commands_sent
    );
    Ok(())
}
