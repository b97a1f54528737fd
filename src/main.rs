//! Hand Joystick - steer a runner game or the arrow keys with your hand

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hand_joystick::config::{AppConfig, ConfigWatcher, SourceConfig, SourceKind};
use hand_joystick::dispatch::{CommandSlot, ConsoleKeySink, EnigoKeySink};
use hand_joystick::game::{run_game_window, shared_status};
use hand_joystick::input::{open_source, DetectorSettings};
use hand_joystick::paths::{AppPaths, ConfigOrigin};
use hand_joystick::pipeline::{run_detection, run_keys, KeysPipeline, RunSummary, ZoneDetector};
use hand_joystick::shutdown::{shutdown_channel, ShutdownSignal, ShutdownTrigger};

/// Hand Joystick - hand gestures from a webcam as directional commands
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "HAND_JOYSTICK_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Also write daily log files (JSON) to this directory
    #[arg(long, env = "HAND_JOYSTICK_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Index fingertip zones drive the runner game
    Game,

    /// Wrist offset from a calibrated center presses the arrow keys
    Keys {
        /// Log key presses instead of sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate the configuration and print a summary
    Check {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(&args.log_level, args.log_dir.as_deref())?;

    let paths = AppPaths::detect(args.config.as_deref());
    info!("Starting Hand Joystick v{}...", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration file: {} (from {})",
        paths.config.display(),
        paths.origin.describe()
    );

    let outcome = match args.mode {
        Mode::Check { init } => check_config(&paths, init).await,
        Mode::Game => {
            let (watcher, config) = load_config(&paths).await?;
            let (trigger, shutdown) = shutdown_channel();
            spawn_ctrl_c(trigger.clone());
            run_game_mode(config, watcher, trigger, shutdown).await
        }
        Mode::Keys { dry_run } => {
            let (watcher, config) = load_config(&paths).await?;
            let (trigger, shutdown) = shutdown_channel();
            spawn_ctrl_c(trigger);
            run_keys_mode(config, watcher, shutdown, dry_run).await
        }
    };
    outcome?;

    info!("Hand Joystick shutdown complete");
    Ok(())
}

/// Load the config with hot reload when the file exists, defaults otherwise
async fn load_config(paths: &AppPaths) -> Result<(ConfigWatcher, AppConfig)> {
    if paths.config_exists() {
        let (watcher, config) = ConfigWatcher::new(&paths.config).await?;
        info!("Configuration loaded successfully with hot-reload enabled");
        return Ok((watcher, config));
    }

    if paths.origin == ConfigOrigin::CommandLine {
        bail!("Config file not found: {}", paths.config.display());
    }

    info!("No config file found, using defaults (run `hand-joystick check --init` to create one)");
    Ok((ConfigWatcher::disabled(), AppConfig::default()))
}

fn capture_size(source: &SourceConfig) -> Option<(u32, u32)> {
    source.capture_width.zip(source.capture_height)
}

/// Game mode only forwards what the config sets; the detector keeps its own defaults
fn game_detector(config: &AppConfig) -> DetectorSettings {
    DetectorSettings {
        capture: capture_size(&config.source),
        tracking_confidence: config.source.tracking_confidence,
    }
}

/// Keys mode fills unset detector settings from the `calibrated` section
fn keys_detector(config: &AppConfig) -> DetectorSettings {
    let calibrated = &config.calibrated;
    DetectorSettings {
        capture: capture_size(&config.source)
            .or(Some((calibrated.capture_width, calibrated.capture_height))),
        tracking_confidence: config
            .source
            .tracking_confidence
            .or(Some(calibrated.tracking_confidence)),
    }
}

async fn run_game_mode(
    config: AppConfig,
    watcher: ConfigWatcher,
    trigger: ShutdownTrigger,
    shutdown: ShutdownSignal,
) -> Result<()> {
    let source = open_source(&config.source, game_detector(&config))
        .await
        .context("Failed to open frame source")?;

    let slot = CommandSlot::new();
    let status = shared_status();
    let detector = ZoneDetector::new(&config, slot.clone(), status.clone());
    let detection = tokio::spawn(run_detection(source, detector, watcher, shutdown.clone()));

    // The window owns the main thread until it is closed
    let window = tokio::task::block_in_place(|| {
        run_game_window(&config.game, slot, status, shutdown)
    });

    trigger.trigger();
    match detection.await {
        Ok(summary) => log_summary(&summary),
        Err(e) => warn!("Detection task failed: {}", e),
    }

    window
}

async fn run_keys_mode(
    config: AppConfig,
    mut watcher: ConfigWatcher,
    shutdown: ShutdownSignal,
    dry_run: bool,
) -> Result<()> {
    let detector = keys_detector(&config);

    let summary = if dry_run {
        info!("Dry run: key presses are only logged");
        let mut source = open_source(&config.source, detector)
            .await
            .context("Failed to open frame source")?;
        let mut pipeline = KeysPipeline::new(&config, ConsoleKeySink::new());
        let summary = run_keys(source.as_mut(), &mut pipeline, &mut watcher, shutdown).await;
        info!("Dry run logged {} key presses", pipeline.sink().presses());
        summary
    } else {
        let sink = EnigoKeySink::new().context("Failed to initialize keyboard simulation")?;
        let mut source = open_source(&config.source, detector)
            .await
            .context("Failed to open frame source")?;
        let mut pipeline = KeysPipeline::new(&config, sink);
        run_keys(source.as_mut(), &mut pipeline, &mut watcher, shutdown).await
    };

    log_summary(&summary);
    Ok(())
}

fn log_summary(summary: &RunSummary) {
    info!(
        "Capture loop ended after {} frames ({} commands): {}",
        summary.frames, summary.accepted, summary.stop
    );
}

fn spawn_ctrl_c(trigger: ShutdownTrigger) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                trigger.trigger();
            }
            Err(e) => warn!("Failed to install CTRL+C signal handler: {}", e),
        }
    });
}

fn init_logging(level: &str, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "hand-joystick.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}

async fn check_config(paths: &AppPaths, init: bool) -> Result<()> {
    println!("\n{}", "=== Hand Joystick Configuration ===".bold().cyan());

    if !paths.config_exists() {
        if init {
            paths.ensure_config_dir()?;
            AppConfig::default().save(&paths.config).await?;
            println!("  Wrote defaults to {}", paths.config.display().to_string().green());
        } else if paths.origin == ConfigOrigin::CommandLine {
            bail!("Config file not found: {}", paths.config.display());
        } else {
            println!(
                "  {} {}, defaults apply",
                "No config file at".yellow(),
                paths.config.display()
            );
        }
    }

    let config = AppConfig::load_or_default(&paths.config).await?;

    println!("\n{}", "Source:".bold());
    let source = &config.source;
    match source.kind {
        SourceKind::Command => {
            println!(
                "  Detector: {} {}",
                source.program.green(),
                source.args.join(" ").green()
            );
            println!("  Camera: {}", source.camera_index.to_string().green());
        }
        SourceKind::Stdin => println!("  Reports from {}", "stdin".green()),
        SourceKind::File => {
            let path = source
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            let pace = source
                .fps
                .map(|fps| format!(" at {} fps", fps))
                .unwrap_or_default();
            println!("  Replay: {}{}", path.green(), pace);
        }
    }
    println!(
        "  Mirror: {}, min hand score: {}",
        source.mirror.to_string().yellow(),
        source.min_hand_score.to_string().yellow()
    );

    println!("\n{}", "Game mode:".bold());
    println!(
        "  Zones: left/up < {}, right/down > {}, cooldown {} ms",
        config.zones.low.to_string().green(),
        config.zones.high.to_string().green(),
        config.zones.cooldown_ms.to_string().green()
    );
    println!(
        "  Canvas {}x{}, player {} px, step {} px, {} Hz",
        config.game.width,
        config.game.height,
        config.game.player_size,
        config.game.step_px,
        config.game.tick_hz
    );

    println!("\n{}", "Keys mode:".bold());
    println!(
        "  Dead zone {} px, delay {} ms, capture {}x{}, tracking confidence {}",
        config.calibrated.deadzone_px.to_string().green(),
        config.calibrated.delay_ms.to_string().green(),
        config.calibrated.capture_width,
        config.calibrated.capture_height,
        config.calibrated.tracking_confidence
    );

    println!("\n{}", "✅ Configuration is valid".green().bold());
    Ok(())
}
