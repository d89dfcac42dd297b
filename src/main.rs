//! BrightFlashlight host simulator.
//!
//! Drives a [`Session`] over the logging [`SimLamp`] in real time.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │  SimLamp (LampHardware)  SystemClock  LogEventSink   │
//! │  ─────────────── Port Trait Boundary ──────────────  │
//! │  Session: Scheduler · AutoOff · Timeline             │
//! └──────────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use brightflashlight::adapters::log_panel::LogPanel;
use brightflashlight::adapters::log_sink::LogEventSink;
use brightflashlight::adapters::sim_lamp::SimLamp;
use brightflashlight::adapters::time::SystemClock;
use brightflashlight::app::commands::{SessionCommand, SosAction, StrobeAction, TorchAction};
use brightflashlight::app::session::Session;
use brightflashlight::config::SessionConfig;
use brightflashlight::error::AccessFault;
use brightflashlight::scheduler::Mode;
use brightflashlight::screen_light::{ScreenColor, ScreenLight};

/// Longest sleep between polls while nothing is due.
const IDLE_POLL_MS: u64 = 250;

#[derive(Parser)]
#[command(name = "brightflashlight-sim")]
#[command(version)]
#[command(about = "Run the lamp controller against a simulated lamp")]
#[command(long_about = "Run the lamp controller against a simulated lamp

EXAMPLES:
    brightflashlight-sim torch --level 3 --levels 5
    brightflashlight-sim strobe --speed 4 --duration 5
    brightflashlight-sim sos --auto-off 1 --duration 90
    brightflashlight-sim screen --color '#FF8000'

ENVIRONMENT VARIABLES:
    BRIGHTFLASHLIGHT_LOG=debug    Log filter (default: info)")]
struct Cli {
    #[command(subcommand)]
    mode: ModeArg,

    /// Switch off after this many minutes (0 = never)
    #[arg(long, default_value_t = 0)]
    auto_off: u32,

    /// Stop the simulation after this many seconds
    #[arg(long, default_value_t = 10)]
    duration: u64,

    /// Strength steps of the simulated lamp (1 = on/off only)
    #[arg(long, default_value_t = 1)]
    levels: u8,

    /// Fail this many lamp writes right after start
    #[arg(long, default_value_t = 0)]
    inject_faults: u32,

    /// JSON session configuration
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum ModeArg {
    /// Steady light
    Torch {
        #[arg(long)]
        level: Option<u8>,
    },
    /// Flashing light
    Strobe {
        #[arg(long)]
        speed: Option<u8>,
    },
    /// Morse SOS
    Sos,
    /// Use the display as the light
    Screen {
        /// `#RRGGBB`; defaults to the configured screen color
        #[arg(long)]
        color: Option<String>,
    },
}

impl ModeArg {
    fn command(&self) -> Option<SessionCommand> {
        match *self {
            Self::Torch { level } => Some(TorchAction::On { level }.into()),
            Self::Strobe { speed } => Some(StrobeAction::Start { speed }.into()),
            Self::Sos => Some(SosAction::Start.into()),
            Self::Screen { .. } => None,
        }
    }
}

fn load_config(path: &Path) -> Result<SessionConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let config: SessionConfig = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

fn run_screen(color: Option<&str>, default: ScreenColor, duration_secs: u64) -> Result<()> {
    let color = match color {
        Some(hex) => ScreenColor::from_hex(hex)
            .with_context(|| format!("invalid color {hex:?}, expected #RRGGBB"))?,
        None => default,
    };

    let mut light = ScreenLight::new(LogPanel::new(), color);
    light.open();
    std::thread::sleep(Duration::from_secs(duration_secs));
    light.close();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = std::env::var("BRIGHTFLASHLIGHT_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(&log_level)
        .init();

    info!("BrightFlashlight simulator v{}", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => SessionConfig::default(),
    };

    if let ModeArg::Screen { color } = &cli.mode {
        return run_screen(color.as_deref(), config.screen_color, cli.duration);
    }

    let mut lamp = SimLamp::new(cli.levels);
    lamp.fail_next(cli.inject_faults, AccessFault::Busy);

    let mut sink = LogEventSink::new();
    let mut session = Session::new(lamp, SystemClock::new(), config);

    let capability = session.start(&mut sink);
    if !capability.available {
        anyhow::bail!("no lamp available");
    }

    if let Some(cmd) = cli.mode.command() {
        session.handle_command(cmd, &mut sink);
    }
    if cli.auto_off > 0 {
        session.handle_command(SessionCommand::AutoOffSet { minutes: cli.auto_off }, &mut sink);
    }

    let stop_at = Instant::now() + Duration::from_secs(cli.duration);
    loop {
        let next_due = session.poll(&mut sink);

        if Instant::now() >= stop_at {
            info!("Run time elapsed");
            break;
        }
        if session.mode() == Mode::Off && next_due.is_none() {
            info!("Nothing left to run");
            break;
        }

        let now = session.timeline().now_ms();
        let wait = next_due.map_or(IDLE_POLL_MS, |due| due.saturating_sub(now).min(IDLE_POLL_MS));
        std::thread::sleep(Duration::from_millis(wait.max(1)));
    }

    session.shutdown_all(&mut sink);
    info!(
        "Simulation finished after {} lamp writes",
        session.hardware().writes()
    );
    Ok(())
}
