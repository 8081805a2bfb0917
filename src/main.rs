//! LED clock HTTP API server
//!
//! Drives the 16×16 panel and exposes a small HTTP API so any device on the
//! LAN can switch modes, change brightness, or push weather and Wi-Fi data.
//!
//! ## Architecture
//! - **Render thread** (std::thread): owns the panel, the button and the
//!   scheduler; ticks every `--tick-ms`
//! - **HTTP server** (tokio/axum): accepts API requests, sends commands via channel
//!
//! Built without the `hardware` feature, the same stack runs against an
//! in-memory panel (set `RUST_LOG=trace` to see the frames).
//!
//! ## Usage
//! ```sh
//! sudo ./target/release/led-clock-rs --port 8080 --settings-file /var/lib/led-clock/settings.json
//! ```

use clap::Parser;
use led_clock_rs::clock::{MonotonicClock, StdDelay, SystemTimeSource};
use led_clock_rs::render::{DisplayStatus, RenderState, render_loop};
use led_clock_rs::scheduler::{DisplayMode, LifeSeed, Scheduler, SchedulerConfig};
use led_clock_rs::server::{self, AppState};
use led_clock_rs::settings::{Settings, validate_brightness};
use led_clock_rs::surface::Orientation;
use led_clock_rs::{PinConfig, is_running, setup_signal_handler};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// LED clock HTTP API server
#[derive(Parser, Clone)]
#[command(name = "led-clock-rs")]
#[command(about = "Clock faces and animations for a 16x16 LED matrix, controlled over HTTP")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Render loop period in milliseconds
    #[arg(long, default_value = "20")]
    tick_ms: u64,

    /// Game of Life generation period in milliseconds
    #[arg(long, default_value = "250")]
    life_step_ms: u64,

    /// Start Game of Life from a single glider instead of a random board
    #[arg(long)]
    life_glider: bool,

    /// The panel is mounted upright (default assumes upside down)
    #[arg(long)]
    no_rotate: bool,

    /// Override the stored brightness (10-255)
    #[arg(long)]
    brightness: Option<u8>,

    /// Override the stored display mode (time, seconds, date, weather, auto, life, pong, rain, signal, off)
    #[arg(long)]
    mode: Option<DisplayMode>,

    /// JSON file where brightness and mode persist
    #[arg(long, default_value = "settings.json")]
    settings_file: PathBuf,

    /// Fixed UTC offset in hours; local time zone when omitted
    #[arg(long, allow_hyphen_values = true)]
    utc_offset: Option<i8>,

    /// Seed for the animations' random generator
    #[arg(long)]
    seed: Option<u32>,

    /// Skip the boot animation
    #[arg(long)]
    skip_startup: bool,

    /// GPIO (BCM) for serial data
    #[arg(long, default_value = "23")]
    data_pin: u8,

    /// GPIO (BCM) for the shift clock
    #[arg(long, default_value = "18")]
    clock_pin: u8,

    /// GPIO (BCM) for the latch
    #[arg(long, default_value = "19")]
    latch_pin: u8,

    /// GPIO (BCM) for output enable / brightness PWM
    #[arg(long, default_value = "5")]
    enable_pin: u8,

    /// GPIO (BCM) for the mode button
    #[arg(long, default_value = "22")]
    button_pin: u8,
}

impl Args {
    fn pins(&self) -> PinConfig {
        PinConfig {
            data: self.data_pin,
            clock: self.clock_pin,
            latch: self.latch_pin,
            enable: self.enable_pin,
            button: self.button_pin,
        }
    }

    fn orientation(&self) -> Orientation {
        if self.no_rotate {
            Orientation::Normal
        } else {
            Orientation::Rotated180
        }
    }

    fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            life_step: Duration::from_millis(self.life_step_ms),
            life_seed: if self.life_glider {
                LifeSeed::Glider
            } else {
                LifeSeed::Random
            },
            seed: self.seed,
            ..SchedulerConfig::default()
        }
    }
}

/// Stored settings with CLI overrides applied.
fn resolve_settings(args: &Args) -> Result<Settings, Box<dyn std::error::Error>> {
    let mut settings = Settings::load_or_default(&args.settings_file);
    if let Some(brightness) = args.brightness {
        settings.brightness = validate_brightness(brightness)?;
    }
    if let Some(mode) = args.mode {
        settings.display_mode = mode;
    }
    Ok(settings)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_ansi(false) // Disable ANSI color codes for systemd/journald
        .compact()
        .init();

    let args = Args::parse();
    if !args.pins().is_distinct() {
        return Err("GPIO pins must all be different".into());
    }
    let settings = resolve_settings(&args)?;
    let time_source = match args.utc_offset {
        Some(hours) => SystemTimeSource::with_offset_hours(hours)?,
        None => SystemTimeSource::default(),
    };
    let running = setup_signal_handler()?;

    tracing::info!("LED Clock Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Mode: {}, brightness: {}", settings.display_mode, settings.brightness);
    tracing::info!("Settings file: {}", args.settings_file.display());
    tracing::info!("Port: {}", args.port);

    // Create the channel for sending commands to the render thread.
    let (tx, rx) = mpsc::channel();

    // Shared display status. The render thread writes, HTTP handlers read.
    let status = Arc::new(Mutex::new(DisplayStatus::new(&settings)));

    // Spawn the render thread. The panel is built on the thread that owns it.
    let render_status = status.clone();
    let render_running = running.clone();
    let render_args = args.clone();
    let render_handle = std::thread::spawn(move || {
        run_display(
            render_args,
            settings,
            time_source,
            rx,
            render_status,
            render_running,
        );
    });

    let app = server::create_router(AppState {
        command_tx: tx,
        status,
    });

    let addr = format!("0.0.0.0:{}", args.port);
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("API Documentation: http://localhost:{}/docs", args.port);
    tracing::info!("Try: curl http://localhost:{}/api/v1/status", args.port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let shutdown_flag = running.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            while is_running(&shutdown_flag) {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            tracing::info!("Shutting down HTTP server");
        })
        .await?;

    running.store(false, Ordering::SeqCst);
    if render_handle.join().is_err() {
        tracing::error!("Render thread panicked");
    }
    Ok(())
}

/// Build the panel for this build and run the render loop until shutdown.
fn run_display(
    args: Args,
    settings: Settings,
    time_source: SystemTimeSource,
    rx: mpsc::Receiver<led_clock_rs::render::RenderCommand>,
    status: Arc<Mutex<DisplayStatus>>,
    running: Arc<AtomicBool>,
) {
    let (canvas, button) = match build_panel(&args) {
        Ok(panel) => panel,
        Err(e) => {
            tracing::error!("Failed to initialize LED panel: {}", e);
            running.store(false, Ordering::SeqCst);
            return;
        }
    };

    let scheduler = Scheduler::new(args.scheduler_config(), settings.display_mode);
    let mut state = RenderState::new(
        canvas,
        scheduler,
        button,
        time_source,
        settings,
        Some(args.settings_file.clone()),
    );
    if !args.skip_startup {
        state.play_startup(&mut StdDelay);
    }

    render_loop(
        rx,
        status,
        state,
        MonotonicClock::new(),
        Duration::from_millis(args.tick_ms),
        running,
    );
}

#[cfg(feature = "hardware")]
fn build_panel(
    args: &Args,
) -> Result<
    (
        led_clock_rs::hardware::HardwareMatrix,
        led_clock_rs::hardware::HardwareButton,
    ),
    Box<dyn std::error::Error>,
> {
    led_clock_rs::hardware::create_panel(args.pins(), args.orientation())
}

#[cfg(not(feature = "hardware"))]
fn build_panel(
    args: &Args,
) -> Result<(led_clock_rs::matrix::SimulatedMatrix, ()), Box<dyn std::error::Error>> {
    tracing::warn!(
        "Built without the 'hardware' feature: rendering to an in-memory panel (pins {:?} unused)",
        args.pins()
    );
    Ok((led_clock_rs::matrix::SimulatedMatrix::simulated(args.orientation()), ()))
}
