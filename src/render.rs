//! Render thread: owns the panel and the scheduler, processes commands via a channel.
//!
//! Everything that touches the panel happens on this one thread. The async
//! HTTP server talks to it by sending `RenderCommand` values through an
//! `mpsc` channel and reads back a `DisplayStatus` snapshot.
//!
//! ## Rust concepts
//! - `std::sync::mpsc` channels for thread communication
//! - `try_recv()` so commands never block the tick cadence
//! - `Arc<Mutex<T>>` for the shared status snapshot
//! - Generic state over `Canvas`, `ModeInput` and `TimeSource`, so tests
//!   drive the exact same code as the device

use crate::animations::{animate_checkmark, startup_animation};
use crate::button::ModeInput;
use crate::clock::{Clock, TimeSource};
use crate::is_running;
use crate::matrix::Canvas;
use crate::scheduler::{DisplayMode, FrameInputs, Scheduler};
use crate::settings::{Settings, validate_brightness};
use crate::views::WeatherReport;
use embedded_hal::delay::DelayNs;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

// ── Commands ─────────────────────────────────────────────────────────

/// Commands sent from the HTTP server to the render thread.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderCommand {
    /// Switch to a specific mode
    SetMode(DisplayMode),
    /// Same as a button press
    NextMode,
    /// Global brightness (already validated by the sender)
    SetBrightness(u8),
    /// Latest weather reading
    SetWeather(WeatherReport),
    /// Latest RSSI in dBm, or `None` when disconnected
    SetSignal(Option<i32>),
}

// ── Status ───────────────────────────────────────────────────────────

/// Snapshot the HTTP server can read to report current state.
#[derive(Clone, Debug, PartialEq, Serialize, utoipa::ToSchema)]
pub struct DisplayStatus {
    /// Current display mode
    pub mode: DisplayMode,
    /// Current brightness (10-255)
    pub brightness: u8,
    /// Running engine: none, life, pong or rain
    pub engine: String,
    /// Game of Life generation, when Life is running
    pub life_generation: Option<u64>,
    /// Frames committed since startup
    pub frames: u64,
    /// Last weather report received
    pub weather: Option<WeatherReport>,
    /// Last signal strength received, in dBm
    pub signal_dbm: Option<i32>,
    /// Server version
    pub version: String,
}

impl DisplayStatus {
    pub fn new(settings: &Settings) -> Self {
        Self {
            mode: settings.display_mode,
            brightness: settings.brightness,
            engine: "none".to_string(),
            life_generation: None,
            frames: 0,
            weather: None,
            signal_dbm: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// ── Render state ─────────────────────────────────────────────────────

/// Everything the render thread owns.
pub struct RenderState<C, B, T> {
    canvas: C,
    scheduler: Scheduler,
    button: B,
    time: T,
    settings: Settings,
    settings_path: Option<PathBuf>,
    weather: Option<WeatherReport>,
    signal_dbm: Option<i32>,
    frames: u64,
}

impl<C: Canvas, B: ModeInput, T: TimeSource> RenderState<C, B, T> {
    /// Take ownership of the panel and apply the stored brightness.
    /// `settings_path`, when set, is rewritten whenever mode or brightness
    /// change.
    pub fn new(
        mut canvas: C,
        scheduler: Scheduler,
        button: B,
        time: T,
        settings: Settings,
        settings_path: Option<PathBuf>,
    ) -> Self {
        canvas.set_brightness(settings.brightness);
        Self {
            canvas,
            scheduler,
            button,
            time,
            settings,
            settings_path,
            weather: None,
            signal_dbm: None,
            frames: 0,
        }
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Blocking boot sequence: startup sweep, then the checkmark.
    pub fn play_startup<D: DelayNs>(&mut self, delay: &mut D) {
        let brightness = self.settings.brightness;
        startup_animation(&mut self.canvas, delay, brightness);
        animate_checkmark(&mut self.canvas, delay, brightness);
    }

    pub fn apply(&mut self, cmd: RenderCommand, now: Duration) {
        match cmd {
            RenderCommand::SetMode(mode) => {
                self.scheduler.enter_mode(mode, now, &mut self.canvas);
                self.remember_mode();
            }
            RenderCommand::NextMode => {
                self.scheduler.next_mode(now, &mut self.canvas);
                self.remember_mode();
            }
            RenderCommand::SetBrightness(value) => match validate_brightness(value) {
                Ok(value) => {
                    self.canvas.set_brightness(value);
                    self.settings.brightness = value;
                    tracing::info!("Brightness set to {}", value);
                    self.persist();
                }
                Err(e) => tracing::warn!("Ignoring brightness: {}", e),
            },
            RenderCommand::SetWeather(report) => {
                tracing::debug!("Weather: {:.1}°C {}", report.temperature, report.condition);
                self.weather = Some(report);
            }
            RenderCommand::SetSignal(dbm) => {
                self.signal_dbm = dbm;
            }
        }
    }

    /// One cooperative tick: button first, then whatever owns the panel.
    pub fn tick(&mut self, now: Duration) {
        if self.button.poll(now) {
            self.scheduler.next_mode(now, &mut self.canvas);
            self.remember_mode();
        }
        let inputs = FrameInputs {
            wall: self.time.wall_time(),
            weather: self.weather.as_ref(),
            signal_dbm: self.signal_dbm,
        };
        if self.scheduler.tick(now, &mut self.canvas, &inputs) {
            self.frames += 1;
        }
    }

    pub fn status(&self) -> DisplayStatus {
        DisplayStatus {
            mode: self.scheduler.mode(),
            brightness: self.settings.brightness,
            engine: self.scheduler.engine().name().to_string(),
            life_generation: self.scheduler.life_generation(),
            frames: self.frames,
            weather: self.weather.clone(),
            signal_dbm: self.signal_dbm,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Blank the panel before the thread exits.
    pub fn shutdown(&mut self) {
        self.canvas.clear();
        self.canvas.render();
    }

    fn remember_mode(&mut self) {
        let mode = self.scheduler.mode();
        if self.settings.display_mode != mode {
            self.settings.display_mode = mode;
            self.persist();
        }
    }

    fn persist(&self) {
        let Some(path) = &self.settings_path else {
            return;
        };
        if let Err(e) = self.settings.save(path) {
            tracing::warn!("Failed to save settings: {}", e);
        }
    }
}

// ── Render loop ──────────────────────────────────────────────────────

/// Main render loop: runs on a dedicated thread, owns the panel.
///
/// Each tick drains pending commands without blocking, advances the
/// scheduler, publishes a status snapshot, then sleeps for `tick`. Returns
/// when `running` goes false or every sender is dropped.
pub fn render_loop<C, B, T, K>(
    rx: Receiver<RenderCommand>,
    status: Arc<Mutex<DisplayStatus>>,
    mut state: RenderState<C, B, T>,
    clock: K,
    tick: Duration,
    running: Arc<AtomicBool>,
) where
    C: Canvas,
    B: ModeInput,
    T: TimeSource,
    K: Clock,
{
    tracing::info!("Render thread started in {} mode", state.scheduler().mode());

    while is_running(&running) {
        let now = clock.now();

        let mut closed = false;
        loop {
            match rx.try_recv() {
                Ok(cmd) => state.apply(cmd, now),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    closed = true;
                    break;
                }
            }
        }

        state.tick(now);
        *status.lock().unwrap_or_else(PoisonError::into_inner) = state.status();

        if closed {
            tracing::info!("Render thread: channel closed, shutting down.");
            break;
        }
        thread::sleep(tick);
    }

    state.shutdown();
    tracing::info!("Render thread stopped after {} frames", state.status().frames);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{FixedTime, ManualClock, WallTime};
    use crate::matrix::SimulatedMatrix;
    use crate::scheduler::SchedulerConfig;
    use crate::surface::Orientation;
    use pretty_assertions::assert_eq;
    use std::sync::mpsc;

    const MS: Duration = Duration::from_millis(1);

    /// Fires once on the given poll.
    struct PressOnce {
        polls: u32,
        at: u32,
    }

    impl ModeInput for PressOnce {
        fn poll(&mut self, _now: Duration) -> bool {
            self.polls += 1;
            self.polls == self.at
        }
    }

    /// No-op delay so the startup sequence runs instantly.
    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    fn noon() -> FixedTime {
        FixedTime(WallTime {
            hour: 12,
            minute: 0,
            second: 0,
            day: 3,
            month: 4,
        })
    }

    fn state_with<B: ModeInput>(button: B, path: Option<PathBuf>) -> RenderState<SimulatedMatrix, B, FixedTime> {
        let settings = Settings {
            brightness: 100,
            display_mode: DisplayMode::Time,
        };
        let config = SchedulerConfig {
            seed: Some(1),
            ..SchedulerConfig::default()
        };
        RenderState::new(
            SimulatedMatrix::simulated(Orientation::Rotated180),
            Scheduler::new(config, settings.display_mode),
            button,
            noon(),
            settings,
            path,
        )
    }

    #[test]
    fn new_applies_stored_brightness() {
        let state = state_with((), None);
        assert_eq!(state.canvas().brightness().level(), 100);
        assert_eq!(state.canvas().brightness().pwm().duty(), 155);
    }

    #[test]
    fn commands_change_mode_and_status() {
        let mut state = state_with((), None);
        state.tick(Duration::ZERO);
        state.apply(RenderCommand::SetMode(DisplayMode::Rain), MS);
        state.apply(RenderCommand::SetSignal(Some(-60)), MS);

        let status = state.status();
        assert_eq!(status.mode, DisplayMode::Rain);
        assert_eq!(status.engine, "rain");
        assert_eq!(status.signal_dbm, Some(-60));
        assert_eq!(status.frames, 1);

        state.apply(RenderCommand::NextMode, 2 * MS);
        assert_eq!(state.status().mode, DisplayMode::Signal);
        assert_eq!(state.status().engine, "none");
    }

    #[test]
    fn too_dim_brightness_is_ignored() {
        let mut state = state_with((), None);
        state.apply(RenderCommand::SetBrightness(3), Duration::ZERO);
        assert_eq!(state.status().brightness, 100);
        state.apply(RenderCommand::SetBrightness(255), Duration::ZERO);
        assert_eq!(state.status().brightness, 255);
        assert_eq!(state.canvas().brightness().pwm().duty(), 0);
    }

    #[test]
    fn button_advances_mode() {
        let mut state = state_with(PressOnce { polls: 0, at: 2 }, None);
        state.tick(Duration::ZERO);
        assert_eq!(state.status().mode, DisplayMode::Time);
        state.tick(50 * MS);
        assert_eq!(state.status().mode, DisplayMode::Seconds);
    }

    #[test]
    fn mode_and_brightness_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut state = state_with((), Some(path.clone()));

        state.apply(RenderCommand::SetMode(DisplayMode::Life), Duration::ZERO);
        state.apply(RenderCommand::SetBrightness(42), Duration::ZERO);

        let saved = Settings::read(&path).unwrap();
        assert_eq!(
            saved,
            Settings {
                brightness: 42,
                display_mode: DisplayMode::Life,
            }
        );
    }

    #[test]
    fn startup_leaves_checkmark_at_stored_brightness() {
        let mut state = state_with((), None);
        state.play_startup(&mut NoDelay);
        assert_eq!(state.canvas().brightness().level(), 100);
        assert_eq!(state.canvas().surface().lit_count(), crate::views::CHECKMARK.len());
    }

    #[test]
    fn loop_publishes_status_and_stops_when_senders_drop() {
        let (tx, rx) = mpsc::channel();
        let status = Arc::new(Mutex::new(DisplayStatus::new(&Settings::default())));
        let running = Arc::new(AtomicBool::new(true));

        tx.send(RenderCommand::SetMode(DisplayMode::Date)).unwrap();
        tx.send(RenderCommand::SetWeather(WeatherReport {
            temperature: 7.0,
            condition: "Clear".into(),
        }))
        .unwrap();
        drop(tx);

        render_loop(
            rx,
            Arc::clone(&status),
            state_with((), None),
            ManualClock::new(),
            Duration::ZERO,
            running,
        );

        // Queued commands are applied and published before the loop exits.
        let snapshot = status.lock().unwrap().clone();
        assert_eq!(snapshot.mode, DisplayMode::Date);
        assert_eq!(snapshot.engine, "none");
        assert_eq!(snapshot.weather.map(|w| w.condition), Some("Clear".to_string()));
        assert_eq!(snapshot.frames, 1);
    }

    #[test]
    fn loop_exits_when_running_flag_clears() {
        let (tx, rx) = mpsc::channel();
        let status = Arc::new(Mutex::new(DisplayStatus::new(&Settings::default())));
        let running = Arc::new(AtomicBool::new(false));
        tx.send(RenderCommand::NextMode).unwrap();

        render_loop(rx, Arc::clone(&status), state_with((), None), ManualClock::new(), MS, running);
        assert_eq!(status.lock().unwrap().frames, 0);
    }
}
