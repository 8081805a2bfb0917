//! Mode state machine: decides who owns the panel on every tick.
//!
//! At most one engine exists at a time, held in [`ActiveEngine`]. Changing
//! mode stops the old engine (which blanks the panel) before the new mode
//! draws anything. Static faces are redrawn once per refresh period.
//!
//! ## Rust concepts
//! - An enum carrying each engine by value, so "only one engine runs" holds
//!   by construction
//! - `std::mem::replace` to move the old engine out before stopping it

use crate::clock::{FrameGate, WallTime};
use crate::glyph::draw_time;
use crate::life::Life;
use crate::matrix::Canvas;
use crate::pong::Pong;
use crate::rain::Rain;
use crate::rng::Rng;
use crate::views::{self, WeatherMode, WeatherReport};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use utoipa::ToSchema;

// ── DisplayMode ──────────────────────────────────────────────────────

/// Everything the panel can show, in button order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    #[default]
    Time,
    Seconds,
    Date,
    Weather,
    /// Time, switching to seconds around the half and full minute
    Auto,
    Life,
    Pong,
    Rain,
    Signal,
    Off,
}

impl DisplayMode {
    pub const ALL: [DisplayMode; 10] = [
        DisplayMode::Time,
        DisplayMode::Seconds,
        DisplayMode::Date,
        DisplayMode::Weather,
        DisplayMode::Auto,
        DisplayMode::Life,
        DisplayMode::Pong,
        DisplayMode::Rain,
        DisplayMode::Signal,
        DisplayMode::Off,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The following mode, wrapping from the last back to the first.
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn name(self) -> &'static str {
        match self {
            DisplayMode::Time => "time",
            DisplayMode::Seconds => "seconds",
            DisplayMode::Date => "date",
            DisplayMode::Weather => "weather",
            DisplayMode::Auto => "auto",
            DisplayMode::Life => "life",
            DisplayMode::Pong => "pong",
            DisplayMode::Rain => "rain",
            DisplayMode::Signal => "signal",
            DisplayMode::Off => "off",
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DisplayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<_> = Self::ALL.iter().map(|m| m.name()).collect();
                format!("unknown mode '{}', expected one of: {}", s, names.join(", "))
            })
    }
}

// ── ActiveEngine ─────────────────────────────────────────────────────

/// The one stateful engine allowed to draw, if any.
pub enum ActiveEngine {
    None,
    Life(Life),
    Pong(Pong),
    Rain(Rain),
}

impl ActiveEngine {
    pub fn name(&self) -> &'static str {
        match self {
            ActiveEngine::None => "none",
            ActiveEngine::Life(_) => "life",
            ActiveEngine::Pong(_) => "pong",
            ActiveEngine::Rain(_) => "rain",
        }
    }

    pub fn is_running(&self) -> bool {
        match self {
            ActiveEngine::None => false,
            ActiveEngine::Life(life) => life.is_running(),
            ActiveEngine::Pong(pong) => pong.is_running(),
            ActiveEngine::Rain(rain) => rain.is_running(),
        }
    }

    fn update<C: Canvas + ?Sized>(&mut self, now: Duration, canvas: &mut C) -> bool {
        match self {
            ActiveEngine::None => false,
            ActiveEngine::Life(life) => life.update(now, canvas),
            ActiveEngine::Pong(pong) => pong.update(now, canvas),
            ActiveEngine::Rain(rain) => rain.update(now, canvas),
        }
    }

    fn stop<C: Canvas + ?Sized>(&mut self, canvas: &mut C) {
        match self {
            ActiveEngine::None => {}
            ActiveEngine::Life(life) => life.stop(canvas),
            ActiveEngine::Pong(pong) => pong.stop(canvas),
            ActiveEngine::Rain(rain) => rain.stop(canvas),
        }
    }
}

// ── Configuration and inputs ─────────────────────────────────────────

/// How a freshly started Life board is populated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LifeSeed {
    /// ~30% random fill
    #[default]
    Random,
    /// A single glider near the top-left corner
    Glider,
}

#[derive(Clone, Copy, Debug)]
pub struct SchedulerConfig {
    pub life_step: Duration,
    pub life_seed: LifeSeed,
    /// Redraw period for static faces.
    pub static_refresh: Duration,
    /// Weather alternates between icon and text this often.
    pub weather_toggle: Duration,
    /// Seed for the engines' generators. `None` seeds from the clock.
    pub seed: Option<u32>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            life_step: Duration::from_millis(250),
            life_seed: LifeSeed::Random,
            static_refresh: Duration::from_secs(1),
            weather_toggle: Duration::from_secs(5),
            seed: None,
        }
    }
}

/// Outside data the static faces need on a given tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInputs<'a> {
    pub wall: WallTime,
    pub weather: Option<&'a WeatherReport>,
    pub signal_dbm: Option<i32>,
}

// ── Scheduler ────────────────────────────────────────────────────────

pub struct Scheduler {
    mode: DisplayMode,
    engine: ActiveEngine,
    config: SchedulerConfig,
    rng: Rng,
    refresh: FrameGate,
    weather_gate: FrameGate,
    weather_mode: WeatherMode,
    redraw_pending: bool,
    entered: bool,
}

impl Scheduler {
    /// A scheduler that shows `mode` once [`enter_mode`](Self::enter_mode)
    /// or the first [`tick`](Self::tick) runs.
    pub fn new(config: SchedulerConfig, mode: DisplayMode) -> Self {
        let rng = config.seed.map(Rng::new).unwrap_or_else(Rng::from_time);
        Self {
            mode,
            engine: ActiveEngine::None,
            config,
            rng,
            refresh: FrameGate::new(config.static_refresh),
            weather_gate: FrameGate::new(config.weather_toggle),
            weather_mode: WeatherMode::Text,
            redraw_pending: true,
            entered: false,
        }
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn engine(&self) -> &ActiveEngine {
        &self.engine
    }

    pub fn weather_mode(&self) -> WeatherMode {
        self.weather_mode
    }

    /// Current Life generation, when Life is the active engine.
    pub fn life_generation(&self) -> Option<u64> {
        match &self.engine {
            ActiveEngine::Life(life) => Some(life.generation()),
            _ => None,
        }
    }

    /// Switch to `mode`. Re-entering the current mode does nothing.
    ///
    /// The outgoing engine is stopped first, which blanks the panel. A new
    /// engine is started and draws its first frame immediately; static faces
    /// draw on the next tick.
    pub fn enter_mode<C: Canvas + ?Sized>(&mut self, mode: DisplayMode, now: Duration, canvas: &mut C) {
        if self.entered && mode == self.mode {
            return;
        }
        let mut previous = std::mem::replace(&mut self.engine, ActiveEngine::None);
        if previous.is_running() {
            previous.stop(canvas);
        }
        tracing::info!("Display mode {} -> {}", self.mode, mode);
        self.mode = mode;
        self.entered = true;
        self.redraw_pending = true;
        self.weather_mode = WeatherMode::Text;
        self.weather_gate.restart(now);

        self.engine = match mode {
            DisplayMode::Life => {
                let mut life = Life::new(self.config.life_step, Rng::new(self.rng.next_u32()));
                match self.config.life_seed {
                    LifeSeed::Random => life.randomize(crate::life::RESEED_FILL_PERCENT),
                    LifeSeed::Glider => life.spawn_glider(3, 3),
                }
                life.start(now);
                life.draw(canvas);
                ActiveEngine::Life(life)
            }
            DisplayMode::Pong => {
                let mut pong = Pong::new();
                pong.start(now);
                pong.draw(canvas);
                ActiveEngine::Pong(pong)
            }
            DisplayMode::Rain => {
                let mut rain = Rain::new(Rng::new(self.rng.next_u32()));
                rain.start(now);
                rain.draw(canvas);
                ActiveEngine::Rain(rain)
            }
            _ => ActiveEngine::None,
        };
    }

    pub fn next_mode<C: Canvas + ?Sized>(&mut self, now: Duration, canvas: &mut C) {
        self.enter_mode(self.mode.next(), now, canvas);
    }

    /// Drive whatever currently owns the panel. Cheap when nothing is due.
    /// Returns whether a frame was committed.
    pub fn tick<C: Canvas + ?Sized>(&mut self, now: Duration, canvas: &mut C, inputs: &FrameInputs<'_>) -> bool {
        if !self.entered {
            self.enter_mode(self.mode, now, canvas);
        }
        if !matches!(self.engine, ActiveEngine::None) {
            return self.engine.update(now, canvas);
        }

        if self.mode == DisplayMode::Weather && self.weather_gate.ready(now) {
            self.weather_mode = self.weather_mode.toggled();
            self.redraw_pending = true;
        }

        let due = if self.redraw_pending {
            self.refresh.restart(now);
            true
        } else {
            self.refresh.ready(now)
        };
        if !due {
            return false;
        }
        self.redraw_pending = false;
        self.draw_static(canvas, inputs);
        true
    }

    fn draw_static<C: Canvas + ?Sized>(&self, canvas: &mut C, inputs: &FrameInputs<'_>) {
        let wall = inputs.wall;
        match self.mode {
            DisplayMode::Time => draw_time(canvas, wall.hour, wall.minute),
            DisplayMode::Seconds => views::draw_seconds(canvas, wall.second),
            DisplayMode::Date => views::draw_date(canvas, wall.day, wall.month),
            DisplayMode::Weather => match inputs.weather {
                Some(report) => views::draw_weather(canvas, report, self.weather_mode),
                None => views::draw_no_weather(canvas),
            },
            DisplayMode::Auto => views::draw_auto(canvas, wall),
            DisplayMode::Signal => views::draw_signal(canvas, inputs.signal_dbm),
            DisplayMode::Off | DisplayMode::Life | DisplayMode::Pong | DisplayMode::Rain => {
                views::draw_off(canvas)
            }
        }
    }
}
