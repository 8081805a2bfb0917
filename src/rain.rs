//! Falling "digital rain".
//!
//! Every column falls at its own pace. Rendering runs on a separate ~60 Hz
//! gate and fakes a brightness gradient along each trail with a 4-phase
//! dither: segments near the head are shown on more phases than those near
//! the tail.

use crate::clock::FrameGate;
use crate::matrix::Canvas;
use crate::rng::Rng;
use crate::{HEIGHT, WIDTH};
use std::time::Duration;

pub const RENDER_PERIOD: Duration = Duration::from_millis(16);
pub const SPAWN_CHANCE_PERCENT: u32 = 12;
pub const MIN_TRAIL: u32 = 3;
pub const MAX_TRAIL: u32 = 12;
pub const MIN_STEP_MS: u32 = 60;
pub const MAX_STEP_MS: u32 = 139;

const DITHER_PHASES: u32 = 4;
/// Head row of an idle column.
pub const INACTIVE: i32 = -1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RainColumn {
    pub head: i32,
    pub trail: u32,
    pub step_interval: Duration,
    pub last_step: Duration,
}

impl RainColumn {
    const IDLE: Self = Self {
        head: INACTIVE,
        trail: MIN_TRAIL,
        step_interval: Duration::from_millis(MIN_STEP_MS as u64),
        last_step: Duration::ZERO,
    };

    pub fn is_active(&self) -> bool {
        self.head >= 0
    }

    fn reroll(&mut self, rng: &mut Rng) {
        self.trail = rng.between(MIN_TRAIL, MAX_TRAIL);
        self.step_interval = Duration::from_millis(u64::from(rng.between(MIN_STEP_MS, MAX_STEP_MS)));
    }

    /// Once the last trail segment has passed the bottom row the column goes idle.
    fn fully_fallen(&self) -> bool {
        self.head >= (HEIGHT - 1) as i32 + self.trail as i32
    }
}

pub struct Rain {
    columns: [RainColumn; WIDTH],
    phase: u32,
    running: bool,
    render_gate: FrameGate,
    rng: Rng,
    frames: u64,
}

impl Rain {
    pub fn new(rng: Rng) -> Self {
        Self {
            columns: [RainColumn::IDLE; WIDTH],
            phase: 0,
            running: false,
            render_gate: FrameGate::new(RENDER_PERIOD),
            rng,
            frames: 0,
        }
    }

    /// Idle every column with a fresh trail length and pace.
    pub fn start(&mut self, now: Duration) {
        for column in self.columns.iter_mut() {
            column.head = INACTIVE;
            column.last_step = now;
            column.reroll(&mut self.rng);
        }
        self.phase = 0;
        self.frames = 0;
        self.render_gate.restart(now);
        self.running = true;
        tracing::info!("Rain started");
    }

    pub fn stop<C: Canvas + ?Sized>(&mut self, canvas: &mut C) {
        self.running = false;
        canvas.clear();
        canvas.render();
        tracing::info!("Rain stopped after {} frames", self.frames);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn columns(&self) -> &[RainColumn; WIDTH] {
        &self.columns
    }

    pub fn phase(&self) -> u32 {
        self.phase
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Spawn and advance columns, then render if a frame is due. Returns
    /// whether a frame was committed.
    pub fn update<C: Canvas + ?Sized>(&mut self, now: Duration, canvas: &mut C) -> bool {
        if !self.running {
            return false;
        }
        self.advance_columns(now);

        if !self.render_gate.ready(now) {
            return false;
        }
        self.draw(canvas);
        self.phase = (self.phase + 1) % DITHER_PHASES;
        self.frames += 1;
        true
    }

    fn advance_columns(&mut self, now: Duration) {
        for column in self.columns.iter_mut() {
            if !column.is_active() && self.rng.chance(SPAWN_CHANCE_PERCENT) {
                column.head = 0;
                column.last_step = now;
                column.reroll(&mut self.rng);
            }
        }

        for column in self.columns.iter_mut() {
            if column.is_active() && now.saturating_sub(column.last_step) >= column.step_interval {
                column.last_step = now;
                column.head += 1;
                if column.fully_fallen() {
                    column.head = INACTIVE;
                }
            }
        }
    }

    /// Draw every active column at the current dither phase. Commits once.
    pub fn draw<C: Canvas + ?Sized>(&self, canvas: &mut C) {
        canvas.clear();
        for (x, column) in self.columns.iter().enumerate() {
            if !column.is_active() {
                continue;
            }
            for d in 0..column.trail {
                let y = column.head - d as i32;
                if !(0..HEIGHT as i32).contains(&y) {
                    continue;
                }
                if segment_visible(d, column.trail, self.phase, x, y) {
                    canvas.set_pixel(x as i32, y, true);
                }
            }
        }
        canvas.render();
    }
}

/// Whether trail segment `d` (0 = head) shows on dither `phase`.
///
/// A segment is lit on `visible_phases` of every 4 frames; the per-pixel
/// jitter only shifts which frames those are.
fn segment_visible(d: u32, trail: u32, phase: u32, x: usize, y: i32) -> bool {
    if d == 0 {
        return true;
    }
    let visible_phases = ((trail - d) * DITHER_PHASES / trail).clamp(1, DITHER_PHASES);
    let jitter = (x as u32 * 7 + y as u32 * 3) % DITHER_PHASES;
    (phase + jitter) % DITHER_PHASES < visible_phases
}
