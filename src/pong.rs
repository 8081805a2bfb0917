//! Endless self-playing Pong: one ball, two AI paddles, no score.

use crate::clock::FrameGate;
use crate::matrix::Canvas;
use crate::{HEIGHT, WIDTH};
use std::time::Duration;

pub const FRAME_PERIOD: Duration = Duration::from_millis(60);
pub const PADDLE_WIDTH: i32 = 4;

const MAX_COORD: f32 = (WIDTH - 1) as f32;
const BOTTOM_ROW: f32 = (HEIGHT - 1) as f32;
const PADDLE_MAX_X: i32 = WIDTH as i32 - PADDLE_WIDTH;
/// Rows below this belong to the top paddle.
const MIDFIELD: f32 = (HEIGHT / 2) as f32;

/// Ball position and velocity plus both paddles' left edges.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BallState {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub paddle_top: i32,
    pub paddle_bottom: i32,
}

impl Default for BallState {
    fn default() -> Self {
        Self {
            x: 8.0,
            y: 8.0,
            vx: 0.8,
            vy: 0.6,
            paddle_top: 6,
            paddle_bottom: 6,
        }
    }
}

impl BallState {
    /// One simulated frame: move, bounce, then let the paddle on the ball's
    /// half chase it.
    pub fn advance(&mut self) {
        self.x += self.vx;
        self.y += self.vy;

        if self.x <= 0.0 {
            self.x = 0.0;
            self.vx = self.vx.abs();
        } else if self.x >= MAX_COORD {
            self.x = MAX_COORD;
            self.vx = -self.vx.abs();
        }

        // Clamp one row inside so the ball can't stick to the edge.
        if self.y <= 0.0 {
            self.y = 1.0;
            self.vy = self.vy.abs();
        } else if self.y >= BOTTOM_ROW {
            self.y = BOTTOM_ROW - 1.0;
            self.vy = -self.vy.abs();
        }

        let x = self.x;
        let paddle = if self.y < MIDFIELD {
            &mut self.paddle_top
        } else {
            &mut self.paddle_bottom
        };
        // Only react once the ball leaves the middle of the paddle.
        if x > (*paddle + 2) as f32 {
            *paddle += 1;
        } else if x < (*paddle + 1) as f32 {
            *paddle -= 1;
        }

        self.paddle_top = self.paddle_top.clamp(0, PADDLE_MAX_X);
        self.paddle_bottom = self.paddle_bottom.clamp(0, PADDLE_MAX_X);
    }

    /// Ball position snapped to the pixel grid.
    pub fn ball_pixel(&self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }
}

#[derive(Debug)]
pub struct Pong {
    state: BallState,
    running: bool,
    gate: FrameGate,
    frames: u64,
}

impl Default for Pong {
    fn default() -> Self {
        Self {
            state: BallState::default(),
            running: false,
            gate: FrameGate::new(FRAME_PERIOD),
            frames: 0,
        }
    }
}

impl Pong {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset ball and paddles to the serve position and start running.
    pub fn start(&mut self, now: Duration) {
        self.state = BallState::default();
        self.running = true;
        self.frames = 0;
        self.gate.restart(now);
        tracing::info!("Pong started");
    }

    pub fn stop<C: Canvas + ?Sized>(&mut self, canvas: &mut C) {
        self.running = false;
        canvas.clear();
        canvas.render();
        tracing::info!("Pong stopped after {} frames", self.frames);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn state(&self) -> &BallState {
        &self.state
    }

    /// Place the ball and paddles somewhere specific. Out-of-range values
    /// are pulled back onto the board.
    pub fn set_state(&mut self, state: BallState) {
        self.state = BallState {
            x: state.x.clamp(0.0, MAX_COORD),
            y: state.y.clamp(0.0, BOTTOM_ROW),
            paddle_top: state.paddle_top.clamp(0, PADDLE_MAX_X),
            paddle_bottom: state.paddle_bottom.clamp(0, PADDLE_MAX_X),
            ..state
        };
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn step(&mut self) {
        self.state.advance();
        self.frames += 1;
    }

    pub fn update<C: Canvas + ?Sized>(&mut self, now: Duration, canvas: &mut C) -> bool {
        if !self.running || !self.gate.ready(now) {
            return false;
        }
        self.step();
        self.draw(canvas);
        true
    }

    pub fn draw<C: Canvas + ?Sized>(&self, canvas: &mut C) {
        canvas.clear();
        let (bx, by) = self.state.ball_pixel();
        canvas.set_pixel(bx, by, true);
        for dx in 0..PADDLE_WIDTH {
            canvas.set_pixel(self.state.paddle_top + dx, 0, true);
            canvas.set_pixel(self.state.paddle_bottom + dx, HEIGHT as i32 - 1, true);
        }
        canvas.render();
    }
}
