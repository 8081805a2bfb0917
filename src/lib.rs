//! A 16×16 monochrome LED clock driven through chained shift registers.
//!
//! The library is layered bottom-up:
//! - `surface`, `hw_map`, `driver`, `brightness`, `matrix`: pixels in,
//!   latched bits and PWM out
//! - `font`, `glyph`, `views`, `animations`: drawing on a [`matrix::Canvas`]
//! - `life`, `pong`, `rain`: the animation engines
//! - `scheduler`: picks which of the above owns the panel
//! - `render`, `server`, `settings`, `button`: the device around it
//!
//! This module also holds the panel dimensions, the GPIO pin defaults, and
//! the Ctrl+C handling shared by the binary.

pub mod animations;
pub mod brightness;
pub mod button;
pub mod clock;
pub mod driver;
pub mod font;
pub mod glyph;
#[cfg(feature = "hardware")]
pub mod hardware;
pub mod hw_map;
pub mod life;
pub mod matrix;
pub mod pong;
pub mod rain;
pub mod render;
pub mod rng;
pub mod scheduler;
pub mod server;
pub mod settings;
pub mod surface;
pub mod views;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub const WIDTH: usize = 16;
pub const HEIGHT: usize = 16;
pub const PIXEL_COUNT: usize = WIDTH * HEIGHT;

// ── Pin configuration ──────────────────────────────────────────────

/// BCM GPIO numbers for the panel and the button.
///
/// The panel needs three serial lines plus the active-low output enable,
/// which doubles as the brightness PWM.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinConfig {
    pub data: u8,
    pub clock: u8,
    pub latch: u8,
    pub enable: u8,
    pub button: u8,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            data: 23,
            clock: 18,
            latch: 19,
            enable: 5,
            button: 22,
        }
    }
}

impl PinConfig {
    /// `true` when no GPIO is assigned twice.
    pub fn is_distinct(&self) -> bool {
        let pins = [self.data, self.clock, self.latch, self.enable, self.button];
        pins.iter()
            .enumerate()
            .all(|(i, p)| !pins[i + 1..].contains(p))
    }
}

// ── Shutdown signal ────────────────────────────────────────────────

/// Set up a Ctrl+C handler that sets `running` to false.
///
/// # Rust concept: Arc and AtomicBool
/// The flag is shared between the render thread, the HTTP server's
/// shutdown future and the signal handler. `AtomicBool` needs no mutex.
pub fn setup_signal_handler() -> Result<Arc<AtomicBool>, ctrlc::Error> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    Ok(running)
}

/// Check if the main loop should keep running.
pub fn is_running(running: &AtomicBool) -> bool {
    running.load(Ordering::SeqCst)
}

// ── Tests ──────────────────────────────────────────────────────────
