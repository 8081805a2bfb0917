//! The logical 16×16 pixel surface.
//!
//! Everything that draws goes through [`PixelSurface::set_pixel`], which
//! applies the panel orientation exactly once. The surface knows nothing
//! about the shift register; [`crate::hw_map`] translates it later.

use crate::{HEIGHT, WIDTH};

// ── Orientation ──────────────────────────────────────────────────────

/// How the panel is mounted relative to the logical coordinate system.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Orientation {
    Normal,
    /// Panel is mounted upside down: `x' = 15 - x`, `y' = 15 - y`.
    #[default]
    Rotated180,
}

impl Orientation {
    /// Map a logical coordinate to its storage coordinate.
    ///
    /// Callers must pass in-range coordinates. Applying the transform twice
    /// yields the original coordinate.
    pub fn apply(self, x: usize, y: usize) -> (usize, usize) {
        match self {
            Orientation::Normal => (x, y),
            Orientation::Rotated180 => (WIDTH - 1 - x, HEIGHT - 1 - y),
        }
    }
}

// ── PixelSurface ─────────────────────────────────────────────────────

/// 16×16 intensity buffer. `0` is off, anything else is lit.
///
/// Lit pixels store the brightness level that was current when they were
/// written. The level is never stored as zero, so dimming the panel to
/// brightness 0 does not turn pixels off; dimming is the PWM's job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelSurface {
    cells: [[u8; WIDTH]; HEIGHT],
    orientation: Orientation,
    level: u8,
}

impl PixelSurface {
    pub fn new(orientation: Orientation) -> Self {
        Self {
            cells: [[0; WIDTH]; HEIGHT],
            orientation,
            level: u8::MAX,
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Set the intensity used for subsequent lit pixels.
    pub fn set_level(&mut self, level: u8) {
        self.level = level.max(1);
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Light or clear one logical pixel. Out-of-range coordinates are ignored.
    pub fn set_pixel(&mut self, x: i32, y: i32, on: bool) {
        let Some((x, y)) = in_bounds(x, y) else {
            return;
        };
        let (sx, sy) = self.orientation.apply(x, y);
        self.cells[sy][sx] = if on { self.level } else { 0 };
    }

    /// Is the logical pixel at `(x, y)` lit? Out-of-range reads are `false`.
    pub fn is_lit(&self, x: i32, y: i32) -> bool {
        match in_bounds(x, y) {
            Some((x, y)) => {
                let (sx, sy) = self.orientation.apply(x, y);
                self.cells[sy][sx] > 0
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.cells = [[0; WIDTH]; HEIGHT];
    }

    /// Rows in storage order (after rotation), as the hardware sees them.
    pub fn storage_rows(&self) -> &[[u8; WIDTH]; HEIGHT] {
        &self.cells
    }

    pub fn lit_count(&self) -> usize {
        self.cells.iter().flatten().filter(|&&v| v > 0).count()
    }
}

impl Default for PixelSurface {
    fn default() -> Self {
        Self::new(Orientation::default())
    }
}

fn in_bounds(x: i32, y: i32) -> Option<(usize, usize)> {
    let x = usize::try_from(x).ok().filter(|&x| x < WIDTH)?;
    let y = usize::try_from(y).ok().filter(|&y| y < HEIGHT)?;
    Some((x, y))
}
