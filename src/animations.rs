//! One-shot blocking animations.
//!
//! These are the only parts of the display that sleep. They run before the
//! scheduler takes over (or right after a confirmed action) and always leave
//! the panel at the brightness the caller asked for.

use crate::matrix::Canvas;
use crate::views::CHECKMARK;
use crate::{HEIGHT, WIDTH};
use embedded_hal::delay::DelayNs;

const FRAME_MS: u32 = 30;
const FLASH_MS: u32 = 80;
const CHECK_STEP_MS: u32 = 60;
const FADE_PAUSE_MS: u32 = 200;
const FADE_STEP_MS: u32 = 50;
const CENTER: f32 = 7.5;
const FADE_MAX_RADIUS: u8 = 12;

fn fill_where<C, F>(canvas: &mut C, lit: F)
where
    C: Canvas + ?Sized,
    F: Fn(i32, i32) -> bool,
{
    canvas.clear();
    for y in 0..HEIGHT as i32 {
        for x in 0..WIDTH as i32 {
            if lit(x, y) {
                canvas.set_pixel(x, y, true);
            }
        }
    }
}

fn flash<C: Canvas + ?Sized, D: DelayNs>(canvas: &mut C, delay: &mut D, high: u8, low: u8) {
    for _ in 0..2 {
        canvas.set_brightness(high);
        canvas.render();
        delay.delay_ms(FLASH_MS);
        canvas.set_brightness(low);
        canvas.render();
        delay.delay_ms(FLASH_MS);
    }
}

/// Clear the panel outward from the centre, one radius step at a time.
fn fade_out_circle<C: Canvas + ?Sized, D: DelayNs>(canvas: &mut C, delay: &mut D) {
    delay.delay_ms(FADE_PAUSE_MS);
    for radius in 0..=FADE_MAX_RADIUS {
        let radius = f32::from(radius);
        for y in 0..HEIGHT as i32 {
            for x in 0..WIDTH as i32 {
                let (dx, dy) = (x as f32 - CENTER, y as f32 - CENTER);
                if (dx * dx + dy * dy).sqrt() < radius {
                    canvas.set_pixel(x, y, false);
                }
            }
        }
        canvas.render();
        delay.delay_ms(FADE_STEP_MS);
    }
}

/// Boot animation: checkerboard sweep, diagonal wave, rising flood, a double
/// flash, then a circular fade-out. Ends blank at `brightness`.
pub fn startup_animation<C: Canvas + ?Sized, D: DelayNs>(canvas: &mut C, delay: &mut D, brightness: u8) {
    tracing::info!("Startup animation");
    canvas.clear();
    canvas.render();

    canvas.set_brightness(150);
    for step in 0..=WIDTH as i32 {
        fill_where(canvas, |x, y| x < step && (x + y) % 2 == 0);
        canvas.render();
        delay.delay_ms(FRAME_MS);
    }

    for frame in 0..24 {
        fill_where(canvas, |x, y| (x + y + frame) % 8 < 3);
        let level = 120.0 + 80.0 * (frame as f32 * 0.4).sin();
        canvas.set_brightness(level as u8);
        canvas.render();
        delay.delay_ms(FRAME_MS);
    }

    canvas.set_brightness(180);
    for step in (0..HEIGHT as i32).rev() {
        fill_where(canvas, |x, y| y >= step && (x + y + step) % 3 < 2);
        canvas.render();
        delay.delay_ms(FRAME_MS);
    }

    flash(canvas, delay, 255, 100);
    fade_out_circle(canvas, delay);

    canvas.clear();
    canvas.set_brightness(brightness);
    canvas.render();
    tracing::info!("Startup animation done");
}

/// Draw the checkmark stroke by stroke, flash it, and restore `brightness`.
/// The checkmark stays on the panel.
pub fn animate_checkmark<C: Canvas + ?Sized, D: DelayNs>(canvas: &mut C, delay: &mut D, brightness: u8) {
    canvas.clear();
    for &(x, y) in CHECKMARK.iter() {
        canvas.set_pixel(i32::from(x), i32::from(y), true);
        canvas.render();
        delay.delay_ms(CHECK_STEP_MS);
    }
    flash(canvas, delay, 255, 150);
    canvas.set_brightness(brightness);
    canvas.render();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::SimulatedMatrix;
    use crate::surface::Orientation;
    use pretty_assertions::assert_eq;

    /// Adds up requested delays instead of sleeping.
    #[derive(Default)]
    struct CountingDelay {
        total_ns: u64,
    }

    impl DelayNs for CountingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns += u64::from(ns);
        }
    }

    #[test]
    fn startup_ends_blank_at_requested_brightness() {
        let mut m = SimulatedMatrix::simulated(Orientation::Rotated180);
        let mut delay = CountingDelay::default();
        startup_animation(&mut m, &mut delay, 42);

        assert_eq!(m.surface().lit_count(), 0);
        assert_eq!(m.sink().latched().lit_count(), 0);
        assert_eq!(m.brightness().level(), 42);
        // Time-boxed: a few seconds at most.
        assert!(delay.total_ns < 5_000_000_000);
        assert!(delay.total_ns > 1_000_000_000);
    }

    #[test]
    fn checkmark_stays_lit_and_restores_brightness() {
        let mut m = SimulatedMatrix::simulated(Orientation::Normal);
        let mut delay = CountingDelay::default();
        animate_checkmark(&mut m, &mut delay, 200);

        assert_eq!(m.surface().lit_count(), CHECKMARK.len());
        assert_eq!(m.brightness().level(), 200);
        // One commit per stroke, four for the flash, one final.
        assert_eq!(m.commits(), CHECKMARK.len() as u64 + 5);
    }
}
