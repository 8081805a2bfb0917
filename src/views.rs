//! Static faces: everything the scheduler shows that isn't an engine.
//!
//! Each `draw_*` owns the whole frame: clear, draw, commit once.

use crate::clock::WallTime;
use crate::glyph::{draw_digit, draw_text, draw_text_2x2, draw_time, draw_two_rows};
use crate::matrix::Canvas;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

type Point = (u8, u8);

/// Digits row for single-line numbers (seconds, temperature).
const SECONDS_Y: i32 = 5;
const TEMPERATURE_Y: i32 = 4;
const DEGREE_DOT: Point = (15, 3);
const MINUS_BAR: [Point; 3] = [(2, 5), (3, 5), (4, 5)];
const DATE_DOTS: [Point; 2] = [(15, 6), (15, 15)];

pub const CHECKMARK: [Point; 9] = [
    (3, 8),
    (4, 9),
    (5, 10),
    (6, 9),
    (7, 8),
    (8, 7),
    (9, 6),
    (10, 5),
    (11, 4),
];

// ── Weather icon templates ───────────────────────────────────────────

#[rustfmt::skip]
const CLOUD_BASE: &[Point] = &[
    (5, 3), (6, 3), (7, 3), (8, 3), (9, 3),
    (3, 4), (4, 4), (10, 4), (11, 4), (12, 4),
    (1, 5), (2, 5), (5, 5), (6, 5), (13, 5), (14, 5),
    (0, 6), (1, 6), (11, 6), (12, 6), (15, 6),
    (1, 7), (2, 7), (15, 7), (2, 8), (3, 8), (14, 8),
    (3, 9), (4, 9), (5, 9), (6, 9), (7, 9), (8, 9), (9, 9), (10, 9), (11, 9), (12, 9), (13, 9),
];

#[rustfmt::skip]
const CLOUD_OUTLINE: &[Point] = &[
    (5, 4), (6, 4), (7, 4), (8, 4), (9, 4),
    (3, 5), (4, 5), (10, 5), (11, 5), (12, 5),
    (1, 6), (2, 6), (5, 6), (6, 6), (13, 6), (14, 6),
    (0, 7), (1, 7), (11, 7), (12, 7), (15, 7),
    (1, 8), (2, 8), (15, 8), (2, 9), (3, 9), (14, 9),
    (3, 10), (4, 10), (5, 10), (6, 10), (7, 10), (8, 10), (9, 10), (10, 10), (11, 10), (12, 10), (13, 10),
];

#[rustfmt::skip]
const RAIN_DROPS: [Point; 9] = [
    (5, 10), (7, 10), (9, 10),
    (6, 11), (8, 11), (10, 11),
    (7, 12), (9, 12), (11, 12),
];

const SNOWFLAKES: [Point; 3] = [(5, 11), (9, 12), (13, 11)];

#[rustfmt::skip]
const LIGHTNING: [Point; 8] = [
    (7, 10), (7, 11), (8, 11), (8, 12),
    (9, 12), (9, 13), (10, 13), (10, 14),
];

#[rustfmt::skip]
const SUN_CORE: [Point; 20] = [
    (6, 6), (7, 6), (8, 6), (9, 6),
    (5, 7), (6, 7), (7, 7), (8, 7), (9, 7), (10, 7),
    (5, 8), (6, 8), (7, 8), (8, 8), (9, 8), (10, 8),
    (6, 9), (7, 9), (8, 9), (9, 9),
];

#[rustfmt::skip]
const SUN_RAYS: [Point; 16] = [
    (7, 4), (8, 4), (4, 5), (11, 5),
    (3, 7), (12, 7), (4, 10), (11, 10),
    (7, 11), (8, 11), (2, 7), (13, 7),
    (3, 5), (12, 5), (3, 10), (12, 10),
];

const FOG_ROWS: [u8; 3] = [4, 6, 8];
const FOG_COLUMNS: std::ops::RangeInclusive<u8> = 2..=13;

fn plot<C: Canvas + ?Sized>(canvas: &mut C, points: &[Point]) {
    for &(x, y) in points {
        canvas.set_pixel(i32::from(x), i32::from(y), true);
    }
}

// ── Clock faces ──────────────────────────────────────────────────────

/// Seconds as two digits on the middle rows.
pub fn draw_seconds<C: Canvas + ?Sized>(canvas: &mut C, second: u8) {
    canvas.clear();
    draw_digit(canvas, second / 10 % 10, 2, SECONDS_Y);
    draw_digit(canvas, second % 10, 9, SECONDS_Y);
    canvas.render();
}

/// Day over month, with a dot after each.
pub fn draw_date<C: Canvas + ?Sized>(canvas: &mut C, day: u8, month: u8) {
    canvas.clear();
    draw_two_rows(canvas, day, month);
    plot(canvas, &DATE_DOTS);
    canvas.render();
}

/// Auto mode shows seconds in these windows and the time otherwise.
pub fn in_seconds_window(second: u8) -> bool {
    matches!(second, 25..=29 | 55..=58)
}

pub fn draw_auto<C: Canvas + ?Sized>(canvas: &mut C, now: WallTime) {
    if in_seconds_window(now.second) {
        draw_seconds(canvas, now.second);
    } else {
        draw_time(canvas, now.hour, now.minute);
    }
}

// ── Weather ──────────────────────────────────────────────────────────

/// Latest weather reading pushed in by the host.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WeatherReport {
    /// Degrees Celsius
    pub temperature: f32,
    /// Free-form condition such as "Clouds", "Light Rain" or "Clear"
    pub condition: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeatherMode {
    Icon,
    Text,
}

impl WeatherMode {
    pub fn toggled(self) -> Self {
        match self {
            WeatherMode::Icon => WeatherMode::Text,
            WeatherMode::Text => WeatherMode::Icon,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeatherIcon {
    Cloud,
    Rain,
    Snow,
    Thunder,
    Sun,
    Fog,
}

impl WeatherIcon {
    /// Pick an icon by keyword. Rain and snow win over plain clouds.
    pub fn from_condition(condition: &str) -> Option<Self> {
        let has = |word: &str| condition.contains(word);
        if has("Cloud") && !has("Rain") && !has("Snow") {
            Some(WeatherIcon::Cloud)
        } else if has("Rain") {
            Some(WeatherIcon::Rain)
        } else if has("Snow") {
            Some(WeatherIcon::Snow)
        } else if has("Thunder") || has("Storm") {
            Some(WeatherIcon::Thunder)
        } else if has("Clear") || has("Sunny") {
            Some(WeatherIcon::Sun)
        } else if has("Fog") || has("Mist") || has("Haze") {
            Some(WeatherIcon::Fog)
        } else {
            None
        }
    }

    fn draw<C: Canvas + ?Sized>(self, canvas: &mut C) {
        match self {
            WeatherIcon::Cloud => plot(canvas, CLOUD_OUTLINE),
            WeatherIcon::Rain => {
                plot(canvas, CLOUD_BASE);
                plot(canvas, &RAIN_DROPS);
            }
            WeatherIcon::Snow => {
                plot(canvas, CLOUD_BASE);
                plot(canvas, &SNOWFLAKES);
            }
            WeatherIcon::Thunder => {
                plot(canvas, CLOUD_BASE);
                plot(canvas, &LIGHTNING);
            }
            WeatherIcon::Sun => {
                plot(canvas, &SUN_CORE);
                plot(canvas, &SUN_RAYS);
            }
            WeatherIcon::Fog => {
                for y in FOG_ROWS {
                    for x in FOG_COLUMNS {
                        // Thin the lines out a little.
                        if (x + y) % 3 != 0 {
                            canvas.set_pixel(i32::from(x), i32::from(y), true);
                        }
                    }
                }
            }
        }
    }
}

/// Rounded temperature: one centred digit or two, plus the degree dot.
fn draw_temperature<C: Canvas + ?Sized>(canvas: &mut C, temperature: f32, with_sign: bool) {
    let rounded = temperature.round() as i32;
    let magnitude = rounded.unsigned_abs().min(99) as u8;
    if magnitude >= 10 {
        draw_digit(canvas, magnitude / 10, 2, TEMPERATURE_Y);
        draw_digit(canvas, magnitude % 10, 9, TEMPERATURE_Y);
    } else {
        draw_digit(canvas, magnitude, 7, TEMPERATURE_Y);
    }
    plot(canvas, &[DEGREE_DOT]);
    if with_sign && rounded < 0 {
        plot(canvas, &MINUS_BAR);
    }
}

/// Weather as an icon or as the temperature. An unrecognised condition in
/// icon mode falls back to the (unsigned) temperature.
pub fn draw_weather<C: Canvas + ?Sized>(canvas: &mut C, report: &WeatherReport, mode: WeatherMode) {
    canvas.clear();
    match mode {
        WeatherMode::Text => draw_temperature(canvas, report.temperature, true),
        WeatherMode::Icon => match WeatherIcon::from_condition(&report.condition) {
            Some(icon) => icon.draw(canvas),
            None => draw_temperature(canvas, report.temperature, false),
        },
    }
    canvas.render();
}

/// Shown in place of the weather until the first report arrives.
pub fn draw_no_weather<C: Canvas + ?Sized>(canvas: &mut C) {
    draw_text(canvas, "NA");
}

// ── Signal strength ──────────────────────────────────────────────────

pub const MAX_BARS: u8 = 4;
const BAR_WIDTH: i32 = 3;
const BAR_PITCH: i32 = 4;

/// RSSI in dBm to 0–4 bars.
pub fn signal_bars(dbm: i32) -> u8 {
    match dbm {
        d if d >= -55 => 4,
        d if d >= -67 => 3,
        d if d >= -75 => 2,
        d if d >= -85 => 1,
        _ => 0,
    }
}

/// Four rising bars; missing bars keep only their baseline. Without a
/// reading the panel says "WIFI".
pub fn draw_signal<C: Canvas + ?Sized>(canvas: &mut C, dbm: Option<i32>) {
    let Some(dbm) = dbm else {
        draw_text_2x2(canvas, "WIFI");
        return;
    };
    let lit = signal_bars(dbm);
    let bottom = crate::HEIGHT as i32 - 1;

    canvas.clear();
    for bar in 0..MAX_BARS {
        let x0 = i32::from(bar) * BAR_PITCH;
        let height = if bar < lit { (i32::from(bar) + 1) * BAR_PITCH } else { 1 };
        for x in x0..x0 + BAR_WIDTH {
            for y in (bottom - height + 1)..=bottom {
                canvas.set_pixel(x, y, true);
            }
        }
    }
    canvas.render();
}

// ── Misc ─────────────────────────────────────────────────────────────

pub fn draw_checkmark<C: Canvas + ?Sized>(canvas: &mut C) {
    canvas.clear();
    plot(canvas, &CHECKMARK);
    canvas.render();
}

pub fn draw_off<C: Canvas + ?Sized>(canvas: &mut C) {
    canvas.clear();
    canvas.render();
}
