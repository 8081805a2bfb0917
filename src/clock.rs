//! Time sources.
//!
//! Engines never read a clock themselves: the host loop reads a [`Clock`]
//! once per tick and passes the monotonic `now` down. [`FrameGate`] turns
//! that into the "has my interval elapsed?" check every engine uses.
//! Wall-clock time for the static faces comes from a [`TimeSource`].

use embedded_hal::delay::DelayNs;
use std::cell::Cell;
use std::time::{Duration, Instant};
use time::{OffsetDateTime, UtcOffset};

// ── Monotonic clocks ─────────────────────────────────────────────────

/// Monotonic time elapsed since some fixed origin.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// [`Instant`]-backed clock measuring from its construction.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

// ── FrameGate ────────────────────────────────────────────────────────

/// Non-blocking interval check.
///
/// `ready` returns `true` at most once per `period` and remembers when it
/// did. Calls in between are cheap no-ops, which is what lets every engine's
/// `update` be called on every tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameGate {
    period: Duration,
    last: Duration,
}

impl FrameGate {
    pub const fn new(period: Duration) -> Self {
        Self {
            period,
            last: Duration::ZERO,
        }
    }

    /// Start a fresh interval at `now`.
    pub fn restart(&mut self, now: Duration) {
        self.last = now;
    }

    pub fn ready(&mut self, now: Duration) -> bool {
        if now.saturating_sub(self.last) >= self.period {
            self.last = now;
            true
        } else {
            false
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn set_period(&mut self, period: Duration) {
        self.period = period;
    }
}

// ── Wall clock ───────────────────────────────────────────────────────

/// Calendar fields the static faces need.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WallTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub day: u8,
    pub month: u8,
}

pub trait TimeSource {
    fn wall_time(&self) -> WallTime;
}

/// System clock, optionally shifted by a fixed UTC offset.
///
/// Without an offset the local zone is used when the platform can report it
/// and UTC otherwise.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemTimeSource {
    offset: Option<UtcOffset>,
}

impl SystemTimeSource {
    pub fn new(offset: Option<UtcOffset>) -> Self {
        Self { offset }
    }

    /// Build from a whole-hour offset such as `+1` or `-5`.
    pub fn with_offset_hours(hours: i8) -> Result<Self, time::error::ComponentRange> {
        Ok(Self::new(Some(UtcOffset::from_hms(hours, 0, 0)?)))
    }
}

impl TimeSource for SystemTimeSource {
    fn wall_time(&self) -> WallTime {
        let now = match self.offset {
            Some(offset) => OffsetDateTime::now_utc().to_offset(offset),
            None => OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc()),
        };
        WallTime {
            hour: now.hour(),
            minute: now.minute(),
            second: now.second(),
            day: now.day(),
            month: u8::from(now.month()),
        }
    }
}

/// Always reports the same time.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedTime(pub WallTime);

impl TimeSource for FixedTime {
    fn wall_time(&self) -> WallTime {
        self.0
    }
}

// ── Blocking delay ───────────────────────────────────────────────────

/// `DelayNs` on top of `std::thread::sleep`, for the blocking startup
/// animations.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn gate_fires_once_per_period() {
        let mut gate = FrameGate::new(60 * MS);
        gate.restart(Duration::ZERO);

        assert!(!gate.ready(59 * MS));
        assert!(gate.ready(60 * MS));
        assert!(!gate.ready(100 * MS));
        assert!(gate.ready(120 * MS));
    }

    #[test]
    fn gate_tolerates_time_before_restart() {
        let mut gate = FrameGate::new(10 * MS);
        gate.restart(50 * MS);
        assert!(!gate.ready(40 * MS));
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new();
        clock.advance(5 * MS);
        clock.advance(7 * MS);
        assert_eq!(clock.now(), 12 * MS);
        clock.set(MS);
        assert_eq!(clock.now(), MS);
    }

    #[test]
    fn fixed_offset_produces_valid_fields() {
        let source = SystemTimeSource::with_offset_hours(2).unwrap();
        let now = source.wall_time();
        assert!(now.hour < 24);
        assert!(now.minute < 60);
        assert!((1..=12).contains(&now.month));
        assert!((1..=31).contains(&now.day));
    }
}
