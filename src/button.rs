//! The mode-advance button.
//!
//! The scheduler only ever sees "was the button pressed since last poll".
//! Debouncing lives here.

use embedded_hal::digital::InputPin;
use std::time::Duration;

/// Minimum time between two accepted presses.
pub const PRESS_LOCKOUT: Duration = Duration::from_millis(300);

/// Edge-triggered "advance mode" source.
pub trait ModeInput {
    /// `true` once per accepted press.
    fn poll(&mut self, now: Duration) -> bool;
}

/// No button attached.
impl ModeInput for () {
    fn poll(&mut self, _now: Duration) -> bool {
        false
    }
}

/// Active-low push button with a pull-up.
///
/// A press is a high→low edge at least [`PRESS_LOCKOUT`] after the previous
/// accepted press. Read errors count as "not pressed".
pub struct DebouncedButton<P> {
    pin: P,
    was_high: bool,
    last_press: Option<Duration>,
    lockout: Duration,
}

impl<P: InputPin> DebouncedButton<P> {
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            was_high: true,
            last_press: None,
            lockout: PRESS_LOCKOUT,
        }
    }

    pub fn with_lockout(mut self, lockout: Duration) -> Self {
        self.lockout = lockout;
        self
    }
}

impl<P: InputPin> ModeInput for DebouncedButton<P> {
    fn poll(&mut self, now: Duration) -> bool {
        let high = match self.pin.is_high() {
            Ok(high) => high,
            Err(e) => {
                tracing::warn!("Button read failed: {:?}", e);
                true
            }
        };
        let falling = self.was_high && !high;
        self.was_high = high;

        if !falling {
            return false;
        }
        let locked = self
            .last_press
            .is_some_and(|last| now.saturating_sub(last) <= self.lockout);
        if locked {
            return false;
        }
        self.last_press = Some(now);
        tracing::info!("Button pressed");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;

    /// Replays a fixed sequence of levels; stays high once exhausted.
    struct ScriptedPin {
        levels: VecDeque<bool>,
    }

    impl ScriptedPin {
        fn new(levels: &[bool]) -> Self {
            Self {
                levels: levels.iter().copied().collect(),
            }
        }
    }

    impl ErrorType for ScriptedPin {
        type Error = Infallible;
    }

    impl InputPin for ScriptedPin {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            Ok(self.levels.pop_front().unwrap_or(true))
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            self.is_high().map(|h| !h)
        }
    }

    fn presses(levels: &[bool], step: Duration) -> Vec<bool> {
        let mut button = DebouncedButton::new(ScriptedPin::new(levels));
        (0..levels.len())
            .map(|i| button.poll(step * i as u32))
            .collect()
    }

    #[test]
    fn holding_the_button_fires_once() {
        let ms50 = Duration::from_millis(50);
        assert_eq!(
            presses(&[true, false, false, false, false, true], ms50),
            vec![false, true, false, false, false, false]
        );
    }

    #[test]
    fn bounces_inside_lockout_are_ignored() {
        let ms50 = Duration::from_millis(50);
        assert_eq!(
            presses(&[false, true, false, true, true, true, true, false], ms50),
            vec![true, false, false, false, false, false, false, true]
        );
    }

    #[test]
    fn no_button_never_fires() {
        let mut none = ();
        assert!(!none.poll(Duration::from_secs(1)));
    }
}
