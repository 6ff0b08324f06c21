//! Press-duration classification of the two front panel buttons.
//!
//! Buttons are sampled once per scheduler pass. A press edge of either
//! button restarts the shared hold timer and clears the "both held" flag;
//! whenever both buttons are seen down together the flag is set. The
//! release edge that follows emits exactly one event:
//!
//! - [`ButtonEvent::Both`] if both buttons were held at some point,
//! - otherwise [`ButtonEvent::Green`] or [`ButtonEvent::Red`].
//!
//! A simultaneous press is therefore reported on the *first* release. The
//! later release of the other button is swallowed so that one gesture
//! yields one event. This intentionally departs from classifying every
//! release edge: reported on its own, that second release would carry the
//! full hold time as a single-button press, so a 6 s two-button hold would
//! also toggle Vet mode. Since every press edge restarts the timer, the hold
//! duration of a `Both` event is measured from the later of the two presses.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ButtonEvent {
    Green,
    Red,
    Both,
}

/// A classified release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ButtonPress {
    pub event: ButtonEvent,
    /// Hold duration in milliseconds.
    pub elapsed_ms: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ButtonClassifier {
    green_prev: bool,
    red_prev: bool,
    press_start_ms: u32,
    both_held: bool,
    swallow_release: bool,
}

impl ButtonClassifier {
    /// Classifier with both buttons assumed released.
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` while either button is down as of the last sample.
    pub fn any_held(&self) -> bool {
        self.green_prev || self.red_prev
    }

    /// Feed one sample of both buttons (`true` = pressed).
    pub fn sample(&mut self, green: bool, red: bool, now_ms: u32) -> Option<ButtonPress> {
        let green_pressed = green && !self.green_prev;
        let red_pressed = red && !self.red_prev;
        let green_released = !green && self.green_prev;
        let red_released = !red && self.red_prev;
        self.green_prev = green;
        self.red_prev = red;

        if green_pressed || red_pressed {
            self.press_start_ms = now_ms;
            self.both_held = false;
            self.swallow_release = false;
        }
        if green && red {
            self.both_held = true;
        }
        if !(green_released || red_released) {
            return None;
        }

        if self.swallow_release {
            self.swallow_release = false;
            return None;
        }

        let elapsed_ms = now_ms.wrapping_sub(self.press_start_ms);
        let event = if self.both_held {
            self.both_held = false;
            // The other button may still be down; its release belongs to
            // this gesture.
            self.swallow_release = green || red;
            ButtonEvent::Both
        } else if green_released {
            ButtonEvent::Green
        } else {
            ButtonEvent::Red
        };
        Some(ButtonPress { event, elapsed_ms })
    }
}
