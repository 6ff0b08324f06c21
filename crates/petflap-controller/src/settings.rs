//! Extended settings menu and the relock delay adjustment.
//!
//! The menu is armed by a both-buttons press of medium length. While it is
//! armed, green steps the cursor backward, red steps it forward (both
//! cyclic) and another both-buttons press activates the selected entry,
//! which disarms the menu.
//!
//! Activating [`SettingsCursor::LockTime`] starts a [`LockTimeAdjust`]: the
//! next button hold sets the relock delay. It is polled once per scheduler
//! pass and never blocks.

use petflap_core::{
    SettingsCursor,
    constants::{MAX_RELOCK_DELAY_MS, MIN_RELOCK_DELAY_MS},
};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SettingsMenu {
    cursor: SettingsCursor,
    armed: bool,
}

impl SettingsMenu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn cursor(&self) -> SettingsCursor {
        self.cursor
    }

    /// Arm the menu with the cursor on [`SettingsCursor::Exit`].
    pub fn arm(&mut self) -> SettingsCursor {
        self.armed = true;
        self.cursor = SettingsCursor::Exit;
        self.cursor
    }

    pub fn disarm(&mut self) {
        self.armed = false;
    }

    pub fn back(&mut self) -> SettingsCursor {
        self.cursor = self.cursor.prev();
        self.cursor
    }

    pub fn forward(&mut self) -> SettingsCursor {
        self.cursor = self.cursor.next();
        self.cursor
    }

    /// Disarm and return the entry to apply.
    pub fn activate(&mut self) -> SettingsCursor {
        self.armed = false;
        self.cursor
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LockTimeState {
    #[default]
    Inactive,
    /// Waiting for the buttons of the activating gesture to be released.
    AwaitRelease { since_ms: u32 },
    /// Waiting for the hold that sets the delay.
    AwaitPress { since_ms: u32 },
    Holding { pressed_at_ms: u32 },
}

/// Result of a finished adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockTimeOutcome {
    /// New relock delay, already clamped to its valid range.
    Set(u32),
    /// Nothing happened within the inactivity timeout.
    TimedOut,
}

/// Relock delay adjustment by press-and-hold duration.
///
/// Each waiting state, and the hold itself, gives up after
/// `inactivity_ms`, leaving the delay unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LockTimeAdjust {
    state: LockTimeState,
    inactivity_ms: u32,
}

impl LockTimeAdjust {
    pub fn new(inactivity_ms: u32) -> Self {
        Self {
            state: LockTimeState::Inactive,
            inactivity_ms,
        }
    }

    pub fn state(&self) -> LockTimeState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != LockTimeState::Inactive
    }

    pub fn enter(&mut self, now_ms: u32) {
        self.state = LockTimeState::AwaitRelease { since_ms: now_ms };
    }

    /// Advance with the current button level (`true` while any is down).
    pub fn poll(&mut self, pressed: bool, now_ms: u32) -> Option<LockTimeOutcome> {
        let (next, outcome) = match self.state {
            LockTimeState::Inactive => return None,
            LockTimeState::AwaitRelease { since_ms } | LockTimeState::AwaitPress { since_ms }
                if now_ms.wrapping_sub(since_ms) > self.inactivity_ms =>
            {
                (LockTimeState::Inactive, Some(LockTimeOutcome::TimedOut))
            }
            LockTimeState::AwaitRelease { since_ms } => {
                if pressed {
                    (LockTimeState::AwaitRelease { since_ms }, None)
                } else {
                    (LockTimeState::AwaitPress { since_ms: now_ms }, None)
                }
            }
            LockTimeState::AwaitPress { since_ms } => {
                if pressed {
                    (LockTimeState::Holding { pressed_at_ms: now_ms }, None)
                } else {
                    (LockTimeState::AwaitPress { since_ms }, None)
                }
            }
            LockTimeState::Holding { pressed_at_ms } => {
                let held = now_ms.wrapping_sub(pressed_at_ms);
                if held > self.inactivity_ms {
                    (LockTimeState::Inactive, Some(LockTimeOutcome::TimedOut))
                } else if pressed {
                    (LockTimeState::Holding { pressed_at_ms }, None)
                } else {
                    let delay = held.clamp(MIN_RELOCK_DELAY_MS, MAX_RELOCK_DELAY_MS);
                    (LockTimeState::Inactive, Some(LockTimeOutcome::Set(delay)))
                }
            }
        };
        if next != self.state {
            debug!(from = ?self.state, to = ?next, "Lock time adjustment");
        }
        self.state = next;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petflap_core::constants::LOCK_TIME_INACTIVITY_MS;
    use rstest::rstest;

    #[test]
    fn test_arm_starts_at_exit() {
        let mut menu = SettingsMenu::new();
        menu.forward();
        assert_eq!(menu.arm(), SettingsCursor::Exit);
        assert!(menu.is_armed());
    }

    #[test]
    fn test_navigation_is_cyclic() {
        let mut menu = SettingsMenu::new();
        menu.arm();
        assert_eq!(menu.back(), SettingsCursor::Timer);
        assert_eq!(menu.forward(), SettingsCursor::Exit);
        for _ in 0..4 {
            menu.forward();
        }
        assert_eq!(menu.cursor(), SettingsCursor::LockTime);
        assert_eq!(menu.cursor().position(), 5);
    }

    #[test]
    fn test_activate_disarms() {
        let mut menu = SettingsMenu::new();
        menu.arm();
        menu.forward();
        assert_eq!(menu.activate(), SettingsCursor::Open);
        assert!(!menu.is_armed());
    }

    fn adjust() -> LockTimeAdjust {
        let mut adjust = LockTimeAdjust::new(LOCK_TIME_INACTIVITY_MS);
        adjust.enter(0);
        adjust
    }

    #[rstest]
    #[case(7_300, 7_300)]
    #[case(300, 1_000)]
    #[case(27_000, 25_000)]
    fn test_hold_sets_clamped_delay(#[case] hold: u32, #[case] expected: u32) {
        let mut adjust = adjust();
        assert_eq!(adjust.poll(false, 100), None);
        assert_eq!(adjust.poll(true, 1_000), None);
        assert_eq!(adjust.poll(true, 1_000 + hold / 2), None);
        assert_eq!(
            adjust.poll(false, 1_000 + hold),
            Some(LockTimeOutcome::Set(expected))
        );
        assert!(!adjust.is_active());
    }

    #[test]
    fn test_activating_gesture_is_not_taken_as_hold() {
        let mut adjust = adjust();
        // Button of the activating gesture still down.
        assert_eq!(adjust.poll(true, 50), None);
        assert!(matches!(adjust.state(), LockTimeState::AwaitRelease { .. }));
        assert_eq!(adjust.poll(false, 2_000), None);
        assert_eq!(adjust.poll(true, 3_000), None);
        assert_eq!(adjust.poll(false, 8_000), Some(LockTimeOutcome::Set(5_000)));
    }

    #[test]
    fn test_no_press_times_out() {
        let mut adjust = adjust();
        adjust.poll(false, 10);
        assert_eq!(adjust.poll(false, 20_000), None);
        assert_eq!(adjust.poll(false, 30_011), Some(LockTimeOutcome::TimedOut));
        assert!(!adjust.is_active());
    }

    #[test]
    fn test_endless_hold_times_out() {
        let mut adjust = adjust();
        adjust.poll(false, 0);
        adjust.poll(true, 100);
        assert_eq!(adjust.poll(true, 30_101), Some(LockTimeOutcome::TimedOut));
    }

    #[test]
    fn test_inactive_ignores_input() {
        let mut adjust = LockTimeAdjust::new(LOCK_TIME_INACTIVITY_MS);
        assert_eq!(adjust.poll(true, 0), None);
        assert_eq!(adjust.poll(false, 50_000), None);
        assert!(!adjust.is_active());
    }
}
