//! Operating mode machine with transition history.
//!
//! The machine only tracks which [`OperatingMode`] is active and when it
//! changed. Applying the latch policy of a mode is the controller's job,
//! since it needs the actuator.
//!
//! # Transitions
//!
//! Every mode can be entered from every other mode: buttons and serial
//! commands both force modes directly. Learn and Clear are transient; the
//! controller runs them to completion within one scheduler pass and then
//! switches back to Normal.
//!
//! # Examples
//!
//! ```
//! use petflap_controller::ModeMachine;
//! use petflap_core::OperatingMode;
//!
//! let mut modes = ModeMachine::new();
//! modes.switch_to(OperatingMode::Vet, 1_000);
//! modes.switch_to(OperatingMode::Vet, 1_500);
//! modes.switch_to(OperatingMode::Normal, 2_000);
//!
//! assert_eq!(modes.current(), OperatingMode::Normal);
//! // Re-entering the active mode is not a transition.
//! assert_eq!(modes.history().len(), 2);
//! ```

use petflap_core::OperatingMode;
use serde::Serialize;
use std::collections::VecDeque;

/// Maximum number of transitions kept in history.
///
/// A transition is a few bytes, so the full history stays well under 1 KB.
const MAX_HISTORY_SIZE: usize = 100;

/// One recorded mode change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModeTransition {
    pub from: OperatingMode,
    pub to: OperatingMode,
    /// Millisecond counter at which the change happened.
    pub at_ms: u32,
}

impl ModeTransition {
    pub fn new(from: OperatingMode, to: OperatingMode, at_ms: u32) -> Self {
        Self { from, to, at_ms }
    }
}

#[derive(Debug, Clone)]
pub struct ModeMachine {
    current: OperatingMode,
    /// History of mode changes (limited to MAX_HISTORY_SIZE).
    history: VecDeque<ModeTransition>,
}

impl ModeMachine {
    /// Machine in Normal mode with an empty history.
    pub fn new() -> Self {
        Self {
            current: OperatingMode::Normal,
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    pub fn current(&self) -> OperatingMode {
        self.current
    }

    pub fn history(&self) -> &VecDeque<ModeTransition> {
        &self.history
    }

    /// Mode reached by toggling `mode`: back to Normal when `mode` is
    /// already active, `mode` otherwise.
    pub fn toggle_target(&self, mode: OperatingMode) -> OperatingMode {
        if self.current == mode {
            OperatingMode::Normal
        } else {
            mode
        }
    }

    /// Make `mode` the active mode.
    ///
    /// Returns the recorded transition, or `None` when `mode` was already
    /// active, in which case nothing is recorded.
    pub fn switch_to(&mut self, mode: OperatingMode, now_ms: u32) -> Option<ModeTransition> {
        if mode == self.current {
            return None;
        }
        let transition = ModeTransition::new(self.current, mode, now_ms);
        self.current = mode;
        self.add_to_history(transition);
        Some(transition)
    }

    fn add_to_history(&mut self, transition: ModeTransition) {
        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
    }
}

impl Default for ModeMachine {
    fn default() -> Self {
        Self::new()
    }
}
