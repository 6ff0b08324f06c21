//! Recording actuator: latches, buzzer and LEDs.

use super::clock::SimClock;
use crate::traits::{Actuator, Clock};
use petflap_core::{Latch, Led, constants::LATCH_PULSE_MS};
use std::sync::{Arc, Mutex, MutexGuard};

/// Buzzer patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sound {
    Confirmation,
    Short,
    Long,
    Series(u8),
}

/// One recorded actuator operation, stamped with the millisecond counter at
/// which it started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorEvent {
    Latch { latch: Latch, locked: bool, at_ms: u32 },
    Sound { sound: Sound, at_ms: u32 },
}

#[derive(Debug, Default)]
struct ActuatorState {
    events: Vec<ActuatorEvent>,
    entry_locked: bool,
    exit_locked: bool,
    green_led: bool,
    red_led: bool,
    led_changes: u32,
}

fn lock(state: &Mutex<ActuatorState>) -> MutexGuard<'_, ActuatorState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Actuator that records every latch pulse and sound.
///
/// A latch pulse spends [`LATCH_PULSE_MS`] of simulated time, as the solenoid
/// driver does. Sounds are recorded without spending time. LED state is
/// kept as current state only, since the controller refreshes it every pass.
#[derive(Debug)]
pub struct RecordingActuator {
    clock: SimClock,
    state: Arc<Mutex<ActuatorState>>,
}

impl RecordingActuator {
    pub fn new(clock: SimClock) -> (Self, RecordingActuatorHandle) {
        let state = Arc::new(Mutex::new(ActuatorState::default()));
        let handle = RecordingActuatorHandle {
            state: Arc::clone(&state),
        };
        (Self { clock, state }, handle)
    }

    fn record_sound(&mut self, sound: Sound) {
        let at_ms = self.clock.now_ms();
        lock(&self.state).events.push(ActuatorEvent::Sound { sound, at_ms });
    }
}

impl Actuator for RecordingActuator {
    fn lock_latch(&mut self, latch: Latch, engage: bool) -> bool {
        let at_ms = self.clock.now_ms();
        {
            let mut state = lock(&self.state);
            state.events.push(ActuatorEvent::Latch {
                latch,
                locked: engage,
                at_ms,
            });
            match latch {
                Latch::Entry => state.entry_locked = engage,
                Latch::Exit => state.exit_locked = engage,
            }
        }
        self.clock.delay_ms(LATCH_PULSE_MS);
        engage
    }

    fn sound_confirmation(&mut self) {
        self.record_sound(Sound::Confirmation);
    }

    fn sound_short(&mut self) {
        self.record_sound(Sound::Short);
    }

    fn sound_long(&mut self) {
        self.record_sound(Sound::Long);
    }

    fn sound_series(&mut self, count: u8) {
        self.record_sound(Sound::Series(count));
    }

    fn set_led(&mut self, led: Led, on: bool) {
        let mut guard = lock(&self.state);
        let state = &mut *guard;
        let slot = match led {
            Led::Green => &mut state.green_led,
            Led::Red => &mut state.red_led,
        };
        if *slot != on {
            *slot = on;
            state.led_changes += 1;
        }
    }
}

/// Test-side view of a [`RecordingActuator`].
#[derive(Debug, Clone)]
pub struct RecordingActuatorHandle {
    state: Arc<Mutex<ActuatorState>>,
}

impl RecordingActuatorHandle {
    /// Every recorded event in order.
    pub fn events(&self) -> Vec<ActuatorEvent> {
        lock(&self.state).events.clone()
    }

    /// Latch pulses in order as `(latch, locked, at_ms)`.
    pub fn latch_events(&self) -> Vec<(Latch, bool, u32)> {
        lock(&self.state)
            .events
            .iter()
            .filter_map(|event| match *event {
                ActuatorEvent::Latch { latch, locked, at_ms } => Some((latch, locked, at_ms)),
                ActuatorEvent::Sound { .. } => None,
            })
            .collect()
    }

    /// Sounds in order.
    pub fn sounds(&self) -> Vec<Sound> {
        lock(&self.state)
            .events
            .iter()
            .filter_map(|event| match *event {
                ActuatorEvent::Sound { sound, .. } => Some(sound),
                ActuatorEvent::Latch { .. } => None,
            })
            .collect()
    }

    pub fn clear_events(&self) {
        lock(&self.state).events.clear();
    }

    pub fn entry_locked(&self) -> bool {
        lock(&self.state).entry_locked
    }

    pub fn exit_locked(&self) -> bool {
        lock(&self.state).exit_locked
    }

    pub fn led(&self, led: Led) -> bool {
        let state = lock(&self.state);
        match led {
            Led::Green => state.green_led,
            Led::Red => state.red_led,
        }
    }

    /// Number of LED on/off changes so far.
    pub fn led_changes(&self) -> u32 {
        lock(&self.state).led_changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latch_pulse_spends_time_and_records() {
        let clock = SimClock::new();
        let (mut actuator, handle) = RecordingActuator::new(clock.clone());

        assert!(!actuator.lock_latch(Latch::Entry, false));
        assert!(actuator.lock_latch(Latch::Exit, true));

        assert_eq!(
            handle.latch_events(),
            vec![(Latch::Entry, false, 0), (Latch::Exit, true, 500)]
        );
        assert!(clock.micros() >= 1_000_000);
        assert!(!handle.entry_locked());
        assert!(handle.exit_locked());
    }

    #[test]
    fn test_sounds_recorded_in_order() {
        let (mut actuator, handle) = RecordingActuator::new(SimClock::new());
        actuator.sound_series(3);
        actuator.sound_confirmation();
        actuator.sound_long();

        assert_eq!(
            handle.sounds(),
            vec![Sound::Series(3), Sound::Confirmation, Sound::Long]
        );
        handle.clear_events();
        assert!(handle.events().is_empty());
    }

    #[test]
    fn test_led_changes_only_count_transitions() {
        let (mut actuator, handle) = RecordingActuator::new(SimClock::new());
        actuator.set_led(Led::Red, true);
        actuator.set_led(Led::Red, true);
        actuator.set_led(Led::Red, false);

        assert!(!handle.led(Led::Red));
        assert!(!handle.led(Led::Green));
        assert_eq!(handle.led_changes(), 2);
    }
}
