//! Actuator that reports through the log instead of driving outputs.

use petflap_core::{Latch, Led, constants::LATCH_PULSE_MS};
use petflap_hardware::{Actuator, Clock};
use tracing::{debug, info};

/// Logs every latch pulse and buzzer pattern; LED changes at debug level.
///
/// A latch pulse still spends [`LATCH_PULSE_MS`] on the clock so the
/// controller's timing matches the board.
#[derive(Debug)]
pub struct TraceActuator<C> {
    clock: C,
    green: bool,
    red: bool,
}

impl<C: Clock> TraceActuator<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            green: false,
            red: false,
        }
    }
}

impl<C: Clock> Actuator for TraceActuator<C> {
    fn lock_latch(&mut self, latch: Latch, engage: bool) -> bool {
        info!(?latch, locked = engage, "Latch pulse");
        self.clock.delay_ms(LATCH_PULSE_MS);
        engage
    }

    fn sound_confirmation(&mut self) {
        info!("Buzzer: confirmation");
    }

    fn sound_short(&mut self) {
        info!("Buzzer: short");
    }

    fn sound_long(&mut self) {
        info!("Buzzer: long");
    }

    fn sound_series(&mut self, count: u8) {
        info!(count, "Buzzer: series");
    }

    fn set_led(&mut self, led: Led, on: bool) {
        let state = match led {
            Led::Green => &mut self.green,
            Led::Red => &mut self.red,
        };
        if *state != on {
            *state = on;
            debug!(?led, on, "LED");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petflap_hardware::mock::SimClock;

    #[test]
    fn test_latch_pulse_spends_time() {
        let clock = SimClock::new();
        let mut actuator = TraceActuator::new(clock.clone());
        assert!(actuator.lock_latch(Latch::Entry, true));
        assert!(!actuator.lock_latch(Latch::Exit, false));
        assert!(clock.micros() >= 2 * u64::from(LATCH_PULSE_MS) * 1_000);
    }
}
