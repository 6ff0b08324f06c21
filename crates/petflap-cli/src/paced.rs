//! Simulated clock held to wall-clock time.
//!
//! The simulated devices advance a [`SimClock`] as they are polled. On the
//! host that happens far faster than real time, which would make the 5 ms
//! serial parameter timeouts expire before a human (or a host program) can
//! send the next byte. [`PacedClock`] sleeps whenever simulated time runs
//! ahead of the wall clock, and jumps simulated time forward when it falls
//! behind.

use petflap_hardware::{Clock, mock::SimClock};
use std::{
    thread,
    time::{Duration, Instant},
};

/// Lead over the wall clock tolerated before sleeping.
const MAX_LEAD_US: u64 = 1_000;

#[derive(Debug, Clone)]
pub struct PacedClock {
    sim: SimClock,
    origin: Instant,
}

impl PacedClock {
    pub fn new(sim: SimClock) -> Self {
        Self {
            origin: Instant::now() - Duration::from_micros(sim.micros()),
            sim,
        }
    }

    fn pace(&self) {
        let wall = u64::try_from(self.origin.elapsed().as_micros()).unwrap_or(u64::MAX);
        let sim = self.sim.micros();
        if wall > sim {
            self.sim.advance_to_us(wall);
        } else if sim - wall > MAX_LEAD_US {
            thread::sleep(Duration::from_micros(sim - wall));
        }
    }
}

impl Clock for PacedClock {
    fn now_ms(&self) -> u32 {
        self.pace();
        self.sim.now_ms()
    }

    fn delay_ms(&self, ms: u32) {
        self.sim.delay_ms(ms);
        self.pace();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_takes_wall_time() {
        let clock = PacedClock::new(SimClock::new());
        let started = Instant::now();
        clock.delay_ms(30);
        assert!(started.elapsed() >= Duration::from_millis(28));
    }

    #[test]
    fn test_sim_time_catches_up_with_wall_time() {
        let sim = SimClock::new();
        let clock = PacedClock::new(sim.clone());
        thread::sleep(Duration::from_millis(20));
        let start = 0;
        assert!(clock.elapsed_since(start) >= 20);
        assert!(sim.micros() >= 20_000);
    }
}
