//! Simulated millisecond clock with microsecond resolution.

use crate::traits::Clock;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

/// Cost of one clock read, so that polling loops always make progress.
pub const CLOCK_POLL_COST_US: u64 = 10;

/// Simulated clock shared between every simulated device.
///
/// Time only moves when something spends it: a delay, a device operation,
/// or a clock read. Clones share the same counter.
///
/// # Examples
///
/// ```
/// use petflap_hardware::mock::SimClock;
/// use petflap_hardware::traits::Clock;
///
/// let clock = SimClock::starting_at_ms(u32::MAX - 10);
/// let start = clock.now_ms();
/// clock.advance_ms(20);
/// assert!(clock.now_ms() < start);
/// assert!(clock.elapsed_since(start) >= 20);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    micros: Arc<AtomicU64>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock whose millisecond counter starts at `ms`.
    pub fn starting_at_ms(ms: u32) -> Self {
        let clock = Self::new();
        clock.advance_us(u64::from(ms) * 1_000);
        clock
    }

    /// Microseconds since the clock was created (never wraps in practice).
    pub fn micros(&self) -> u64 {
        self.micros.load(Ordering::SeqCst)
    }

    pub fn advance_us(&self, us: u64) {
        self.micros.fetch_add(us, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, ms: u32) {
        self.advance_us(u64::from(ms) * 1_000);
    }

    /// Move time forward to `target` microseconds; no-op if already past it.
    pub fn advance_to_us(&self, target: u64) {
        self.micros.fetch_max(target, Ordering::SeqCst);
    }
}

impl Clock for SimClock {
    fn now_ms(&self) -> u32 {
        let micros = self.micros.fetch_add(CLOCK_POLL_COST_US, Ordering::SeqCst);
        // The hardware counter is 32 bits wide.
        (micros / 1_000) as u32
    }

    fn delay_ms(&self, ms: u32) {
        self.advance_ms(ms);
    }
}
