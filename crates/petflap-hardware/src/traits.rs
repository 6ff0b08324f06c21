//! Hardware capability trait definitions.
//!
//! These traits are the seam between the door logic and the board. The
//! controller, decoder and store only ever talk to the board through them,
//! which lets the same logic run against the simulated devices in
//! [`mock`](crate::mock) for tests and bench emulation.
//!
//! The firmware is a single-threaded cooperative loop, so every method is
//! synchronous and may busy-wait. The only state shared with interrupt
//! context is the millisecond counter behind [`Clock`] and the receive
//! buffer behind [`SerialLink`].

use petflap_core::{Latch, Led};

/// Monotonic millisecond counter.
///
/// The counter is 32 bits wide and wraps. Every elapsed-time computation
/// must use wrapping subtraction, which [`Clock::elapsed_since`] does.
///
/// # Examples
///
/// ```
/// use petflap_hardware::traits::Clock;
/// use petflap_hardware::mock::SimClock;
///
/// let clock = SimClock::new();
/// let start = clock.now_ms();
/// clock.delay_ms(250);
/// assert!(clock.elapsed_since(start) >= 250);
/// ```
pub trait Clock {
    /// Current value of the millisecond counter.
    fn now_ms(&self) -> u32;

    /// Busy-wait for `ms` milliseconds.
    fn delay_ms(&self, ms: u32);

    /// Milliseconds elapsed since `start`, correct across wraparound.
    fn elapsed_since(&self, start: u32) -> u32 {
        self.now_ms().wrapping_sub(start)
    }
}

/// Analog front end of the RFID reader.
///
/// The reader excites a 134.2 kHz carrier. A transponder in the field loads
/// it (lowering [`field_strength`](SampleSource::field_strength)) and
/// modulates the demodulated stream read through
/// [`stream_level`](SampleSource::stream_level). Bit cells are timed by a
/// hardware timer whose overflow flag is consumed by
/// [`wait_tick`](SampleSource::wait_tick).
pub trait SampleSource {
    /// Energize or de-energize the carrier (and the analog chain behind it).
    fn set_excitation(&mut self, on: bool);

    /// Raw ADC reading of the carrier amplitude.
    fn field_strength(&mut self) -> u16;

    /// Raw ADC reading of the demodulated stream.
    fn stream_level(&mut self) -> u16;

    /// Block until the next timer overflow, then clear the flag.
    ///
    /// An overflow that happened since the previous call is consumed
    /// immediately without waiting.
    fn wait_tick(&mut self);
}

/// Latch solenoids, buzzer and indicator LEDs.
pub trait Actuator {
    /// Pulse a latch solenoid to engage (lock) or release it.
    ///
    /// Busy-waits for the whole solenoid pulse and returns the resulting
    /// lock state.
    fn lock_latch(&mut self, latch: Latch, engage: bool) -> bool;

    /// Chime played when a tag is recognized or enrolled.
    fn sound_confirmation(&mut self);

    fn sound_short(&mut self);

    fn sound_long(&mut self);

    /// `count` short beeps separated by short pauses.
    fn sound_series(&mut self, count: u8);

    fn set_led(&mut self, led: Led, on: bool);
}

/// Byte-addressable non-volatile memory with a finite write-cycle budget.
///
/// Callers are expected to read before writing and skip unchanged bytes.
pub trait NvMemory {
    /// Size of the medium in bytes.
    fn capacity(&self) -> usize;

    /// Read the byte at `addr`. Addresses beyond the capacity read as `0xFF`.
    fn read(&self, addr: usize) -> u8;

    /// Write the byte at `addr`. Addresses beyond the capacity are ignored.
    fn write(&mut self, addr: usize, value: u8);
}

/// Front panel inputs: two push buttons and the light sensor.
pub trait PanelInputs {
    /// `true` while the green button is held down.
    fn green_pressed(&mut self) -> bool;

    /// `true` while the red button is held down.
    fn red_pressed(&mut self) -> bool;

    /// Light sensor ADC reading (higher is darker).
    fn light_level(&mut self) -> u16;
}

/// Byte transport of the diagnostic serial link.
///
/// Reception is interrupt driven into a ring buffer; this trait only
/// exposes the main-loop side of it.
pub trait SerialLink {
    /// Pop the oldest received byte, if any.
    fn read_byte(&mut self) -> Option<u8>;

    /// `true` when at least one received byte is waiting.
    fn byte_available(&self) -> bool;

    /// Send one line of text (the line terminator is added by the link).
    fn write_line(&mut self, line: &str);
}
