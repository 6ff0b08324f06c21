//! Hardware abstraction layer for the pet door controller.
//!
//! This crate defines the capabilities the door logic needs from the board
//! and nothing more. Register-level setup (pin directions, ADC channels,
//! timer prescalers) lives behind the traits; the rest of the workspace only
//! sees a clock, an analog sample source, actuators, a byte-addressable
//! non-volatile memory, the panel inputs and a serial link.
//!
//! # Design Philosophy
//!
//! - **Synchronous**: the controller is a single cooperative loop that
//!   busy-waits by design. Every trait method is a plain blocking call.
//! - **Infallible at the seam**: a latch pulse or an EEPROM byte read cannot
//!   fail from the controller's point of view. Fallible host I/O (image
//!   files, serial ports) is reported through [`HardwareError`] before the
//!   controller ever sees the device.
//! - **Shared simulated time**: the devices in [`mock`] all advance one
//!   [`mock::SimClock`], so busy-wait loops in the decoder and the controller
//!   terminate deterministically in tests.
//!
//! # Example
//!
//! ```
//! use petflap_hardware::mock::{SimClock, SimTransponder};
//! use petflap_hardware::traits::SampleSource;
//!
//! let clock = SimClock::new();
//! let (mut reader, handle) = SimTransponder::new(clock.clone());
//! handle.present_tag([0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x00, 0x00]);
//!
//! reader.set_excitation(true);
//! assert!(reader.field_strength() < 200);
//! reader.set_excitation(false);
//! assert_eq!(handle.excitation_cycles(), 1);
//! ```

pub mod eeprom;
pub mod error;
pub mod mock;
pub mod traits;

pub use eeprom::{FileEeprom, blank_image};
pub use error::{HardwareError, Result};
pub use traits::{Actuator, Clock, NvMemory, PanelInputs, SampleSource, SerialLink};
