//! Simulated board devices for testing and bench emulation.
//!
//! Every device takes a [`SimClock`] and advances it where the real part
//! would spend time: an ADC conversion, a latch pulse, a timer tick. Reading
//! the clock itself costs a few microseconds, so a polling loop always makes
//! progress even when nothing else advances time.
//!
//! Devices that a test needs to steer or observe come as a `(device, handle)`
//! pair sharing state, so the device can be moved into the controller while
//! the test keeps the handle.

pub mod actuator;
pub mod clock;
pub mod eeprom;
pub mod panel;
pub mod serial;
pub mod transponder;

pub use actuator::{ActuatorEvent, RecordingActuator, RecordingActuatorHandle, Sound};
pub use clock::SimClock;
pub use eeprom::{SimEeprom, SimEepromHandle};
pub use panel::{SimPanel, SimPanelHandle};
pub use serial::{SimSerial, SimSerialHandle};
pub use transponder::{SimTransponder, SimTransponderHandle, encode_frame};
