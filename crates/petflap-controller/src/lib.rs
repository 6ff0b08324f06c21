//! Pet door controller.
//!
//! Owns the tag decoder, the tag store and the peripherals, and runs the
//! cooperative scheduler pass ([`Controller::tick`]) that gates the door,
//! follows the operating mode, classifies button presses and serves the
//! serial command interface.
//!
//! ```
//! use petflap_controller::{Controller, FlapConfig, Peripherals};
//! use petflap_core::OperatingMode;
//! use petflap_hardware::mock::{
//!     RecordingActuator, SimClock, SimEeprom, SimPanel, SimSerial, SimTransponder,
//! };
//!
//! let clock = SimClock::new();
//! let (reader, _tag) = SimTransponder::new(clock.clone());
//! let (actuator, _latches) = RecordingActuator::new(clock.clone());
//! let (memory, _eeprom) = SimEeprom::blank();
//! let (panel, _panel) = SimPanel::new();
//! let (serial, host) = SimSerial::new();
//!
//! let peripherals = Peripherals { reader, actuator, memory, panel, serial };
//! let mut controller = Controller::new(FlapConfig::default(), clock, peripherals);
//! controller.boot();
//! assert_eq!(controller.mode(), OperatingMode::Normal);
//!
//! host.push_bytes(b"M\x03");
//! controller.tick();
//! assert_eq!(controller.mode(), OperatingMode::Night);
//! ```

pub mod buttons;
pub mod config;
pub mod controller;
pub mod error;
pub mod mode;
pub mod settings;

pub use buttons::{ButtonClassifier, ButtonEvent, ButtonPress};
pub use config::{ButtonThresholds, FlapConfig};
pub use controller::{Controller, ControllerState, Peripherals};
pub use error::{ConfigError, Result};
pub use mode::{ModeMachine, ModeTransition};
pub use settings::{LockTimeAdjust, LockTimeOutcome, LockTimeState, SettingsMenu};
