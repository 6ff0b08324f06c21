//! Simulated board shared by the controller integration tests.

#![allow(dead_code)]

use petflap_controller::{Controller, FlapConfig, Peripherals};
use petflap_core::{TagId, TagRecord, crc16};
use petflap_hardware::mock::{
    RecordingActuator, RecordingActuatorHandle, SimClock, SimEeprom, SimEepromHandle, SimPanel,
    SimPanelHandle, SimSerial, SimSerialHandle, SimTransponder, SimTransponderHandle,
};

pub type SimController =
    Controller<SimTransponder, RecordingActuator, SimEeprom, SimPanel, SimSerial, SimClock>;

pub const CAT: [u8; 8] = [0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x00, 0x00];
pub const STRAY: [u8; 8] = [0x99, 0x88, 0x77, 0x66, 0x55, 0x44, 0x00, 0x00];

pub struct Rig {
    pub controller: SimController,
    pub clock: SimClock,
    pub tag: SimTransponderHandle,
    pub actuator: RecordingActuatorHandle,
    pub eeprom: SimEepromHandle,
    pub panel: SimPanelHandle,
    pub serial: SimSerialHandle,
}

impl Rig {
    pub fn new() -> Self {
        Self::with_config(FlapConfig::default())
    }

    pub fn with_config(config: FlapConfig) -> Self {
        Self::with_memory(config, SimEeprom::blank())
    }

    fn with_memory(config: FlapConfig, (memory, eeprom): (SimEeprom, SimEepromHandle)) -> Self {
        let clock = SimClock::new();
        let (reader, tag) = SimTransponder::new(clock.clone());
        let (actuator, actuator_handle) = RecordingActuator::new(clock.clone());
        let (panel, panel_handle) = SimPanel::new();
        let (serial, serial_handle) = SimSerial::new();
        let peripherals = Peripherals {
            reader,
            actuator,
            memory,
            panel,
            serial,
        };
        Self {
            controller: Controller::new(config, clock.clone(), peripherals),
            clock,
            tag,
            actuator: actuator_handle,
            eeprom,
            panel: panel_handle,
            serial: serial_handle,
        }
    }

    /// Booted rig with empty event and line logs.
    pub fn booted() -> Self {
        let mut rig = Self::new();
        rig.controller.boot();
        rig.reset_logs();
        rig
    }

    /// Booted rig with `CAT` enrolled.
    pub fn with_cat() -> Self {
        let mut rig = Self::booted();
        rig.enroll(CAT);
        rig
    }

    /// Booted rig on a copy of this rig's EEPROM image, as after a power cycle.
    pub fn reboot(&self) -> Self {
        let config = self.controller.config().clone();
        let mut rig = Self::with_memory(config, SimEeprom::with_image(self.eeprom.snapshot()));
        rig.controller.boot();
        rig.reset_logs();
        rig
    }

    pub fn reset_logs(&self) {
        self.actuator.clear_events();
        self.serial.take_lines();
    }

    /// Store a tag directly, as a successful Learn would.
    pub fn enroll(&mut self, data: [u8; 8]) -> TagRecord {
        let record = record_of(data);
        self.controller
            .store_mut()
            .insert(record)
            .expect("table has room");
        record
    }

    /// Hold the given buttons for `hold_ms`, ticking on press and release.
    pub fn press(&mut self, green: bool, red: bool, hold_ms: u32) {
        self.panel.set_green(green);
        self.panel.set_red(red);
        self.controller.tick();
        self.clock.advance_ms(hold_ms);
        self.panel.set_green(false);
        self.panel.set_red(false);
        self.controller.tick();
    }

    /// Queue `bytes` on the host side, tick once and return the lines sent.
    pub fn send(&mut self, bytes: &[u8]) -> Vec<String> {
        self.serial.push_bytes(bytes);
        self.controller.tick();
        self.serial.take_lines()
    }
}

pub fn record_of(data: [u8; 8]) -> TagRecord {
    let mut id = [0u8; 6];
    id.copy_from_slice(&data[..6]);
    TagRecord::new(crc16(&data), TagId::new(id))
}
