//! The scheduler pass tying decoder, tag store, buttons and serial link
//! together.
//!
//! [`Controller::tick`] runs one pass of the cooperative main loop. Within
//! a pass the order is fixed:
//!
//! 1. light sensor sampling (every `light_read_period_ms`),
//! 2. mode effects: LEDs, Night exit control, and the transient Learn and
//!    Clear modes, which run to completion here,
//! 3. door gating: one decode attempt in the modes that allow entry,
//! 4. button classification and the resulting mode or menu change,
//! 5. at most one serial command.
//!
//! Every blocking wait (latch pulses, relock delay, Learn window, serial
//! parameter timeouts) blocks the whole pass.

use crate::{
    buttons::{ButtonClassifier, ButtonEvent, ButtonPress},
    config::FlapConfig,
    mode::ModeMachine,
    settings::{LockTimeAdjust, LockTimeOutcome, SettingsMenu},
};
use petflap_core::{
    Latch, Led, OperatingMode, SettingsCursor, SlotNumber, TagRecord,
    constants::config_index,
};
use petflap_hardware::{Actuator, Clock, NvMemory, PanelInputs, SampleSource, SerialLink};
use petflap_protocol::{Command, CommandKind, CommandReader, Response};
use petflap_rfid::Decoder;
use petflap_storage::{PersistedSettings, TagStore};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

/// Red LED flashes shown at boot when no tag is enrolled.
pub const BOOT_WARNING_FLASHES: u8 = 3;

/// On and off time of one boot warning flash.
pub const BOOT_WARNING_FLASH_MS: u32 = 200;

/// Learn attempts between two toggles of the green LED.
const LEARN_BLINK_ATTEMPTS: u8 = 10;

/// Devices the controller drives, one per hardware seam.
#[derive(Debug)]
pub struct Peripherals<S, A, M, P, L> {
    pub reader: S,
    pub actuator: A,
    pub memory: M,
    pub panel: P,
    pub serial: L,
}

/// Observable controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ControllerState {
    pub entry_locked: bool,
    pub exit_locked: bool,
    /// Last light sensor reading.
    pub light: u16,
    pub light_threshold: u16,
    pub relock_delay_ms: u32,
    /// Suppresses the chime played when a known tag opens the door.
    pub silent: bool,
    /// Ignores every button gesture except unlocking and clearing.
    pub keypad_locked: bool,
}

pub struct Controller<S, A, M, P, L, C> {
    config: FlapConfig,
    clock: C,
    decoder: Decoder<S>,
    actuator: A,
    store: TagStore<M>,
    panel: P,
    serial: L,
    commands: CommandReader,
    buttons: ButtonClassifier,
    menu: SettingsMenu,
    lock_time: LockTimeAdjust,
    modes: ModeMachine,
    state: ControllerState,
    last_light_read_ms: u32,
}

impl<S, A, M, P, L, C> Controller<S, A, M, P, L, C>
where
    S: SampleSource,
    A: Actuator,
    M: NvMemory,
    P: PanelInputs,
    L: SerialLink,
    C: Clock,
{
    /// Build a controller. Nothing touches the hardware until [`boot`](Self::boot).
    pub fn new(config: FlapConfig, clock: C, peripherals: Peripherals<S, A, M, P, L>) -> Self {
        let now = clock.now_ms();
        let state = ControllerState {
            entry_locked: false,
            exit_locked: false,
            light: 0,
            light_threshold: config.default_light_threshold,
            relock_delay_ms: config.relock_delay_ms,
            silent: false,
            keypad_locked: false,
        };
        Self {
            commands: CommandReader::new(config.serial_byte_timeout_ms),
            lock_time: LockTimeAdjust::new(config.lock_time_inactivity_ms),
            config,
            clock,
            decoder: Decoder::new(peripherals.reader),
            actuator: peripherals.actuator,
            store: TagStore::new(peripherals.memory),
            panel: peripherals.panel,
            serial: peripherals.serial,
            buttons: ButtonClassifier::new(),
            menu: SettingsMenu::new(),
            modes: ModeMachine::new(),
            state,
            last_light_read_ms: now,
        }
    }

    pub fn config(&self) -> &FlapConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn mode(&self) -> OperatingMode {
        self.modes.current()
    }

    pub fn modes(&self) -> &ModeMachine {
        &self.modes
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn menu(&self) -> &SettingsMenu {
        &self.menu
    }

    pub fn lock_time(&self) -> &LockTimeAdjust {
        &self.lock_time
    }

    pub fn store(&self) -> &TagStore<M> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TagStore<M> {
        &mut self.store
    }

    /// Load persisted settings, drive both latches for Normal mode and
    /// warn once when no tag is enrolled.
    pub fn boot(&mut self) {
        let defaults = PersistedSettings {
            light_threshold: self.config.default_light_threshold,
            relock_delay_ms: self.config.relock_delay_ms,
            silent: false,
        };
        let settings = self.store.load_settings(&defaults);
        self.state.light_threshold = settings.light_threshold;
        self.state.relock_delay_ms = settings.relock_delay_ms;
        self.state.silent = settings.silent;
        info!(?settings, "Persisted settings loaded");

        self.emit(Response::Ready);
        self.switch_mode(OperatingMode::Normal);
        self.last_light_read_ms = self.clock.now_ms();

        if !self.store.any_programmed() {
            warn!("No tag enrolled, the door will only open in Open mode");
            self.emit(Response::NoTagsWarning);
            for _ in 0..BOOT_WARNING_FLASHES {
                self.actuator.set_led(Led::Red, true);
                self.clock.delay_ms(BOOT_WARNING_FLASH_MS);
                self.actuator.set_led(Led::Red, false);
                self.clock.delay_ms(BOOT_WARNING_FLASH_MS);
            }
        }
    }

    /// Run one scheduler pass.
    pub fn tick(&mut self) {
        let now = self.clock.now_ms();
        self.sample_light(now);
        if self.apply_mode(now) {
            self.gate_door();
        }
        self.handle_buttons();
        self.handle_serial();
    }

    /// Enter `mode`, driving both latches to its policy.
    ///
    /// The latches are driven even when `mode` is already active; only an
    /// actual change is recorded and announced.
    pub fn switch_mode(&mut self, mode: OperatingMode) {
        let (entry, exit) = mode.latch_policy();
        self.state.exit_locked = self.actuator.lock_latch(Latch::Exit, exit);
        self.state.entry_locked = self.actuator.lock_latch(Latch::Entry, entry);

        let now = self.clock.now_ms();
        if let Some(transition) = self.modes.switch_to(mode, now) {
            info!(from = %transition.from, to = %transition.to, "Mode changed");
            self.emit(Response::ModeChanged {
                from: transition.from,
                to: transition.to,
            });
        }
    }

    /// Execute a decoded serial command and send its response lines.
    pub fn execute(&mut self, command: Command) {
        match command {
            Command::Status => self.emit(Response::Status {
                mode: self.mode(),
                light: self.state.light,
                entry_locked: self.state.entry_locked,
                exit_locked: self.state.exit_locked,
            }),
            Command::ConfigRead { index } => {
                let value = self.store.config_get(index);
                self.emit(Response::ConfigValue { index, value });
            }
            Command::ConfigWrite { index, value } => {
                let value = self.write_config(index, value);
                self.emit(Response::ConfigWritten { index, value });
            }
            Command::SetMode(value) => match OperatingMode::from_u8(value) {
                Ok(mode) => {
                    self.switch_mode(mode);
                    self.emit(Response::ModeSet(self.mode()));
                }
                Err(_) => self.emit(Response::InvalidMode(value)),
            },
            Command::List => {
                self.emit(Response::ListHeader);
                let entries: Vec<_> = self.store.entries().collect();
                for &(slot, record) in &entries {
                    self.emit(Response::ListEntry(slot, record));
                }
                self.emit(Response::ListTotal(entries.len()));
            }
            Command::Add(record) => match self.store.insert(record) {
                Some(slot) => {
                    self.emit(Response::Saved(slot));
                    self.emit(Response::SavedRecord(record));
                }
                None => self.emit(Response::SaveFailed),
            },
            Command::Delete(value) => {
                let Some((slot, record)) = self.occupied_slot(value) else {
                    return;
                };
                match record {
                    Some(record) => {
                        self.store.delete_slot(slot.index());
                        self.emit(Response::Deleted(slot));
                        self.emit(Response::DeletedRecord(record));
                    }
                    None => self.emit(Response::SlotAlreadyEmpty(slot)),
                }
            }
            Command::Read(value) => {
                let Some((slot, record)) = self.occupied_slot(value) else {
                    return;
                };
                match record {
                    Some(record) => self.emit(Response::SlotEntry(slot, record)),
                    None => self.emit(Response::SlotEmpty(slot)),
                }
            }
        }
    }

    /// Validate a 1-based slot byte, reporting an invalid one.
    ///
    /// Returns the slot and its record, `None` for an empty slot.
    fn occupied_slot(&mut self, value: u8) -> Option<(SlotNumber, Option<TagRecord>)> {
        let Ok(slot) = SlotNumber::new(value) else {
            self.emit(Response::InvalidSlot(value));
            return None;
        };
        let record = self.store.get_slot(slot.index());
        Some((slot, (!record.is_empty()).then_some(record)))
    }

    /// Persist a configuration entry and apply it, returning the stored value.
    ///
    /// Known settings are normalized before they are written so the value in
    /// use is the one the next boot loads.
    fn write_config(&mut self, index: u8, value: u16) -> u16 {
        match index {
            config_index::LIGHT_THRESHOLD => {
                self.state.light_threshold = self.store.save_light_threshold(value);
                self.state.light_threshold
            }
            config_index::RELOCK_DELAY => {
                let delay = self.store.save_relock_delay(u32::from(value));
                self.state.relock_delay_ms = delay;
                u16::try_from(delay).unwrap_or(u16::MAX)
            }
            config_index::SILENT => {
                self.state.silent = value != 0;
                self.store.save_silent(self.state.silent);
                u16::from(self.state.silent)
            }
            _ => {
                self.store.config_set(index, value);
                value
            }
        }
    }

    fn emit(&mut self, response: Response) {
        self.serial.write_line(&response.to_string());
    }

    fn sample_light(&mut self, now: u32) {
        if now.wrapping_sub(self.last_light_read_ms) > self.config.light_read_period_ms {
            self.state.light = self.panel.light_level();
            self.last_light_read_ms = now;
            trace!(light = self.state.light, "Light sensor sampled");
        }
    }

    /// Apply per-mode effects; returns `true` when the door may be opened.
    fn apply_mode(&mut self, now: u32) -> bool {
        let blink = (now >> 9) & 1 == 1;
        let open = match self.modes.current() {
            OperatingMode::Normal => {
                self.set_leds(false, false);
                true
            }
            OperatingMode::Vet => {
                self.set_leds(false, blink);
                true
            }
            OperatingMode::Closed => {
                self.set_leds(blink, blink);
                false
            }
            OperatingMode::Open => {
                self.set_leds(true, true);
                false
            }
            OperatingMode::Night => {
                self.night_exit_control();
                self.set_leds(self.state.exit_locked, true);
                true
            }
            OperatingMode::Learn => {
                self.learn();
                self.switch_mode(OperatingMode::Normal);
                false
            }
            OperatingMode::Clear => {
                warn!("Clearing every enrolled tag");
                self.store.clear_all(&mut self.actuator, &self.clock);
                self.emit(Response::Cleared);
                self.switch_mode(OperatingMode::Normal);
                false
            }
        };
        if self.menu.is_armed() || self.lock_time.is_active() {
            self.actuator.set_led(Led::Green, true);
        }
        open
    }

    fn set_leds(&mut self, green: bool, red: bool) {
        self.actuator.set_led(Led::Green, green);
        self.actuator.set_led(Led::Red, red);
    }

    /// Lock the exit when it is dark, unlock it once the light is back
    /// below the threshold by more than the hysteresis.
    fn night_exit_control(&mut self) {
        let light = self.state.light;
        let threshold = self.state.light_threshold;
        if light > threshold && !self.state.exit_locked {
            info!(light, threshold, "Dark, locking exit");
            self.state.exit_locked = self.actuator.lock_latch(Latch::Exit, true);
            self.state.entry_locked = self.actuator.lock_latch(Latch::Entry, true);
        } else if light < threshold.saturating_sub(self.config.night_hysteresis)
            && self.state.exit_locked
        {
            info!(light, threshold, "Light, unlocking exit");
            self.state.exit_locked = self.actuator.lock_latch(Latch::Exit, false);
            self.state.entry_locked = self.actuator.lock_latch(Latch::Entry, true);
        }
    }

    fn gate_door(&mut self) {
        if let Ok(read) = self.decoder.decode(&self.clock) {
            match self.store.lookup(read.crc_computed, read.crc_embedded) {
                Some((slot, _)) => self.open_door(slot, read.record()),
                None => debug!(key = read.key(), "Tag not enrolled"),
            }
        }
        self.clock.delay_ms(self.config.scan_relax_ms);
    }

    fn open_door(&mut self, slot: SlotNumber, record: TagRecord) {
        info!(slot = slot.get(), %record, "Enrolled tag, opening entry");
        if !self.state.silent {
            self.actuator.sound_confirmation();
        }
        self.state.entry_locked = self.actuator.lock_latch(Latch::Entry, false);
        let delay = self.state.relock_delay_ms;
        self.emit(Response::DoorOpen {
            relock_delay_ms: delay,
        });
        self.emit(Response::TagDetected(record));

        self.clock.delay_ms(delay);
        self.state.entry_locked = self.actuator.lock_latch(Latch::Entry, true);
        self.emit(Response::DoorClose);
    }

    /// Try to enroll one tag until the Learn window closes.
    fn learn(&mut self) {
        info!(timeout_ms = self.config.learn_timeout_ms, "Learn mode, waiting for a tag");
        let start = self.clock.now_ms();
        let mut attempts = 0u8;
        let mut led = false;

        let enrolled = loop {
            if let Ok(read) = self.decoder.decode(&self.clock) {
                if read.is_enrollable() {
                    if let Some(slot) = self.store.insert(read.record()) {
                        self.actuator.sound_confirmation();
                        break Some((slot, read.record()));
                    }
                }
            }
            attempts += 1;
            if attempts >= LEARN_BLINK_ATTEMPTS {
                attempts = 0;
                led = !led;
                self.actuator.set_led(Led::Green, led);
            }
            self.clock.delay_ms(self.config.learn_retry_delay_ms);
            if self.clock.elapsed_since(start) >= self.config.learn_timeout_ms {
                break None;
            }
        };
        self.actuator.set_led(Led::Green, false);

        match enrolled {
            Some((slot, record)) => {
                info!(slot = slot.get(), %record, "Tag enrolled");
                self.emit(Response::Learned(slot, record));
            }
            None => {
                info!("Learn window closed without a new tag");
                self.emit(Response::LearnTimeout);
            }
        }
    }

    fn handle_buttons(&mut self) {
        let green = self.panel.green_pressed();
        let red = self.panel.red_pressed();
        let now = self.clock.now_ms();
        let press = self.buttons.sample(green, red, now);

        if self.lock_time.is_active() {
            if let Some(outcome) = self.lock_time.poll(green || red, now) {
                self.finish_lock_time(outcome);
            }
            return;
        }
        if let Some(press) = press {
            self.dispatch_press(press);
        }
    }

    fn dispatch_press(&mut self, press: ButtonPress) {
        let thresholds = self.config.buttons;
        let elapsed = press.elapsed_ms;
        debug!(event = ?press.event, elapsed, "Button released");

        if self.state.keypad_locked {
            match press.event {
                ButtonEvent::Red if elapsed > thresholds.very_long_press_ms => {
                    self.toggle_keypad_lock();
                }
                ButtonEvent::Both if elapsed > thresholds.very_long_press_ms => {
                    self.switch_mode(OperatingMode::Clear);
                }
                _ => debug!("Keypad locked, press ignored"),
            }
            return;
        }

        if self.menu.is_armed() {
            self.menu_press(press);
            return;
        }

        match press.event {
            ButtonEvent::Green => {
                if elapsed > thresholds.learn_press_ms {
                    self.switch_mode(OperatingMode::Learn);
                }
            }
            ButtonEvent::Red => {
                if elapsed > thresholds.very_long_press_ms {
                    self.toggle_keypad_lock();
                } else if elapsed > thresholds.long_press_ms {
                    self.switch_mode(self.modes.toggle_target(OperatingMode::Vet));
                } else if elapsed < thresholds.short_press_ms {
                    self.switch_mode(self.modes.toggle_target(OperatingMode::Night));
                }
            }
            ButtonEvent::Both => {
                if elapsed > thresholds.very_long_press_ms {
                    self.switch_mode(OperatingMode::Clear);
                } else if elapsed > thresholds.short_press_ms {
                    let cursor = self.menu.arm();
                    info!("Extended settings armed");
                    self.actuator.sound_series(cursor.position());
                }
            }
        }
    }

    fn menu_press(&mut self, press: ButtonPress) {
        match press.event {
            ButtonEvent::Green => {
                let cursor = self.menu.back();
                debug!(?cursor, "Settings cursor moved");
                self.actuator.sound_series(cursor.position());
            }
            ButtonEvent::Red => {
                let cursor = self.menu.forward();
                debug!(?cursor, "Settings cursor moved");
                self.actuator.sound_series(cursor.position());
            }
            ButtonEvent::Both if press.elapsed_ms > self.config.buttons.very_long_press_ms => {
                self.menu.disarm();
                self.switch_mode(OperatingMode::Clear);
            }
            ButtonEvent::Both => {
                let entry = self.menu.activate();
                self.actuator.sound_confirmation();
                self.apply_setting(entry);
            }
        }
    }

    fn apply_setting(&mut self, entry: SettingsCursor) {
        match entry {
            SettingsCursor::Exit => info!("Extended settings closed"),
            SettingsCursor::Open => self.switch_mode(OperatingMode::Open),
            SettingsCursor::Silent => {
                self.state.silent = !self.state.silent;
                self.store.save_silent(self.state.silent);
                info!(silent = self.state.silent, "Silent mode toggled");
            }
            SettingsCursor::LightLevel => {
                let level = self.panel.light_level();
                self.state.light = level;
                self.state.light_threshold = self.store.save_light_threshold(level);
                info!(threshold = self.state.light_threshold, "Light threshold captured");
            }
            SettingsCursor::LockTime => {
                info!("Waiting for a hold to set the relock delay");
                self.lock_time.enter(self.clock.now_ms());
            }
            SettingsCursor::LowBattery | SettingsCursor::Timer => {
                debug!(?entry, "Setting not available on this board");
            }
        }
    }

    fn finish_lock_time(&mut self, outcome: LockTimeOutcome) {
        match outcome {
            LockTimeOutcome::Set(delay) => {
                let delay = self.store.save_relock_delay(delay);
                self.state.relock_delay_ms = delay;
                info!(delay_ms = delay, "Relock delay set");
                // At most 25 beeps after the clamp.
                self.actuator.sound_series((delay / 1_000) as u8);
                self.emit(Response::RelockDelaySet(delay));
            }
            LockTimeOutcome::TimedOut => info!("Relock delay left unchanged"),
        }
    }

    fn toggle_keypad_lock(&mut self) {
        self.state.keypad_locked = !self.state.keypad_locked;
        info!(locked = self.state.keypad_locked, "Keypad lock toggled");
        if self.state.keypad_locked {
            self.actuator.sound_long();
        } else {
            self.actuator.sound_short();
        }
    }

    fn handle_serial(&mut self) {
        let Some(lead) = self.commands.poll_leading(&mut self.serial) else {
            return;
        };
        self.emit(Response::Received(lead));

        let kind = match CommandKind::parse(lead) {
            Ok(kind) => kind,
            Err(error) => {
                debug!(%error, "Ignoring serial byte");
                self.emit(error.into());
                return;
            }
        };
        self.emit(Response::Executing(kind));
        if kind == CommandKind::Add {
            self.emit(Response::ReadingTagId);
        }

        match self
            .commands
            .read_parameters(kind, &mut self.serial, &self.clock)
        {
            Ok(command) => self.execute(command),
            Err(error) => {
                warn!(%error, command = %kind, "Serial command aborted");
                self.emit(error.into());
            }
        }
    }
}
