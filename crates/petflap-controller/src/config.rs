//! Runtime configuration of the controller.
//!
//! Loaded from JSON; every field is optional and falls back to the firmware
//! default. Persisted settings (light threshold, relock delay, silent flag)
//! live in the configuration region of the EEPROM; the values here only
//! seed them when the medium holds nothing valid.
//!
//! ```
//! use petflap_controller::FlapConfig;
//!
//! let config = FlapConfig::from_json(r#"{ "relock_delay_ms": 6000 }"#).unwrap();
//! assert_eq!(config.relock_delay_ms, 6000);
//! assert_eq!(config.buttons.learn_press_ms, 10_000);
//! ```

use crate::error::{ConfigError, Result};
use petflap_core::constants::{
    DEFAULT_LIGHT_THRESHOLD, DEFAULT_RELOCK_DELAY_MS, LEARN_PRESS_MS, LEARN_TIMEOUT_MS,
    LIGHT_READ_PERIOD_MS, LOCK_TIME_INACTIVITY_MS, LONG_PRESS_MS, MAX_LIGHT_LEVEL,
    MAX_RELOCK_DELAY_MS, MIN_RELOCK_DELAY_MS, NIGHT_HYSTERESIS, SCAN_RELAX_MS,
    SERIAL_BYTE_TIMEOUT_MS, SHORT_PRESS_MS, VERY_LONG_PRESS_MS,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlapConfig {
    /// Relock delay used when none is persisted yet.
    pub relock_delay_ms: u32,
    pub light_read_period_ms: u32,
    pub learn_timeout_ms: u32,
    pub learn_retry_delay_ms: u32,
    /// Pause after every door-gating decode attempt.
    pub scan_relax_ms: u32,
    /// Dead band below the threshold before Night mode unlocks the exit.
    pub night_hysteresis: u16,
    /// Light threshold used when none is persisted yet.
    pub default_light_threshold: u16,
    pub serial_byte_timeout_ms: u32,
    pub buttons: ButtonThresholds,
    pub lock_time_inactivity_ms: u32,
}

impl Default for FlapConfig {
    fn default() -> Self {
        Self {
            relock_delay_ms: DEFAULT_RELOCK_DELAY_MS,
            light_read_period_ms: LIGHT_READ_PERIOD_MS,
            learn_timeout_ms: LEARN_TIMEOUT_MS,
            learn_retry_delay_ms: SCAN_RELAX_MS,
            scan_relax_ms: SCAN_RELAX_MS,
            night_hysteresis: NIGHT_HYSTERESIS,
            default_light_threshold: DEFAULT_LIGHT_THRESHOLD,
            serial_byte_timeout_ms: SERIAL_BYTE_TIMEOUT_MS,
            buttons: ButtonThresholds::default(),
            lock_time_inactivity_ms: LOCK_TIME_INACTIVITY_MS,
        }
    }
}

/// Hold durations separating the button gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonThresholds {
    /// Red below this toggles Night; both above this arms the menu.
    pub short_press_ms: u32,
    /// Red above this toggles Vet.
    pub long_press_ms: u32,
    /// Green above this starts Learn.
    pub learn_press_ms: u32,
    /// Red above this toggles the keypad lock; both above this clears.
    pub very_long_press_ms: u32,
}

impl Default for ButtonThresholds {
    fn default() -> Self {
        Self {
            short_press_ms: SHORT_PRESS_MS,
            long_press_ms: LONG_PRESS_MS,
            learn_press_ms: LEARN_PRESS_MS,
            very_long_press_ms: VERY_LONG_PRESS_MS,
        }
    }
}

impl FlapConfig {
    /// Parse and validate a JSON document.
    ///
    /// # Errors
    /// Returns `ConfigError::Parse` on malformed JSON and the errors of
    /// [`FlapConfig::validate`] otherwise.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: FlapConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns `ConfigError::OutOfRange` for a relock delay outside
    /// 1000..=25000 ms or a light threshold above the sensor range, and
    /// `ConfigError::Thresholds` when the button thresholds are not strictly
    /// increasing.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_RELOCK_DELAY_MS..=MAX_RELOCK_DELAY_MS).contains(&self.relock_delay_ms) {
            return Err(ConfigError::out_of_range(
                "relock_delay_ms",
                self.relock_delay_ms,
            ));
        }
        if self.default_light_threshold > MAX_LIGHT_LEVEL {
            return Err(ConfigError::out_of_range(
                "default_light_threshold",
                u32::from(self.default_light_threshold),
            ));
        }
        let b = &self.buttons;
        if !(b.short_press_ms < b.long_press_ms
            && b.long_press_ms < b.learn_press_ms
            && b.learn_press_ms < b.very_long_press_ms)
        {
            return Err(ConfigError::Thresholds(*b));
        }
        Ok(())
    }
}
