//! Scripted front panel: buttons and light sensor.

use crate::traits::PanelInputs;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy)]
struct PanelState {
    green: bool,
    red: bool,
    light: u16,
}

fn lock(state: &Mutex<PanelState>) -> MutexGuard<'_, PanelState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Simulated panel whose inputs are set through a [`SimPanelHandle`].
#[derive(Debug)]
pub struct SimPanel {
    state: Arc<Mutex<PanelState>>,
}

impl SimPanel {
    /// Both buttons released, light level 0 (bright daylight).
    pub fn new() -> (Self, SimPanelHandle) {
        let state = Arc::new(Mutex::new(PanelState {
            green: false,
            red: false,
            light: 0,
        }));
        let handle = SimPanelHandle {
            state: Arc::clone(&state),
        };
        (Self { state }, handle)
    }
}

impl PanelInputs for SimPanel {
    fn green_pressed(&mut self) -> bool {
        lock(&self.state).green
    }

    fn red_pressed(&mut self) -> bool {
        lock(&self.state).red
    }

    fn light_level(&mut self) -> u16 {
        lock(&self.state).light
    }
}

#[derive(Debug, Clone)]
pub struct SimPanelHandle {
    state: Arc<Mutex<PanelState>>,
}

impl SimPanelHandle {
    pub fn set_green(&self, pressed: bool) {
        lock(&self.state).green = pressed;
    }

    pub fn set_red(&self, pressed: bool) {
        lock(&self.state).red = pressed;
    }

    pub fn set_light(&self, level: u16) {
        lock(&self.state).light = level;
    }
}
