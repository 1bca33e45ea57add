// MIT License - Copyright (c) 2026 Peter Wright
// Connectivity indicator

use crate::state::ConnectionState;

/// Diagnostic on/off indicator mirroring whether the controller is reachable.
#[derive(Debug, Clone, Default)]
pub struct ConnectionIndicator {
    pub name: String,
    pub is_on: bool,
}

impl ConnectionIndicator {
    pub fn new(controller_name: &str) -> Self {
        Self {
            name: format!("{} Connection State", controller_name),
            is_on: false,
        }
    }

    /// Returns true if the indicator flipped.
    pub fn update(&mut self, state: ConnectionState) -> bool {
        let is_on = state.is_ready();
        let changed = self.is_on != is_on;
        self.is_on = is_on;
        changed
    }
}
