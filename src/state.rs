// MIT License - Copyright (c) 2026 Peter Wright
// Published device state

use std::collections::HashMap;
use std::fmt;

/// Opaque controller identifier of a target or group.
///
/// Whether an id names a target or a group is decided only by the list it
/// was configured in.
pub type DeviceId = String;

/// Polled state of a single cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetState {
    /// Controller label; fetched once per coordinator
    pub name: String,
    /// Motor type (e.g. "Glydea"); fetched once per coordinator
    pub kind: String,
    /// 0 = fully open, 100 = fully closed; fetched every cycle
    pub closed_percentage: u8,
}

/// Polled state of a group. Groups report no position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupState {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceState {
    Target(TargetState),
    Group(GroupState),
}

impl DeviceState {
    pub fn name(&self) -> &str {
        match self {
            DeviceState::Target(t) => &t.name,
            DeviceState::Group(g) => &g.name,
        }
    }

    pub fn as_target(&self) -> Option<&TargetState> {
        match self {
            DeviceState::Target(t) => Some(t),
            DeviceState::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&GroupState> {
        match self {
            DeviceState::Group(g) => Some(g),
            DeviceState::Target(_) => None,
        }
    }
}

/// The result of one poll cycle.
///
/// Never mutated after publication; each cycle builds a new one. An id
/// missing from `device_states` is unavailable for this cycle only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateSnapshot {
    pub device_states: HashMap<DeviceId, DeviceState>,
    pub error: Option<String>,
}

impl StateSnapshot {
    /// Snapshot published when the connection is not ready.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            device_states: HashMap::new(),
            error: Some(reason.into()),
        }
    }

    pub fn get(&self, id: &str) -> Option<&DeviceState> {
        self.device_states.get(id)
    }

    pub fn target(&self, id: &str) -> Option<&TargetState> {
        self.get(id).and_then(DeviceState::as_target)
    }

    pub fn group(&self, id: &str) -> Option<&GroupState> {
        self.get(id).and_then(DeviceState::as_group)
    }

    pub fn is_empty(&self) -> bool {
        self.device_states.is_empty()
    }
}

/// Connection state as seen by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    /// Connecting or reconnecting
    Connecting,
    Ready,
}

impl ConnectionState {
    pub fn is_ready(&self) -> bool {
        matches!(self, ConnectionState::Ready)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Ready => "ready",
        };
        f.write_str(s)
    }
}
