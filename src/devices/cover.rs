// MIT License - Copyright (c) 2026 Peter Wright
// Cover entity for a single target

use bitflags::bitflags;

use crate::coordinator::Coordinator;
use crate::error::Result;
use crate::state::StateSnapshot;

bitflags! {
    /// Operations a cover entity supports.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CoverFeatures: u8 {
        const OPEN         = 0b0000_0001;
        const CLOSE        = 0b0000_0010;
        const SET_POSITION = 0b0000_0100;
        const STOP         = 0b0000_1000;
    }
}

impl CoverFeatures {
    /// Feature names, in flag order, for publishing.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.contains(Self::OPEN) { names.push("OPEN"); }
        if self.contains(Self::CLOSE) { names.push("CLOSE"); }
        if self.contains(Self::SET_POSITION) { names.push("SET_POSITION"); }
        if self.contains(Self::STOP) { names.push("STOP"); }
        names
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Curtain,
    Shade,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Curtain => "curtain",
            Self::Shade => "shade",
        }
    }
}

/// Motor types reported by the controller with a friendlier model name.
const KNOWN_MODELS: [(&str, &str, DeviceClass); 3] = [
    ("Glydea", "Glydea", DeviceClass::Curtain),
    ("Sonesse 30", "Sonesse 30", DeviceClass::Shade),
    ("LSU 50", "Sonesse 50", DeviceClass::Shade),
];

/// Model name and device class for a motor type.
///
/// Unknown types keep the raw name and have no class.
pub fn model_for_kind(kind: &str) -> (String, Option<DeviceClass>) {
    KNOWN_MODELS
        .iter()
        .find(|(k, _, _)| *k == kind)
        .map_or((kind.to_string(), None), |(_, model, class)| {
            (model.to_string(), Some(*class))
        })
}

/// A single motorised cover.
///
/// Positions follow the host convention: 0 = closed, 100 = open.
#[derive(Debug, Clone)]
pub struct Cover {
    pub target_id: String,
    pub name: String,
    pub model: Option<String>,
    pub device_class: Option<DeviceClass>,
    pub available: bool,
    pub position: Option<u8>,
    pub is_closed: Option<bool>,
    pub is_opening: bool,
    pub is_closing: bool,
}

impl Cover {
    pub const FEATURES: CoverFeatures = CoverFeatures::OPEN
        .union(CoverFeatures::CLOSE)
        .union(CoverFeatures::SET_POSITION)
        .union(CoverFeatures::STOP);

    pub fn new(target_id: impl Into<String>) -> Self {
        let target_id = target_id.into();
        Self {
            name: format!("Cover {}", target_id),
            target_id,
            model: None,
            device_class: None,
            available: false,
            position: None,
            is_closed: None,
            is_opening: false,
            is_closing: false,
        }
    }

    /// Refresh from a snapshot. Returns true if the name or model changed.
    ///
    /// A target missing from the snapshot becomes unavailable but keeps its
    /// last known name and position.
    pub fn update(&mut self, snapshot: &StateSnapshot, connection_ready: bool) -> bool {
        self.available = false;
        let Some(state) = snapshot.target(&self.target_id) else {
            return false;
        };

        let (model, device_class) = model_for_kind(&state.kind);
        let metadata_changed =
            self.model.as_deref() != Some(model.as_str()) || self.name != state.name;
        self.name = state.name.clone();
        self.model = Some(model);
        self.device_class = device_class;

        let position = 100 - state.closed_percentage.min(100);
        let last_position = self.position;

        self.available = connection_ready;
        self.position = Some(position);
        self.is_closed = Some(position == 0);
        self.is_opening = false;
        self.is_closing = false;
        // Direction is only meaningful while between the end stops
        if let Some(last) = last_position
            && position > 0
            && position < 100
        {
            self.is_opening = last < position;
            self.is_closing = last > position;
        }

        metadata_changed
    }

    pub async fn open(&self, coordinator: &Coordinator) -> Result<()> {
        coordinator.move_up(&self.target_id).await
    }

    pub async fn close(&self, coordinator: &Coordinator) -> Result<()> {
        coordinator.move_down(&self.target_id).await
    }

    pub async fn stop(&self, coordinator: &Coordinator) -> Result<()> {
        coordinator.stop(&self.target_id).await
    }

    /// Move to a host position (100 = open).
    pub async fn set_position(&self, coordinator: &Coordinator, position: u8) -> Result<()> {
        coordinator
            .set_position(&self.target_id, 100 - position.min(100))
            .await
    }

    pub async fn set_intermediate_position(
        &self,
        coordinator: &Coordinator,
        intermediate_position: u8,
    ) -> Result<()> {
        coordinator
            .set_intermediate_position(&self.target_id, intermediate_position)
            .await
    }
}
