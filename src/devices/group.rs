// MIT License - Copyright (c) 2026 Peter Wright
// Cover group entity

use crate::coordinator::Coordinator;
use crate::devices::cover::CoverFeatures;
use crate::error::Result;
use crate::state::StateSnapshot;

/// A controller-defined group of covers, commanded as one unit.
///
/// Groups have no position readout, so `is_closed` stays unknown.
#[derive(Debug, Clone)]
pub struct CoverGroup {
    pub group_id: String,
    pub name: String,
    pub available: bool,
    pub is_closed: Option<bool>,
}

impl CoverGroup {
    pub const FEATURES: CoverFeatures = CoverFeatures::OPEN
        .union(CoverFeatures::CLOSE)
        .union(CoverFeatures::STOP);

    pub fn new(group_id: impl Into<String>) -> Self {
        let group_id = group_id.into();
        Self {
            name: format!("Group {}", group_id),
            group_id,
            available: false,
            is_closed: None,
        }
    }

    /// Refresh from a snapshot. Returns true if the name changed.
    pub fn update(&mut self, snapshot: &StateSnapshot, connection_ready: bool) -> bool {
        self.available = false;
        let Some(state) = snapshot.group(&self.group_id) else {
            return false;
        };
        let name_changed = self.name != state.name;
        self.name = state.name.clone();
        self.available = connection_ready;
        name_changed
    }

    // Groups take the same verbs as targets, addressed by group id

    pub async fn open(&self, coordinator: &Coordinator) -> Result<()> {
        coordinator.move_up(&self.group_id).await
    }

    pub async fn close(&self, coordinator: &Coordinator) -> Result<()> {
        coordinator.move_down(&self.group_id).await
    }

    pub async fn stop(&self, coordinator: &Coordinator) -> Result<()> {
        coordinator.stop(&self.group_id).await
    }

    pub async fn set_intermediate_position(
        &self,
        coordinator: &Coordinator,
        intermediate_position: u8,
    ) -> Result<()> {
        coordinator
            .set_intermediate_position(&self.group_id, intermediate_position)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{DeviceState, GroupState};

    #[test]
    fn test_group_update() {
        let mut group = CoverGroup::new("0000AA");
        assert_eq!(group.name, "Group 0000AA");
        assert!(!group.available);

        let mut snapshot = StateSnapshot::default();
        snapshot.device_states.insert(
            "0000AA".to_string(),
            DeviceState::Group(GroupState { name: "Upstairs".to_string() }),
        );
        assert!(group.update(&snapshot, true));
        assert!(group.available);
        assert_eq!(group.name, "Upstairs");
        assert!(!group.update(&snapshot, true));

        group.update(&StateSnapshot::default(), true);
        assert!(!group.available);
        assert_eq!(group.name, "Upstairs");
        assert_eq!(group.is_closed, None);
    }

    #[test]
    fn test_group_features() {
        assert!(!CoverGroup::FEATURES.contains(CoverFeatures::SET_POSITION));
        assert_eq!(CoverGroup::FEATURES.names(), vec!["OPEN", "CLOSE", "STOP"]);
    }
}
