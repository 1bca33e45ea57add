// MIT License - Copyright (c) 2026 Peter Wright
// Periodic state polling with a metadata cache

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::client::{GroupInfo, ProtocolClient, TargetInfo};
use crate::error::{Result, UaiError};
use crate::state::{ConnectionState, DeviceId, DeviceState, GroupState, StateSnapshot, TargetState};

/// Reason carried by snapshots published while the connection is down.
pub const NOT_CONNECTED: &str = "not connected";

/// Builds one [`StateSnapshot`] per cycle.
///
/// Names and kinds are fetched once per id and kept for the lifetime of the
/// engine, across reconnects. Positions are fetched every cycle.
pub struct PollEngine {
    client: Arc<dyn ProtocolClient>,
    target_ids: Vec<DeviceId>,
    group_ids: Vec<DeviceId>,
    target_cache: HashMap<DeviceId, TargetInfo>,
    group_cache: HashMap<DeviceId, GroupInfo>,
}

impl PollEngine {
    pub fn new(
        client: Arc<dyn ProtocolClient>,
        target_ids: Vec<DeviceId>,
        group_ids: Vec<DeviceId>,
    ) -> Self {
        Self {
            client,
            target_ids,
            group_ids,
            target_cache: HashMap::new(),
            group_cache: HashMap::new(),
        }
    }

    /// Run one poll cycle.
    ///
    /// When `ready` is false no queries are issued and the snapshot is empty.
    /// Any failure confined to one id (error response, timeout, malformed
    /// reply) drops that id from this snapshot only. Losing the session ends
    /// the cycle early with an unavailable snapshot.
    pub async fn poll_once(&mut self, ready: bool) -> StateSnapshot {
        if !ready {
            return StateSnapshot::unavailable(NOT_CONNECTED);
        }

        let mut snapshot = StateSnapshot::default();

        for i in 0..self.target_ids.len() {
            let id = self.target_ids[i].clone();
            match self.poll_target(&id).await {
                Ok(state) => {
                    snapshot.device_states.insert(id, DeviceState::Target(state));
                }
                Err(e) => {
                    if let Some(aborted) = self.check_item_failure("target", &id, e) {
                        return aborted;
                    }
                }
            }
        }

        for i in 0..self.group_ids.len() {
            let id = self.group_ids[i].clone();
            match self.poll_group(&id).await {
                Ok(state) => {
                    snapshot.device_states.insert(id, DeviceState::Group(state));
                }
                Err(e) => {
                    if let Some(aborted) = self.check_item_failure("group", &id, e) {
                        return aborted;
                    }
                }
            }
        }

        debug!("Poll cycle complete: {} devices", snapshot.device_states.len());
        snapshot
    }

    async fn poll_target(&mut self, id: &str) -> Result<TargetState> {
        let info = match self.target_cache.get(id) {
            Some(info) => info.clone(),
            None => {
                let info = self.client.get_target_info(id).await?;
                debug!("Target {} is '{}' ({})", id, info.name, info.kind);
                self.target_cache.insert(id.to_string(), info.clone());
                info
            }
        };

        let closed_percentage = self.client.get_target_position(id).await?;
        Ok(TargetState {
            name: info.name,
            kind: info.kind,
            closed_percentage,
        })
    }

    async fn poll_group(&mut self, id: &str) -> Result<GroupState> {
        let info = match self.group_cache.get(id) {
            Some(info) => info.clone(),
            None => {
                let info = self.client.get_group_info(id).await?;
                debug!("Group {} is '{}'", id, info.name);
                self.group_cache.insert(id.to_string(), info.clone());
                info
            }
        };
        Ok(GroupState { name: info.name })
    }

    /// Log a per-item failure. Returns the snapshot to publish if the cycle
    /// must stop here.
    fn check_item_failure(&self, what: &str, id: &str, e: UaiError) -> Option<StateSnapshot> {
        if e.is_session_lost() {
            warn!("Poll cycle aborted at {} {}: {}", what, id, e);
            return Some(StateSnapshot::unavailable(e.to_string()));
        }
        warn!("Request for {} ID {} failed with error: {}", what, id, e);
        None
    }

    pub fn cached_target(&self, id: &str) -> Option<&TargetInfo> {
        self.target_cache.get(id)
    }

    pub fn cached_group(&self, id: &str) -> Option<&GroupInfo> {
        self.group_cache.get(id)
    }
}

/// Spawn the periodic poll task.
///
/// Cycles never overlap: a tick that falls due while a cycle is still
/// running is skipped.
pub fn spawn_poll_task(
    engine: Arc<Mutex<PollEngine>>,
    period: Duration,
    connection: watch::Receiver<ConnectionState>,
    snapshots: watch::Sender<Arc<StateSnapshot>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let ready = connection.borrow().is_ready();
            let snapshot = engine.lock().await.poll_once(ready).await;
            publish(&snapshots, snapshot);
        }
    })
}

/// Replace the published snapshot, waking subscribers only if it changed.
pub fn publish(snapshots: &watch::Sender<Arc<StateSnapshot>>, snapshot: StateSnapshot) {
    snapshots.send_if_modified(|current| {
        if **current == snapshot {
            return false;
        }
        *current = Arc::new(snapshot);
        true
    });
}
