// Shared test doubles for integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use somfy_uai::event::{event_channel, EventSender};
use somfy_uai::{
    ClientEvent, ControllerConfig, EventReceiver, GroupInfo, ProtocolClient, Result, TargetInfo,
    UaiError,
};

/// A command as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Up(String),
    Down(String),
    Stop(String),
    MoveTo(String, u8),
    MoveToIntermediate(String, u8),
}

/// How a single id misbehaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemFailure {
    /// Every query answers with a JSON-RPC error
    ErrorResponse,
    /// Every query goes unanswered
    Timeout,
    /// Metadata is fine, the position reply is out of range
    GarbledPosition,
}

#[derive(Debug, Clone, Copy)]
pub enum ConnectFailure {
    Refused,
    InvalidPassword,
}

/// Scripted in-memory controller.
///
/// Targets and groups answer from the tables below; ids in `failing`
/// misbehave as recorded there. Every call is counted.
pub struct MockClient {
    events: EventSender,
    connected: AtomicBool,
    failures_left: AtomicUsize,
    failure_kind: Mutex<ConnectFailure>,
    targets: Mutex<HashMap<String, (TargetInfo, u8)>>,
    groups: Mutex<HashMap<String, GroupInfo>>,
    failing: Mutex<HashMap<String, ItemFailure>>,

    pub connect_times: Mutex<Vec<Instant>>,
    pub disconnects: AtomicUsize,
    pub info_queries: Mutex<HashMap<String, usize>>,
    pub position_queries: Mutex<HashMap<String, usize>>,
    pub group_queries: Mutex<HashMap<String, usize>>,
    pub sent: Mutex<Vec<Sent>>,
}

impl MockClient {
    pub fn new() -> Self {
        let (events, _) = event_channel(64);
        Self {
            events,
            connected: AtomicBool::new(false),
            failures_left: AtomicUsize::new(0),
            failure_kind: Mutex::new(ConnectFailure::Refused),
            targets: Mutex::new(HashMap::new()),
            groups: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashMap::new()),
            connect_times: Mutex::new(Vec::new()),
            disconnects: AtomicUsize::new(0),
            info_queries: Mutex::new(HashMap::new()),
            position_queries: Mutex::new(HashMap::new()),
            group_queries: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn with_target(self, id: &str, name: &str, kind: &str, closed_percentage: u8) -> Self {
        self.targets.lock().unwrap().insert(
            id.to_string(),
            (
                TargetInfo {
                    name: name.to_string(),
                    kind: kind.to_string(),
                },
                closed_percentage,
            ),
        );
        self
    }

    pub fn with_group(self, id: &str, name: &str) -> Self {
        self.groups
            .lock()
            .unwrap()
            .insert(id.to_string(), GroupInfo { name: name.to_string() });
        self
    }

    /// Fail the next `n` connects.
    pub fn failing_connects(self, n: usize, kind: ConnectFailure) -> Self {
        self.failures_left.store(n, Ordering::SeqCst);
        *self.failure_kind.lock().unwrap() = kind;
        self
    }

    pub fn set_position(&self, id: &str, closed_percentage: u8) {
        if let Some(entry) = self.targets.lock().unwrap().get_mut(id) {
            entry.1 = closed_percentage;
        }
    }

    pub fn fail_id(&self, id: &str) {
        self.fail_id_with(id, ItemFailure::ErrorResponse);
    }

    pub fn fail_id_with(&self, id: &str, failure: ItemFailure) {
        self.failing.lock().unwrap().insert(id.to_string(), failure);
    }

    pub fn heal_id(&self, id: &str) {
        self.failing.lock().unwrap().remove(id);
    }

    /// Simulate the controller dropping the session.
    pub fn drop_connection(&self, cause: &str) {
        self.connected.store(false, Ordering::SeqCst);
        let _ = self.events.send(ClientEvent::Disconnected {
            cause: cause.to_string(),
            requested: false,
        });
    }

    pub fn connect_attempts(&self) -> usize {
        self.connect_times.lock().unwrap().len()
    }

    pub fn info_count(&self, id: &str) -> usize {
        self.info_queries.lock().unwrap().get(id).copied().unwrap_or(0)
    }

    pub fn position_count(&self, id: &str) -> usize {
        self.position_queries.lock().unwrap().get(id).copied().unwrap_or(0)
    }

    pub fn group_count(&self, id: &str) -> usize {
        self.group_queries.lock().unwrap().get(id).copied().unwrap_or(0)
    }

    pub fn total_queries(&self) -> usize {
        let sum = |m: &Mutex<HashMap<String, usize>>| m.lock().unwrap().values().sum::<usize>();
        sum(&self.info_queries) + sum(&self.position_queries) + sum(&self.group_queries)
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    fn count(map: &Mutex<HashMap<String, usize>>, id: &str) {
        *map.lock().unwrap().entry(id.to_string()).or_insert(0) += 1;
    }

    fn check(&self, id: &str) -> Result<()> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(UaiError::Disconnected);
        }
        match self.failing.lock().unwrap().get(id) {
            Some(ItemFailure::ErrorResponse) => Err(UaiError::ErrorResponse {
                code: -32602,
                message: format!("Unknown id {id}"),
            }),
            Some(ItemFailure::Timeout) => Err(UaiError::CommandTimeout {
                method: "sdn.status".to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn command(&self, sent: Sent, id: &str) -> Result<()> {
        self.sent.lock().unwrap().push(sent);
        self.check(id)
    }
}

#[async_trait]
impl ProtocolClient for MockClient {
    async fn connect(&self) -> Result<()> {
        self.connect_times.lock().unwrap().push(Instant::now());

        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(match *self.failure_kind.lock().unwrap() {
                ConnectFailure::Refused => UaiError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "connection refused",
                )),
                ConnectFailure::InvalidPassword => UaiError::InvalidPassword {
                    user: "admin".to_string(),
                },
            });
        }

        self.connected.store(true, Ordering::SeqCst);
        let _ = self.events.send(ClientEvent::ConnectionReady);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        if self.connected.swap(false, Ordering::SeqCst) {
            let _ = self.events.send(ClientEvent::Disconnected {
                cause: "closed by client".to_string(),
                requested: true,
            });
        }
        Ok(())
    }

    async fn get_target_info(&self, target_id: &str) -> Result<TargetInfo> {
        Self::count(&self.info_queries, target_id);
        self.check(target_id)?;
        self.targets
            .lock()
            .unwrap()
            .get(target_id)
            .map(|(info, _)| info.clone())
            .ok_or_else(|| UaiError::ErrorResponse {
                code: -32602,
                message: "Unknown target".to_string(),
            })
    }

    async fn get_target_position(&self, target_id: &str) -> Result<u8> {
        Self::count(&self.position_queries, target_id);
        self.check(target_id)?;
        if self.failing.lock().unwrap().get(target_id) == Some(&ItemFailure::GarbledPosition) {
            return Err(UaiError::InvalidResponse {
                details: r#"invalid position in {"position":255}"#.to_string(),
            });
        }
        self.targets
            .lock()
            .unwrap()
            .get(target_id)
            .map(|(_, position)| *position)
            .ok_or_else(|| UaiError::ErrorResponse {
                code: -32602,
                message: "Unknown target".to_string(),
            })
    }

    async fn get_group_info(&self, group_id: &str) -> Result<GroupInfo> {
        Self::count(&self.group_queries, group_id);
        self.check(group_id)?;
        self.groups
            .lock()
            .unwrap()
            .get(group_id)
            .cloned()
            .ok_or_else(|| UaiError::ErrorResponse {
                code: -32602,
                message: "Unknown group".to_string(),
            })
    }

    async fn move_target_up(&self, target_id: &str) -> Result<()> {
        self.command(Sent::Up(target_id.to_string()), target_id)
    }

    async fn move_target_down(&self, target_id: &str) -> Result<()> {
        self.command(Sent::Down(target_id.to_string()), target_id)
    }

    async fn stop_target(&self, target_id: &str) -> Result<()> {
        self.command(Sent::Stop(target_id.to_string()), target_id)
    }

    async fn move_target_to_position(&self, target_id: &str, closed_percentage: u8) -> Result<()> {
        self.command(Sent::MoveTo(target_id.to_string(), closed_percentage), target_id)
    }

    async fn move_target_to_intermediate_position(
        &self,
        target_id: &str,
        position: u8,
    ) -> Result<()> {
        self.command(
            Sent::MoveToIntermediate(target_id.to_string(), position),
            target_id,
        )
    }

    fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }
}

pub fn config_for(target_ids: &[&str], group_ids: &[&str]) -> ControllerConfig {
    ControllerConfig::builder()
        .host("uai.local")
        .username("admin")
        .password("secret")
        .target_ids(target_ids.iter().copied())
        .group_ids(group_ids.iter().copied())
        .poll_interval(Duration::from_millis(1000))
        .reconnect_delay(Duration::from_secs(2))
        .build()
}

pub fn shared(client: MockClient) -> Arc<MockClient> {
    Arc::new(client)
}
