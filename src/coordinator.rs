// MIT License - Copyright (c) 2026 Peter Wright
// Coordinator: one per controller

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::client::ProtocolClient;
use crate::config::{is_valid_hostname, ControllerConfig};
use crate::constants::SETUP_READY_TIMEOUT;
use crate::error::{Result, UaiError};
use crate::event::ClientEvent;
use crate::lifecycle::ConnectionManager;
use crate::poll::{publish, spawn_poll_task, PollEngine, NOT_CONNECTED};
use crate::state::{ConnectionState, StateSnapshot};
use crate::transport::TelnetClient;

/// The single source of truth for everything attached to one controller.
///
/// Owns the connection lifecycle, the poll task and the latest snapshot.
/// Commands are forwarded to the protocol client unchanged; their effect
/// shows up in a later snapshot.
pub struct Coordinator {
    config: ControllerConfig,
    client: Arc<dyn ProtocolClient>,
    lifecycle: ConnectionManager,
    engine: Arc<Mutex<PollEngine>>,
    snapshots: watch::Sender<Arc<StateSnapshot>>,
    poll_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Coordinator {
    /// Create a coordinator talking telnet to `config.host`.
    pub fn new(config: ControllerConfig) -> Self {
        let client = Arc::new(TelnetClient::new(config.clone()));
        Self::with_client(config, client)
    }

    /// Create a coordinator over any protocol client.
    pub fn with_client(config: ControllerConfig, client: Arc<dyn ProtocolClient>) -> Self {
        let lifecycle = ConnectionManager::new(client.clone(), config.reconnect_delay);
        let engine = PollEngine::new(
            client.clone(),
            config.target_ids.clone(),
            config.group_ids.clone(),
        );
        let (snapshots, _) = watch::channel(Arc::new(StateSnapshot::unavailable(NOT_CONNECTED)));

        Self {
            config,
            client,
            lifecycle,
            engine: Arc::new(Mutex::new(engine)),
            snapshots,
            poll_handle: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Start connecting, reconnect indefinitely, and start polling.
    pub async fn connect_and_stay_connected(&self) {
        info!(
            "Starting coordinator for {} ({} targets, {} groups)",
            self.config.address(),
            self.config.target_ids.len(),
            self.config.group_ids.len()
        );
        self.lifecycle.start().await;

        let mut slot = self.poll_handle.lock().await;
        if slot.as_ref().is_none_or(|h| h.is_finished()) {
            *slot = Some(spawn_poll_task(
                self.engine.clone(),
                self.config.poll_interval,
                self.lifecycle.subscribe_state(),
                self.snapshots.clone(),
            ));
        }
    }

    /// Stop reconnecting and polling, then close the session.
    ///
    /// Idempotent. Cached metadata is kept, so a later
    /// [`connect_and_stay_connected`](Self::connect_and_stay_connected)
    /// does not re-query names.
    pub async fn async_disconnect(&self) -> Result<()> {
        if let Some(handle) = self.poll_handle.lock().await.take() {
            handle.abort();
            let _ = handle.await;
        }
        let result = self.lifecycle.stop().await;
        publish(&self.snapshots, StateSnapshot::unavailable(NOT_CONNECTED));
        debug!("Coordinator for {} disconnected", self.config.address());
        result
    }

    pub fn is_connection_ready(&self) -> bool {
        self.lifecycle.is_ready()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.lifecycle.state()
    }

    /// Suspend until the connection is ready. Callers wanting a bound must
    /// wrap this in their own timeout.
    pub async fn wait_for_connection_ready(&self) {
        self.lifecycle.wait_for_ready().await;
    }

    /// The latest published snapshot.
    pub fn current_snapshot(&self) -> Arc<StateSnapshot> {
        self.snapshots.borrow().clone()
    }

    /// Receive every published snapshot that differs from the previous one.
    pub fn subscribe(&self) -> watch::Receiver<Arc<StateSnapshot>> {
        self.snapshots.subscribe()
    }

    pub fn subscribe_connection(&self) -> watch::Receiver<ConnectionState> {
        self.lifecycle.subscribe_state()
    }

    /// Run one poll cycle now and publish its result.
    pub async fn refresh(&self) -> Arc<StateSnapshot> {
        let ready = self.is_connection_ready();
        let snapshot = self.engine.lock().await.poll_once(ready).await;
        publish(&self.snapshots, snapshot);
        self.current_snapshot()
    }

    // ---- Commands ----

    pub async fn move_up(&self, id: &str) -> Result<()> {
        debug!("Move up {}", id);
        self.client.move_target_up(id).await
    }

    pub async fn move_down(&self, id: &str) -> Result<()> {
        debug!("Move down {}", id);
        self.client.move_target_down(id).await
    }

    pub async fn stop(&self, id: &str) -> Result<()> {
        debug!("Stop {}", id);
        self.client.stop_target(id).await
    }

    /// Move to a closed percentage (0 = open, 100 = closed), passed through as given.
    pub async fn set_position(&self, id: &str, closed_percentage: u8) -> Result<()> {
        debug!("Move {} to {}% closed", id, closed_percentage);
        self.client.move_target_to_position(id, closed_percentage).await
    }

    pub async fn set_intermediate_position(&self, id: &str, position: u8) -> Result<()> {
        debug!("Move {} to intermediate position {}", id, position);
        self.client
            .move_target_to_intermediate_position(id, position)
            .await
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        if let Some(handle) = self.poll_handle.get_mut().take() {
            handle.abort();
        }
    }
}

/// Why a controller could not be set up.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("Invalid host: {0}")]
    InvalidHost(String),

    #[error("Cannot connect: {0}")]
    CannotConnect(String),

    #[error("Invalid username")]
    InvalidUsername,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<UaiError> for SetupError {
    fn from(e: UaiError) -> Self {
        match e {
            UaiError::InvalidUser { .. } => SetupError::InvalidUsername,
            UaiError::InvalidPassword { .. } => SetupError::InvalidPassword,
            e if e.is_connection_failure() => SetupError::CannotConnect(e.to_string()),
            e => SetupError::Unknown(e.to_string()),
        }
    }
}

/// Check that a controller is reachable and accepts the credentials.
pub async fn validate_connection(config: &ControllerConfig) -> std::result::Result<(), SetupError> {
    if !is_valid_hostname(&config.host) {
        return Err(SetupError::InvalidHost(config.host.clone()));
    }
    let client = TelnetClient::new(config.clone());
    validate_with_client(&client).await
}

/// Connect once, wait (bounded) for readiness, then disconnect.
pub async fn validate_with_client(client: &dyn ProtocolClient) -> std::result::Result<(), SetupError> {
    let mut events = client.subscribe();

    if let Err(e) = client.connect().await {
        let setup_error = SetupError::from(e);
        if let SetupError::Unknown(details) = &setup_error {
            error!("Unexpected error validating connection: {}", details);
        } else {
            warn!("Connection validation failed: {}", setup_error);
        }
        return Err(setup_error);
    }

    let ready = timeout(SETUP_READY_TIMEOUT, async {
        loop {
            match events.recv().await {
                Ok(ClientEvent::ConnectionReady) => return true,
                Ok(ClientEvent::Disconnected { .. }) => return false,
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return false,
            }
        }
    })
    .await;

    let _ = client.disconnect().await;
    match ready {
        Ok(true) => Ok(()),
        Ok(false) => Err(SetupError::CannotConnect("connection dropped".to_string())),
        Err(_) => Err(SetupError::CannotConnect("timed out waiting for connection".to_string())),
    }
}
