// MIT License - Copyright (c) 2026 Peter Wright
// Connection lifecycle: connect, stay connected, reconnect

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::client::ProtocolClient;
use crate::error::Result;
use crate::event::{ClientEvent, EventReceiver};
use crate::state::ConnectionState;

/// Keeps at most one session to the controller alive while the
/// stay-connected flag is set.
///
/// ```text
/// Idle ──start()──▶ Connecting ──ok──▶ Ready
///                     ▲   │ err: wait backoff, retry
///                     │   ▼
///                  Disconnected notification (stay-connected)
/// stop() from any state ──▶ Idle
/// ```
///
/// Credential failures are retried like any other connection failure.
pub struct ConnectionManager {
    inner: Arc<Inner>,
    listener_handle: JoinHandle<()>,
}

struct Inner {
    client: Arc<dyn ProtocolClient>,
    reconnect_delay: Duration,
    stay_connected: watch::Sender<bool>,
    state: watch::Sender<ConnectionState>,
    /// Count of unrequested session losses seen by the listener
    session_drops: AtomicU64,
    reconnect: Mutex<ReconnectSlot>,
}

/// The reconnect loop task. `running` is cleared by the loop itself, under
/// this lock, as its last action.
#[derive(Default)]
struct ReconnectSlot {
    handle: Option<JoinHandle<()>>,
    running: bool,
}

impl ConnectionManager {
    /// Create the manager and start listening for client notifications.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(client: Arc<dyn ProtocolClient>, reconnect_delay: Duration) -> Self {
        let events = client.subscribe();
        let (stay_connected, _) = watch::channel(false);
        let (state, _) = watch::channel(ConnectionState::Disconnected);

        let inner = Arc::new(Inner {
            client,
            reconnect_delay,
            stay_connected,
            state,
            session_drops: AtomicU64::new(0),
            reconnect: Mutex::new(ReconnectSlot::default()),
        });
        let listener_handle = tokio::spawn(listen(inner.clone(), events));

        Self {
            inner,
            listener_handle,
        }
    }

    /// Set stay-connected and spawn the reconnect loop unless one is running.
    pub async fn start(&self) {
        self.inner.stay_connected.send_replace(true);
        self.inner.spawn_loop_if_idle().await;
    }

    /// Clear stay-connected, wait for the reconnect loop to exit, then close
    /// the session. Safe to call more than once.
    pub async fn stop(&self) -> Result<()> {
        self.inner.stay_connected.send_replace(false);

        let handle = self.inner.reconnect.lock().await.handle.take();
        if let Some(handle) = handle {
            debug!("Waiting for reconnect loop to exit");
            if let Err(e) = handle.await {
                warn!("Reconnect loop ended abnormally: {}", e);
            }
        }

        let result = self.inner.client.disconnect().await;
        self.inner.set_state(ConnectionState::Disconnected);
        result
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.state().is_ready()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Suspend until the connection is ready. Returns at once if it already is.
    pub async fn wait_for_ready(&self) {
        let mut state = self.inner.state.subscribe();
        // The sender lives as long as self, so this only errs if we are torn down
        let _ = state.wait_for(ConnectionState::is_ready).await;
    }

    pub fn stay_connected(&self) -> bool {
        *self.inner.stay_connected.borrow()
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.listener_handle.abort();
        if let Ok(mut slot) = self.inner.reconnect.try_lock()
            && let Some(handle) = slot.handle.take()
        {
            handle.abort();
        }
    }
}

impl Inner {
    fn set_state(&self, new_state: ConnectionState) {
        self.state.send_if_modified(|state| {
            if *state == new_state {
                return false;
            }
            debug!("Connection state: {} -> {}", state, new_state);
            *state = new_state;
            true
        });
    }

    fn should_stay_connected(&self) -> bool {
        *self.stay_connected.borrow()
    }

    fn session_drops(&self) -> u64 {
        self.session_drops.load(Ordering::SeqCst)
    }

    async fn spawn_loop_if_idle(self: &Arc<Self>) {
        let mut slot = self.reconnect.lock().await;
        if slot.running {
            debug!("Reconnect loop already running");
            return;
        }
        // Checked under the lock so stop() cannot miss a loop spawned here
        if !self.should_stay_connected() {
            return;
        }
        slot.running = true;
        slot.handle = Some(tokio::spawn(reconnect_loop(self.clone())));
    }
}

/// Attempt to connect until one attempt succeeds or stay-connected is cleared.
///
/// A session lost while `connect()` was still returning counts as a failed
/// attempt. Both exits clear `running` under the slot lock, so a loss seen
/// after that point spawns a fresh loop.
async fn reconnect_loop(inner: Arc<Inner>) {
    let mut attempt: u32 = 0;
    let mut flag = inner.stay_connected.subscribe();

    loop {
        if !inner.should_stay_connected() {
            let mut slot = inner.reconnect.lock().await;
            // start() may have raised the flag again while we waited
            if !inner.should_stay_connected() {
                slot.running = false;
                break;
            }
        }

        attempt += 1;
        inner.set_state(ConnectionState::Connecting);
        debug!("Connection attempt {}", attempt);

        let drops_before = inner.session_drops();
        match inner.client.connect().await {
            Ok(()) => {
                let mut slot = inner.reconnect.lock().await;
                if inner.session_drops() == drops_before {
                    info!("Connected after {} attempt(s)", attempt);
                    inner.set_state(ConnectionState::Ready);
                    slot.running = false;
                    return;
                }
                warn!("Session lost during connection attempt {}", attempt);
            }
            Err(e) => {
                if e.is_invalid_credentials() {
                    warn!("Connection attempt {} rejected: {}", attempt, e);
                } else {
                    warn!("Connection attempt {} failed: {}", attempt, e);
                }
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(inner.reconnect_delay) => {}
            _ = flag.wait_for(|stay| !*stay) => {
                debug!("Stay-connected cleared during backoff");
            }
        }
    }

    debug!("Reconnect loop exiting");
}

/// Translate client notifications into state transitions and respawn the
/// reconnect loop after an unexpected disconnect.
async fn listen(inner: Arc<Inner>, mut events: EventReceiver) {
    loop {
        match events.recv().await {
            Ok(ClientEvent::ConnectionReady) => {
                if inner.should_stay_connected() {
                    inner.set_state(ConnectionState::Ready);
                }
            }
            Ok(ClientEvent::Disconnected { cause, requested }) => {
                if !inner.should_stay_connected() {
                    info!("Disconnected from controller ({})", cause);
                    inner.set_state(ConnectionState::Disconnected);
                } else if requested {
                    // Our own stop(), delivered after a later start()
                    debug!("Ignoring requested disconnect ({})", cause);
                } else {
                    warn!("Disconnected from controller ({}), reconnecting", cause);
                    inner.session_drops.fetch_add(1, Ordering::SeqCst);
                    inner.set_state(ConnectionState::Connecting);
                    inner.spawn_loop_if_idle().await;
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("Missed {} client notifications", n);
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("Client notification channel closed");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{GroupInfo, TargetInfo};
    use crate::error::UaiError;
    use crate::event::{event_channel, EventSender};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails the first `failures` connects, then succeeds.
    struct FlakyClient {
        failures: usize,
        /// The first successful session is lost before connect() returns
        lose_first_session: bool,
        connects: AtomicUsize,
        disconnects: AtomicUsize,
        events: EventSender,
    }

    impl FlakyClient {
        fn new(failures: usize) -> Arc<Self> {
            Arc::new(Self::build(failures, false))
        }

        fn losing_first_session() -> Arc<Self> {
            Arc::new(Self::build(0, true))
        }

        fn build(failures: usize, lose_first_session: bool) -> Self {
            let (events, _) = event_channel(16);
            Self {
                failures,
                lose_first_session,
                connects: AtomicUsize::new(0),
                disconnects: AtomicUsize::new(0),
                events,
            }
        }
    }

    #[async_trait]
    impl ProtocolClient for FlakyClient {
        async fn connect(&self) -> Result<()> {
            let n = self.connects.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                return Err(UaiError::ConnectionTimeout);
            }
            let _ = self.events.send(ClientEvent::ConnectionReady);
            if self.lose_first_session && n == self.failures {
                let _ = self.events.send(ClientEvent::Disconnected {
                    cause: "eof".to_string(),
                    requested: false,
                });
                // Let the listener see the loss before we report success
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            Ok(())
        }
        async fn disconnect(&self) -> Result<()> {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
            let _ = self.events.send(ClientEvent::Disconnected {
                cause: "closed by client".to_string(),
                requested: true,
            });
            Ok(())
        }
        async fn get_target_info(&self, _: &str) -> Result<TargetInfo> {
            unimplemented!()
        }
        async fn get_target_position(&self, _: &str) -> Result<u8> {
            unimplemented!()
        }
        async fn get_group_info(&self, _: &str) -> Result<GroupInfo> {
            unimplemented!()
        }
        async fn move_target_up(&self, _: &str) -> Result<()> {
            unimplemented!()
        }
        async fn move_target_down(&self, _: &str) -> Result<()> {
            unimplemented!()
        }
        async fn stop_target(&self, _: &str) -> Result<()> {
            unimplemented!()
        }
        async fn move_target_to_position(&self, _: &str, _: u8) -> Result<()> {
            unimplemented!()
        }
        async fn move_target_to_intermediate_position(&self, _: &str, _: u8) -> Result<()> {
            unimplemented!()
        }
        fn subscribe(&self) -> EventReceiver {
            self.events.subscribe()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_connects_first_time() {
        let client = FlakyClient::new(0);
        let manager = ConnectionManager::new(client.clone(), Duration::from_secs(2));
        assert_eq!(manager.state(), ConnectionState::Disconnected);

        manager.start().await;
        manager.wait_for_ready().await;
        assert!(manager.is_ready());
        assert_eq!(client.connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_backoff_exits_promptly() {
        let client = FlakyClient::new(usize::MAX);
        let manager = ConnectionManager::new(client.clone(), Duration::from_secs(3600));
        manager.start().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(client.connects.load(Ordering::SeqCst), 1);

        // Must not wait out the hour-long backoff
        tokio::time::timeout(Duration::from_secs(1), manager.stop())
            .await
            .expect("stop() hung in backoff")
            .unwrap();
        assert_eq!(client.connects.load(Ordering::SeqCst), 1);
        assert_eq!(client.disconnects.load(Ordering::SeqCst), 1);
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_notification_respawns_loop() {
        let client = FlakyClient::new(0);
        let manager = ConnectionManager::new(client.clone(), Duration::from_secs(2));
        manager.start().await;
        manager.wait_for_ready().await;

        let _ = client.events.send(ClientEvent::Disconnected {
            cause: "reset".to_string(),
            requested: false,
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        manager.wait_for_ready().await;
        assert_eq!(client.connects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_notification_ignored_after_stop() {
        let client = FlakyClient::new(0);
        let manager = ConnectionManager::new(client.clone(), Duration::from_secs(2));
        manager.start().await;
        manager.wait_for_ready().await;
        manager.stop().await.unwrap();

        let _ = client.events.send(ClientEvent::Disconnected {
            cause: "closed by client".to_string(),
            requested: true,
        });
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(client.connects.load(Ordering::SeqCst), 1);
        assert!(!manager.is_ready());
        assert!(!manager.stay_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_lost_while_connecting_is_retried() {
        let client = FlakyClient::losing_first_session();
        let manager = ConnectionManager::new(client.clone(), Duration::from_secs(2));
        manager.start().await;

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(client.connects.load(Ordering::SeqCst), 2);
        assert!(manager.is_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn test_own_disconnect_does_not_disturb_restart() {
        let client = FlakyClient::new(0);
        let manager = ConnectionManager::new(client.clone(), Duration::from_secs(2));
        manager.start().await;
        manager.wait_for_ready().await;

        // The requested disconnect from stop() is still queued when start() runs
        manager.stop().await.unwrap();
        manager.start().await;
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(client.connects.load(Ordering::SeqCst), 2);
        assert_eq!(client.disconnects.load(Ordering::SeqCst), 1);
        assert!(manager.is_ready());
    }
}
