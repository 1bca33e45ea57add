// MIT License - Copyright (c) 2026 Peter Wright
// Request/response engine

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{oneshot, Mutex, RwLock};
use tokio::time::{timeout, Duration};
use tracing::{debug, error, warn};

use crate::constants::MAX_REQUEST_ID;
use crate::error::{Result, UaiError};
use crate::protocol::{Request, Response};

pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Tracks pending requests and routes responses back to callers via oneshot channels.
///
/// Several callers may have requests in flight at once (the poll task and a
/// user command); each waits only for the line carrying its own id.
pub struct CommandEngine {
    /// Next request id, cycles 1..=MAX_REQUEST_ID
    next_id: Mutex<u32>,
    /// Map of pending request ids to their response senders
    pending: Arc<Mutex<HashMap<u32, oneshot::Sender<Response>>>>,
    writer: Mutex<BoxedWriter>,
    connected: Arc<RwLock<bool>>,
    request_timeout: Duration,
}

impl CommandEngine {
    pub fn new(writer: BoxedWriter, request_timeout: Duration) -> Self {
        Self {
            next_id: Mutex::new(1),
            pending: Arc::new(Mutex::new(HashMap::new())),
            writer: Mutex::new(writer),
            connected: Arc::new(RwLock::new(true)),
            request_timeout,
        }
    }

    pub async fn set_connected(&self, connected: bool) {
        *self.connected.write().await = connected;
    }

    pub async fn is_connected(&self) -> bool {
        *self.connected.read().await
    }

    async fn allocate_id(&self) -> u32 {
        let mut next = self.next_id.lock().await;
        let id = *next;
        *next = if id >= MAX_REQUEST_ID { 1 } else { id + 1 };
        id
    }

    /// Send a request and wait for its response.
    ///
    /// A controller error object is returned as `ErrorResponse`.
    pub async fn send_request(&self, request: &Request) -> Result<Value> {
        if !self.is_connected().await {
            return Err(UaiError::Disconnected);
        }

        let id = self.allocate_id().await;
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);
        // The reader may have failed pending requests between the check above and the insert
        if !self.is_connected().await {
            self.pending.lock().await.remove(&id);
            return Err(UaiError::Disconnected);
        }

        let line = request.to_wire_string(id);
        debug!("Sending request {}: {}", id, request.describe());

        {
            let mut writer = self.writer.lock().await;
            let written = match writer.write_all(line.as_bytes()).await {
                Ok(()) => writer.flush().await,
                Err(e) => Err(e),
            };
            if let Err(e) = written {
                error!("Failed to write request: {}", e);
                self.pending.lock().await.remove(&id);
                return Err(UaiError::Io(e));
            }
        }

        match timeout(self.request_timeout, rx).await {
            Ok(Ok(response)) => {
                debug!("Received response for request {}", id);
                response.into_result()
            }
            Ok(Err(_)) => {
                // Sender dropped: the session went away
                self.pending.lock().await.remove(&id);
                Err(UaiError::ChannelClosed)
            }
            Err(_) => {
                self.pending.lock().await.remove(&id);
                warn!("Request timeout: {} ({})", id, request.describe());
                Err(UaiError::CommandTimeout {
                    method: request.describe(),
                })
            }
        }
    }

    /// Route a decoded line to the caller waiting for its id.
    ///
    /// Returns false when nobody is waiting (unsolicited or late line).
    pub async fn deliver(&self, response: Response) -> bool {
        let Some(id) = response.id else {
            return false;
        };
        match self.pending.lock().await.remove(&id) {
            Some(sender) => {
                let _ = sender.send(response);
                true
            }
            None => {
                debug!("No pending request for response id {}", id);
                false
            }
        }
    }

    /// Fail every in-flight request with `ChannelClosed`.
    pub async fn fail_pending(&self) {
        let mut pending = self.pending.lock().await;
        if !pending.is_empty() {
            debug!("Dropping {} pending requests", pending.len());
        }
        pending.clear();
    }

    /// Mark as disconnected, fail in-flight requests and shut the write half.
    pub async fn disconnect(&self) -> Result<()> {
        self.set_connected(false).await;
        self.fail_pending().await;
        let mut writer = self.writer.lock().await;
        // Best-effort: the peer may already be gone
        let _ = writer.shutdown().await;
        Ok(())
    }
}
