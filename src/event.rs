// MIT License - Copyright (c) 2026 Peter Wright
// Client notifications

/// Notifications raised by a protocol client outside of any request.
///
/// Consumers subscribe via `ProtocolClient::subscribe()` and receive a
/// `tokio::sync::broadcast::Receiver<ClientEvent>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Session authenticated and answering requests
    ConnectionReady,
    /// Session lost, or closed by `disconnect()`
    Disconnected {
        cause: String,
        /// Set when the session was closed by `disconnect()` rather than lost
        requested: bool,
    },
}

/// Type alias for the broadcast sender.
pub type EventSender = tokio::sync::broadcast::Sender<ClientEvent>;

/// Type alias for the broadcast receiver.
pub type EventReceiver = tokio::sync::broadcast::Receiver<ClientEvent>;

/// Create a new event channel with the given capacity.
pub fn event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    tokio::sync::broadcast::channel(capacity)
}
