// MIT License - Copyright (c) 2026 Peter Wright
// Protocol client capability

use async_trait::async_trait;

use crate::error::Result;
use crate::event::EventReceiver;

/// Immutable metadata of a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetInfo {
    pub name: String,
    pub kind: String,
}

/// Immutable metadata of a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInfo {
    pub name: String,
}

/// Everything the coordinator needs from a controller session.
///
/// Each call is one atomic request/response exchange. Implementations must
/// pair responses with requests themselves if they allow concurrent calls.
/// Connection-ready and disconnected notifications are delivered through
/// [`subscribe`](ProtocolClient::subscribe).
#[async_trait]
pub trait ProtocolClient: Send + Sync {
    /// Open and authenticate the session.
    ///
    /// Fails with a connection failure, including
    /// [`InvalidUser`](crate::UaiError::InvalidUser) and
    /// [`InvalidPassword`](crate::UaiError::InvalidPassword).
    async fn connect(&self) -> Result<()>;

    /// Close the session. Safe to call when already closed.
    async fn disconnect(&self) -> Result<()>;

    async fn get_target_info(&self, target_id: &str) -> Result<TargetInfo>;

    /// Closed percentage, 0 = open, 100 = closed.
    async fn get_target_position(&self, target_id: &str) -> Result<u8>;

    async fn get_group_info(&self, group_id: &str) -> Result<GroupInfo>;

    async fn move_target_up(&self, target_id: &str) -> Result<()>;

    async fn move_target_down(&self, target_id: &str) -> Result<()>;

    async fn stop_target(&self, target_id: &str) -> Result<()>;

    async fn move_target_to_position(&self, target_id: &str, closed_percentage: u8) -> Result<()>;

    async fn move_target_to_intermediate_position(
        &self,
        target_id: &str,
        position: u8,
    ) -> Result<()>;

    /// Subscribe to connection notifications.
    fn subscribe(&self) -> EventReceiver;
}
