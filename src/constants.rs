// MIT License - Copyright (c) 2026 Peter Wright
// Wire constants and timing defaults

use std::time::Duration;

/// Line terminator for inbound messages.
pub const LF: u8 = b'\n';
/// Line terminator appended to everything we send.
pub const CRLF: &str = "\r\n";

/// Default telnet port of the UAI+.
pub const DEFAULT_PORT: u16 = 23;

/// Login prompts, matched against the end of the received buffer.
pub const USER_PROMPT: &str = "User:";
pub const PASSWORD_PROMPT: &str = "Password:";

/// Login rejection replies.
pub const INVALID_USER_REPLY: &str = "Invalid User";
pub const INVALID_PASSWORD_REPLY: &str = "Invalid Password";

pub const JSONRPC_VERSION: &str = "2.0";

/// Poll cadence of the state engine.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);
/// Fixed delay between failed connection attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(5);
/// Upper bound on waiting for readiness during setup validation.
pub const SETUP_READY_TIMEOUT: Duration = Duration::from_secs(5);

/// Request ids cycle through 1..=MAX_REQUEST_ID.
pub const MAX_REQUEST_ID: u32 = 9999;

/// How a `sdn.move.to` position is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionType {
    /// Closed percentage, 0 = open, 100 = closed.
    Percent,
    /// Index of a motor intermediate position.
    Intermediate,
}

impl PositionType {
    /// The wire string for the `position_type` parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Percent => "percent",
            Self::Intermediate => "ip",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_type_names() {
        assert_eq!(PositionType::Percent.as_str(), "percent");
        assert_eq!(PositionType::Intermediate.as_str(), "ip");
    }
}
