// MIT License - Copyright (c) 2026 Peter Wright
// Error types

/// All errors that can occur while talking to a UAI+ controller.
#[derive(Debug, thiserror::Error)]
pub enum UaiError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection timeout")]
    ConnectionTimeout,

    #[error("Command timeout: {method}")]
    CommandTimeout { method: String },

    #[error("Invalid user: {user}")]
    InvalidUser { user: String },

    #[error("Invalid password for user {user}")]
    InvalidPassword { user: String },

    #[error("Error response {code}: {message}")]
    ErrorResponse { code: i64, message: String },

    #[error("Socket disconnected")]
    Disconnected,

    #[error("Channel closed")]
    ChannelClosed,

    #[error("Invalid response: {details}")]
    InvalidResponse { details: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl UaiError {
    /// Whether this error means the session could not be (or is no longer)
    /// established, as opposed to a single request being rejected.
    ///
    /// Credential failures count as connection failures: the reconnect loop
    /// retries them like any other.
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            UaiError::Io(_)
                | UaiError::ConnectionTimeout
                | UaiError::CommandTimeout { .. }
                | UaiError::InvalidUser { .. }
                | UaiError::InvalidPassword { .. }
                | UaiError::Disconnected
                | UaiError::ChannelClosed
                | UaiError::InvalidResponse { .. }
        )
    }

    /// Whether the session itself is gone, so further requests on it are
    /// pointless. Timeouts and malformed replies concern one request only.
    pub fn is_session_lost(&self) -> bool {
        matches!(
            self,
            UaiError::Io(_)
                | UaiError::ConnectionTimeout
                | UaiError::Disconnected
                | UaiError::ChannelClosed
        )
    }

    /// Whether the controller rejected the username or password.
    pub fn is_invalid_credentials(&self) -> bool {
        matches!(
            self,
            UaiError::InvalidUser { .. } | UaiError::InvalidPassword { .. }
        )
    }

    /// Whether this is a per-request error response from the controller.
    pub fn is_error_response(&self) -> bool {
        matches!(self, UaiError::ErrorResponse { .. })
    }
}

pub type Result<T> = std::result::Result<T, UaiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_failures_are_connection_failures() {
        let err = UaiError::InvalidPassword { user: "admin".to_string() };
        assert!(err.is_invalid_credentials());
        assert!(err.is_connection_failure());
        assert!(!err.is_error_response());
    }

    #[test]
    fn test_error_response_is_not_connection_failure() {
        let err = UaiError::ErrorResponse {
            code: -32602,
            message: "Unknown target".to_string(),
        };
        assert!(err.is_error_response());
        assert!(!err.is_connection_failure());
        assert!(!err.is_session_lost());
        assert_eq!(err.to_string(), "Error response -32602: Unknown target");
    }

    #[test]
    fn test_single_request_failures_keep_session() {
        let timeout = UaiError::CommandTimeout {
            method: "sdn.status.position".to_string(),
        };
        let garbled = UaiError::InvalidResponse {
            details: "invalid position".to_string(),
        };
        assert!(!timeout.is_session_lost());
        assert!(!garbled.is_session_lost());
        assert!(UaiError::Disconnected.is_session_lost());
        assert!(UaiError::ChannelClosed.is_session_lost());
    }
}
