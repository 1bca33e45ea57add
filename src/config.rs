// MIT License - Copyright (c) 2026 Peter Wright
// Controller configuration

use std::time::Duration;

use crate::constants::{
    DEFAULT_COMMAND_TIMEOUT, DEFAULT_LOGIN_TIMEOUT, DEFAULT_POLL_INTERVAL, DEFAULT_PORT,
    DEFAULT_RECONNECT_DELAY,
};

/// Configuration for one UAI+ controller.
///
/// Treated as immutable once a coordinator has been built from it; changing
/// anything means building a new coordinator.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Controller hostname or IP address
    pub host: String,
    /// Telnet port (default: 23)
    pub port: u16,
    /// Telnet username
    pub username: String,
    /// Telnet password
    pub password: String,
    /// Target identifiers, polled in this order
    pub target_ids: Vec<String>,
    /// Group identifiers, polled after the targets in this order
    pub group_ids: Vec<String>,
    /// Poll cadence (default: 1000 ms)
    pub poll_interval: Duration,
    /// Fixed backoff between connection attempts (default: 2 s)
    pub reconnect_delay: Duration,
    /// Per-request timeout (default: 5 s)
    pub command_timeout: Duration,
    /// Bound on TCP connect + login (default: 5 s)
    pub login_timeout: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            host: "192.168.1.100".to_string(),
            port: DEFAULT_PORT,
            username: "Telnet 1".to_string(),
            password: "Password 1".to_string(),
            target_ids: Vec::new(),
            group_ids: Vec::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            login_timeout: DEFAULT_LOGIN_TIMEOUT,
        }
    }
}

impl ControllerConfig {
    /// Create a new config builder starting from defaults.
    pub fn builder() -> ControllerConfigBuilder {
        ControllerConfigBuilder::default()
    }

    /// `host:port` for the TCP connection.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Builder for ControllerConfig.
#[derive(Debug, Clone, Default)]
pub struct ControllerConfigBuilder {
    config: ControllerConfig,
}

impl ControllerConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.config.username = username.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = password.into();
        self
    }

    pub fn target_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.target_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn group_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.group_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.config.reconnect_delay = delay;
        self
    }

    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.config.command_timeout = timeout;
        self
    }

    pub fn login_timeout(mut self, timeout: Duration) -> Self {
        self.config.login_timeout = timeout;
        self
    }

    pub fn build(self) -> ControllerConfig {
        self.config
    }
}

/// Check a hostname for RFC 1123 label syntax.
///
/// At most 255 characters; a single trailing dot is allowed. Each label is
/// 1-63 alphanumerics or hyphens and may not start or end with a hyphen.
pub fn is_valid_hostname(hostname: &str) -> bool {
    if hostname.is_empty() || hostname.len() > 255 {
        return false;
    }
    let hostname = hostname.strip_suffix('.').unwrap_or(hostname);
    hostname.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

/// Target and group identifiers are six hexadecimal digits (e.g. `A1B2C3`).
pub fn is_valid_device_id(id: &str) -> bool {
    id.len() == 6 && id.chars().all(|c| c.is_ascii_hexdigit())
}

/// Validate an identifier list, returning it sorted.
///
/// Returns the first offending identifier on error.
pub fn normalize_device_ids(ids: &[String]) -> std::result::Result<Vec<String>, String> {
    let mut sorted: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !is_valid_device_id(id) || sorted.contains(id) {
            return Err(id.clone());
        }
        sorted.push(id.clone());
    }
    sorted.sort();
    Ok(sorted)
}
