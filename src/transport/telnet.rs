// MIT License - Copyright (c) 2026 Peter Wright
// Telnet transport to the UAI+

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::client::{GroupInfo, ProtocolClient, TargetInfo};
use crate::config::ControllerConfig;
use crate::constants::{
    PositionType, CRLF, INVALID_PASSWORD_REPLY, INVALID_USER_REPLY, LF, PASSWORD_PROMPT,
    USER_PROMPT,
};
use crate::error::{Result, UaiError};
use crate::event::{event_channel, EventReceiver, EventSender, ClientEvent};
use crate::protocol::{parse_group_info, parse_position, parse_response, parse_target_info, Request};
use crate::transport::command::CommandEngine;

/// A live, logged-in session.
struct Session {
    engine: Arc<CommandEngine>,
    reader_handle: tokio::task::JoinHandle<()>,
}

/// [`ProtocolClient`] over the UAI+ telnet interface.
///
/// One instance can be connected, disconnected and reconnected any number
/// of times; each `connect()` opens a fresh TCP session.
pub struct TelnetClient {
    config: ControllerConfig,
    event_tx: EventSender,
    session: Mutex<Option<Session>>,
}

impl TelnetClient {
    pub fn new(config: ControllerConfig) -> Self {
        let (event_tx, _event_rx) = event_channel(64);
        Self {
            config,
            event_tx,
            session: Mutex::new(None),
        }
    }

    /// Open the TCP connection and log in.
    ///
    /// Sequence: TCP connect → `User:` → `Password:` → spawn reader → ping
    async fn open_session(&self) -> Result<Session> {
        let address = self.config.address();
        info!("Connecting to UAI+ at {}", address);

        let login = async {
            let stream = TcpStream::connect(&address).await.map_err(|e| {
                error!("TCP connect failed: {}", e);
                UaiError::Io(e)
            })?;
            debug!("TCP socket connected");
            let (mut reader, mut writer) = stream.into_split();

            read_until_prompt(&mut reader, USER_PROMPT).await?;
            writer
                .write_all(format!("{}{}", self.config.username, CRLF).as_bytes())
                .await?;

            let pending = read_until_prompt(&mut reader, PASSWORD_PROMPT).await;
            if let Err(UaiError::InvalidResponse { details }) = &pending
                && details.contains(INVALID_USER_REPLY)
            {
                return Err(UaiError::InvalidUser {
                    user: self.config.username.clone(),
                });
            }
            pending?;
            writer
                .write_all(format!("{}{}", self.config.password, CRLF).as_bytes())
                .await?;

            Ok::<_, UaiError>((reader, writer))
        };

        let (reader, writer) = timeout(self.config.login_timeout, login)
            .await
            .map_err(|_| UaiError::ConnectionTimeout)??;

        let engine = Arc::new(CommandEngine::new(
            Box::new(writer),
            self.config.command_timeout,
        ));
        let rejected = Arc::new(AtomicBool::new(false));
        let reader_handle = spawn_reader_task(
            reader,
            engine.clone(),
            self.event_tx.clone(),
            rejected.clone(),
        );

        // The controller answers a bad password with a rejection line and
        // nothing at all on success, so the ping decides.
        if let Err(e) = engine.send_request(&Request::Ping).await {
            reader_handle.abort();
            let _ = engine.disconnect().await;
            if rejected.load(Ordering::SeqCst) {
                return Err(UaiError::InvalidPassword {
                    user: self.config.username.clone(),
                });
            }
            return Err(e);
        }

        Ok(Session {
            engine,
            reader_handle,
        })
    }

    async fn engine(&self) -> Result<Arc<CommandEngine>> {
        match self.session.lock().await.as_ref() {
            Some(session) => Ok(session.engine.clone()),
            None => Err(UaiError::Disconnected),
        }
    }

    async fn send(&self, request: Request) -> Result<serde_json::Value> {
        self.engine().await?.send_request(&request).await
    }
}

#[async_trait]
impl ProtocolClient for TelnetClient {
    async fn connect(&self) -> Result<()> {
        let mut slot = self.session.lock().await;
        if let Some(old) = slot.take() {
            debug!("Replacing previous session");
            old.reader_handle.abort();
            let _ = old.engine.disconnect().await;
        }

        let session = self.open_session().await?;
        *slot = Some(session);
        drop(slot);

        info!("Connection to UAI+ established");
        let _ = self.event_tx.send(ClientEvent::ConnectionReady);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        let Some(session) = self.session.lock().await.take() else {
            return Ok(());
        };
        info!("Disconnecting from UAI+");
        session.reader_handle.abort();
        session.engine.disconnect().await?;
        let _ = self.event_tx.send(ClientEvent::Disconnected {
            cause: "closed by client".to_string(),
            requested: true,
        });
        Ok(())
    }

    async fn get_target_info(&self, target_id: &str) -> Result<TargetInfo> {
        let result = self
            .send(Request::TargetInfo { target_id: target_id.to_string() })
            .await?;
        parse_target_info(&result)
    }

    async fn get_target_position(&self, target_id: &str) -> Result<u8> {
        let result = self
            .send(Request::TargetPosition { target_id: target_id.to_string() })
            .await?;
        parse_position(&result)
    }

    async fn get_group_info(&self, group_id: &str) -> Result<GroupInfo> {
        let result = self
            .send(Request::GroupInfo { group_id: group_id.to_string() })
            .await?;
        parse_group_info(&result)
    }

    async fn move_target_up(&self, target_id: &str) -> Result<()> {
        self.send(Request::MoveUp { target_id: target_id.to_string() }).await?;
        Ok(())
    }

    async fn move_target_down(&self, target_id: &str) -> Result<()> {
        self.send(Request::MoveDown { target_id: target_id.to_string() }).await?;
        Ok(())
    }

    async fn stop_target(&self, target_id: &str) -> Result<()> {
        self.send(Request::Stop { target_id: target_id.to_string() }).await?;
        Ok(())
    }

    async fn move_target_to_position(&self, target_id: &str, closed_percentage: u8) -> Result<()> {
        self.send(Request::MoveTo {
            target_id: target_id.to_string(),
            position_type: PositionType::Percent,
            position: closed_percentage,
        })
        .await?;
        Ok(())
    }

    async fn move_target_to_intermediate_position(
        &self,
        target_id: &str,
        position: u8,
    ) -> Result<()> {
        self.send(Request::MoveTo {
            target_id: target_id.to_string(),
            position_type: PositionType::Intermediate,
            position,
        })
        .await?;
        Ok(())
    }

    fn subscribe(&self) -> EventReceiver {
        self.event_tx.subscribe()
    }
}

impl Drop for TelnetClient {
    fn drop(&mut self) {
        if let Some(session) = self.session.get_mut().take() {
            session.reader_handle.abort();
        }
    }
}

/// Read until the buffer (trailing whitespace trimmed) ends with `prompt`.
///
/// A rejection line or EOF before the prompt is an `InvalidResponse`
/// carrying what was received.
async fn read_until_prompt<R: AsyncRead + Unpin>(reader: &mut R, prompt: &str) -> Result<()> {
    let mut received = Vec::new();
    let mut buf = [0u8; 512];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Err(UaiError::InvalidResponse {
                details: format!(
                    "connection closed waiting for '{}': {}",
                    prompt,
                    String::from_utf8_lossy(&received).trim()
                ),
            });
        }
        received.extend_from_slice(&buf[..n]);
        let text = String::from_utf8_lossy(&received);
        if text.trim_end().ends_with(prompt) {
            debug!("Got prompt '{}'", prompt);
            return Ok(());
        }
        if text.contains(INVALID_USER_REPLY) || text.contains(INVALID_PASSWORD_REPLY) {
            return Err(UaiError::InvalidResponse {
                details: text.trim().to_string(),
            });
        }
    }
}

/// Spawn the reader task that routes incoming lines to waiting requests.
fn spawn_reader_task<R>(
    mut reader: R,
    engine: Arc<CommandEngine>,
    event_tx: EventSender,
    rejected: Arc<AtomicBool>,
) -> tokio::task::JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; 4096];
        let mut leftover = Vec::new();

        let cause = loop {
            match reader.read(&mut buf).await {
                Ok(0) => {
                    debug!("Reader: connection closed");
                    break "connection closed by controller".to_string();
                }
                Ok(n) => {
                    leftover.extend_from_slice(&buf[..n]);
                    for line in split_lines(&mut leftover) {
                        if line.contains(INVALID_PASSWORD_REPLY) {
                            warn!("Controller rejected password");
                            rejected.store(true, Ordering::SeqCst);
                            continue;
                        }
                        process_line(&line, &engine).await;
                    }
                }
                Err(e) => {
                    error!("Reader: read error: {}", e);
                    break format!("read error: {}", e);
                }
            }
        };

        engine.set_connected(false).await;
        engine.fail_pending().await;
        let _ = event_tx.send(ClientEvent::Disconnected {
            cause,
            requested: false,
        });
    })
}

/// Drain complete LF-terminated lines from `buffer`, leaving any partial tail.
fn split_lines(buffer: &mut Vec<u8>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(pos) = buffer.iter().position(|&b| b == LF) {
        let raw: Vec<u8> = buffer.drain(..=pos).collect();
        let line = String::from_utf8_lossy(&raw).trim().to_string();
        if !line.is_empty() {
            lines.push(line);
        }
    }
    lines
}

async fn process_line(line: &str, engine: &Arc<CommandEngine>) {
    match parse_response(line) {
        Ok(response) => {
            if !engine.deliver(response).await {
                debug!("Unsolicited data from controller: {}", line);
            }
        }
        Err(e) => debug!("Ignoring non-JSON line '{}': {}", line, e),
    }
}
