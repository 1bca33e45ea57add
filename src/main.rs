// MIT License - Copyright (c) 2026 Peter Wright
// MQTT bridge

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use serde::{Deserialize, Serialize};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Mutex;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info, warn};

use somfy_uai::config::{is_valid_hostname, normalize_device_ids};
use somfy_uai::{
    validate_connection, ConnectionIndicator, ControllerConfig, Coordinator, Cover, CoverGroup,
    SetupError, StateSnapshot,
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "uai2mqtt")]
#[command(about = "Bridge between a Somfy UAI+ motor controller and MQTT")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: String,

    /// Check that the controller is reachable and the credentials work, then exit
    #[arg(long)]
    check: bool,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Config {
    controller: ControllerToml,
    mqtt: MqttToml,
}

#[derive(Debug, Deserialize)]
struct ControllerToml {
    /// Display name, used for the connection indicator
    #[serde(default = "default_name")]
    name: String,
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    username: String,
    password: String,
    #[serde(default)]
    target_ids: Vec<String>,
    #[serde(default)]
    group_ids: Vec<String>,
    #[serde(default = "default_poll_interval")]
    poll_interval_ms: u64,
    #[serde(default = "default_reconnect_delay")]
    reconnect_delay_ms: u64,
    #[serde(default = "default_command_timeout")]
    command_timeout_ms: u64,
    #[serde(default = "default_login_timeout")]
    login_timeout_ms: u64,
}

fn default_name() -> String {
    "Somfy UAI+".to_string()
}
fn default_port() -> u16 {
    23
}
fn default_poll_interval() -> u64 {
    1000
}
fn default_reconnect_delay() -> u64 {
    2000
}
fn default_command_timeout() -> u64 {
    5000
}
fn default_login_timeout() -> u64 {
    5000
}

#[derive(Debug, Deserialize)]
struct MqttToml {
    url: String,
    #[serde(default = "default_client_id")]
    client_id: String,
    #[serde(default = "default_base_topic")]
    base_topic: String,
    #[serde(default = "default_snapshot_interval")]
    snapshot_interval_secs: u64,
}

fn default_client_id() -> String {
    "uai2mqtt".to_string()
}
fn default_base_topic() -> String {
    "somfy".to_string()
}
fn default_snapshot_interval() -> u64 {
    60
}

fn build_controller_config(toml: &ControllerToml) -> Result<ControllerConfig> {
    if !is_valid_hostname(&toml.host) {
        anyhow::bail!("Invalid controller host: {}", toml.host);
    }
    let target_ids = normalize_device_ids(&toml.target_ids)
        .map_err(|e| anyhow::anyhow!("Invalid target_ids: {e}"))?;
    let group_ids = normalize_device_ids(&toml.group_ids)
        .map_err(|e| anyhow::anyhow!("Invalid group_ids: {e}"))?;

    Ok(ControllerConfig::builder()
        .host(&toml.host)
        .port(toml.port)
        .username(&toml.username)
        .password(&toml.password)
        .target_ids(target_ids)
        .group_ids(group_ids)
        .poll_interval(Duration::from_millis(toml.poll_interval_ms))
        .reconnect_delay(Duration::from_millis(toml.reconnect_delay_ms))
        .command_timeout(Duration::from_millis(toml.command_timeout_ms))
        .login_timeout(Duration::from_millis(toml.login_timeout_ms))
        .build())
}

fn load_config(path: &str) -> Result<Config> {
    let text = std::fs::read_to_string(path).context("Failed to read config file")?;
    toml::from_str(&text).context("Failed to parse config file")
}

// ---------------------------------------------------------------------------
// MQTT JSON types
// ---------------------------------------------------------------------------

// Published messages: all share {now, op, ...} flat structure

#[derive(Serialize)]
struct MqttSnapshot {
    now: u64,
    op: String,
    connected: bool,
    covers: Vec<MqttCoverState>,
    groups: Vec<MqttGroupState>,
}

#[derive(Serialize)]
struct MqttCoverState {
    id: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "deviceClass")]
    device_class: Option<String>,
    available: bool,
    /// 0 = closed, 100 = open
    #[serde(skip_serializing_if = "Option::is_none")]
    position: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    closed: Option<bool>,
    opening: bool,
    closing: bool,
    features: Vec<&'static str>,
}

#[derive(Serialize)]
struct MqttGroupState {
    id: String,
    name: String,
    available: bool,
    features: Vec<&'static str>,
}

#[derive(Serialize)]
struct MqttConnection {
    now: u64,
    op: String,
    connected: bool,
}

// CMD_ACK response
#[derive(Serialize)]
struct MqttCmdAck {
    now: u64,
    op: String,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    src: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

// Inbound command (subscribed)
#[derive(Deserialize)]
struct MqttCommand {
    op: String,
    #[serde(default)]
    id: Option<String>,
    /// Host position, 0 = closed, 100 = open
    #[serde(default)]
    position: Option<u8>,
    #[serde(default)]
    intermediate_position: Option<u8>,
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// The host-facing view of the controller, refreshed from each snapshot.
struct Entities {
    covers: Vec<Cover>,
    groups: Vec<CoverGroup>,
    connection: ConnectionIndicator,
}

impl Entities {
    fn new(config: &ControllerConfig, name: &str) -> Self {
        Self {
            covers: config.target_ids.iter().map(Cover::new).collect(),
            groups: config.group_ids.iter().map(CoverGroup::new).collect(),
            connection: ConnectionIndicator::new(name),
        }
    }

    fn apply(&mut self, snapshot: &StateSnapshot, ready: bool) {
        for cover in &mut self.covers {
            if cover.update(snapshot, ready) {
                info!(
                    "Cover {} is '{}' ({})",
                    cover.target_id,
                    cover.name,
                    cover.model.as_deref().unwrap_or("unknown model")
                );
            }
        }
        for group in &mut self.groups {
            if group.update(snapshot, ready) {
                info!("Group {} is '{}'", group.group_id, group.name);
            }
        }
    }

    fn cover(&self, id: &str) -> Option<&Cover> {
        self.covers.iter().find(|c| c.target_id == id)
    }

    fn group(&self, id: &str) -> Option<&CoverGroup> {
        self.groups.iter().find(|g| g.group_id == id)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn now_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

async fn publish_json(client: &AsyncClient, topic: &str, payload: &impl Serialize, retain: bool) {
    match serde_json::to_string(payload) {
        Ok(json) => {
            if let Err(e) = client.publish(topic, QoS::AtLeastOnce, retain, json).await {
                error!("Failed to publish to {topic}: {e}");
            }
        }
        Err(e) => error!("Failed to serialize MQTT payload: {e}"),
    }
}

async fn publish_cmd_ack(
    client: &AsyncClient,
    topic: &str,
    success: bool,
    src: Option<serde_json::Value>,
    data: Option<serde_json::Value>,
) {
    let msg = MqttCmdAck {
        now: now_epoch_ms(),
        op: "CMD_ACK".to_string(),
        success,
        src,
        data,
    };
    publish_json(client, topic, &msg, false).await;
}

async fn publish_connection(client: &AsyncClient, base_topic: &str, connected: bool) {
    let msg = MqttConnection {
        now: now_epoch_ms(),
        op: "CONNECTION".to_string(),
        connected,
    };
    publish_json(client, &format!("{base_topic}/connection"), &msg, true).await;
}

fn build_snapshot(entities: &Entities) -> MqttSnapshot {
    let covers = entities
        .covers
        .iter()
        .map(|c| MqttCoverState {
            id: c.target_id.clone(),
            name: c.name.clone(),
            model: c.model.clone(),
            device_class: c.device_class.map(|d| d.as_str().to_string()),
            available: c.available,
            position: c.position,
            closed: c.is_closed,
            opening: c.is_opening,
            closing: c.is_closing,
            features: Cover::FEATURES.names(),
        })
        .collect();

    let groups = entities
        .groups
        .iter()
        .map(|g| MqttGroupState {
            id: g.group_id.clone(),
            name: g.name.clone(),
            available: g.available,
            features: CoverGroup::FEATURES.names(),
        })
        .collect();

    MqttSnapshot {
        now: now_epoch_ms(),
        op: "SNAPSHOT".to_string(),
        connected: entities.connection.is_on,
        covers,
        groups,
    }
}

async fn publish_snapshot(client: &AsyncClient, base_topic: &str, entities: &Entities) {
    let snapshot = build_snapshot(entities);
    publish_json(client, &format!("{base_topic}/state"), &snapshot, true).await;
}

// ---------------------------------------------------------------------------
// MQTT command handler
// ---------------------------------------------------------------------------

/// Await a controller command and log the result. Returns `true` on success.
async fn exec_controller_cmd(
    op: &str,
    label: &str,
    fut: impl std::future::Future<Output = somfy_uai::Result<()>>,
) -> bool {
    match fut.await {
        Ok(()) => {
            info!("{op} {label}: success");
            true
        }
        Err(e) => {
            error!("{op} {label} failed: {e}");
            false
        }
    }
}

async fn handle_command(
    payload_str: &str,
    cmd: MqttCommand,
    client: &AsyncClient,
    base_topic: &str,
    coordinator: &Coordinator,
    entities: &Mutex<Entities>,
) {
    // Parse the raw payload as a JSON value for the CMD_ACK src field
    let src_json = serde_json::from_str::<serde_json::Value>(payload_str).ok();

    match cmd.op.as_str() {
        "SNAPSHOT" => {
            debug!("Command: SNAPSHOT");
            let entities = entities.lock().await;
            let snapshot = build_snapshot(&entities);
            let snapshot_value = serde_json::to_value(&snapshot).ok();
            publish_json(client, &format!("{base_topic}/state"), &snapshot, true).await;
            publish_cmd_ack(client, base_topic, true, src_json, snapshot_value).await;
        }

        "PING" => {
            info!("Command: PING");
            publish_cmd_ack(client, base_topic, true, src_json, None).await;
        }

        "OPEN" | "CLOSE" | "STOP" | "SET_POSITION" | "SET_INTERMEDIATE_POSITION" => {
            let op = cmd.op.as_str();
            let Some(id) = cmd.id.as_deref() else {
                warn!("{op}: missing id");
                publish_cmd_ack(client, base_topic, false, src_json, None).await;
                return;
            };

            // Snapshot the entity so the lock is not held across the round trip
            let (cover, group) = {
                let entities = entities.lock().await;
                (entities.cover(id).cloned(), entities.group(id).cloned())
            };
            let label = match (&cover, &group) {
                (Some(_), _) => format!("cover {id}"),
                (None, Some(_)) => format!("group {id}"),
                (None, None) => {
                    warn!("{op}: unknown id {id}");
                    publish_cmd_ack(client, base_topic, false, src_json, None).await;
                    return;
                }
            };
            info!("Command: {op} {label}");

            let success = match (op, &cover, &group) {
                ("OPEN", Some(c), _) => exec_controller_cmd(op, &label, c.open(coordinator)).await,
                ("OPEN", None, Some(g)) => exec_controller_cmd(op, &label, g.open(coordinator)).await,
                ("CLOSE", Some(c), _) => exec_controller_cmd(op, &label, c.close(coordinator)).await,
                ("CLOSE", None, Some(g)) => exec_controller_cmd(op, &label, g.close(coordinator)).await,
                ("STOP", Some(c), _) => exec_controller_cmd(op, &label, c.stop(coordinator)).await,
                ("STOP", None, Some(g)) => exec_controller_cmd(op, &label, g.stop(coordinator)).await,
                ("SET_POSITION", Some(c), _) => match cmd.position {
                    Some(p) if p <= 100 => {
                        exec_controller_cmd(op, &label, c.set_position(coordinator, p)).await
                    }
                    other => {
                        warn!("{op}: invalid position {other:?} (must be 0-100)");
                        false
                    }
                },
                ("SET_POSITION", None, Some(_)) => {
                    warn!("{op}: groups have no position");
                    false
                }
                ("SET_INTERMEDIATE_POSITION", _, _) => match cmd.intermediate_position {
                    Some(p) => match (&cover, &group) {
                        (Some(c), _) => {
                            exec_controller_cmd(op, &label, c.set_intermediate_position(coordinator, p))
                                .await
                        }
                        (None, Some(g)) => {
                            exec_controller_cmd(op, &label, g.set_intermediate_position(coordinator, p))
                                .await
                        }
                        (None, None) => false,
                    },
                    None => {
                        warn!("{op}: missing intermediate_position");
                        false
                    }
                },
                _ => false,
            };
            publish_cmd_ack(client, base_topic, success, src_json, None).await;
        }

        other => {
            warn!("Unknown command: {other}");
            publish_cmd_ack(client, base_topic, false, src_json, None).await;
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG controls verbosity (e.g. RUST_LOG=debug or RUST_LOG=somfy_uai=trace).
    // Default: info.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // systemd journal already adds timestamps, so omit them when running under systemd
    if std::env::var_os("JOURNAL_STREAM").is_some() {
        tracing_subscriber::fmt().without_time().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    let mut controller_config = build_controller_config(&config.controller)?;
    let mut controller_name = config.controller.name;

    if cli.check {
        info!("Checking connection to {}", controller_config.address());
        return match validate_connection(&controller_config).await {
            Ok(()) => {
                info!("Connection check passed");
                Ok(())
            }
            Err(e @ (SetupError::InvalidUsername | SetupError::InvalidPassword)) => {
                Err(anyhow::anyhow!("Controller rejected credentials: {e}"))
            }
            Err(e) => Err(anyhow::anyhow!("Connection check failed: {e}")),
        };
    }

    let mut mqtt_client_id = config.mqtt.client_id;
    let mut base_topic = config.mqtt.base_topic;
    let mut snapshot_interval_secs = config.mqtt.snapshot_interval_secs;
    let (mut mqtt_host, mut mqtt_port) = parse_mqtt_url(&config.mqtt.url)?;

    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    loop {
        // Start the coordinator; it reconnects on its own from here on
        let coordinator = Arc::new(Coordinator::new(controller_config.clone()));
        coordinator.connect_and_stay_connected().await;
        let entities = Arc::new(Mutex::new(Entities::new(coordinator.config(), &controller_name)));

        // Set up MQTT
        let mut mqtt_opts = MqttOptions::new(&mqtt_client_id, &mqtt_host, mqtt_port);
        mqtt_opts.set_keep_alive(Duration::from_secs(30));
        let (client, mut eventloop) = AsyncClient::new(mqtt_opts, 256);
        let cmd_topic = format!("{base_topic}/cmd");

        client
            .subscribe(&cmd_topic, QoS::AtLeastOnce)
            .await
            .context("Failed to subscribe to MQTT topic")?;
        info!("MQTT: subscribed to {cmd_topic}");

        // Publish initial state
        {
            let entities = entities.lock().await;
            publish_connection(&client, &base_topic, false).await;
            publish_snapshot(&client, &base_topic, &entities).await;
        }

        // Task 1: snapshots and connection transitions → entities → MQTT
        let coord_state = Arc::clone(&coordinator);
        let entities_state = Arc::clone(&entities);
        let client_state = client.clone();
        let topic_state = base_topic.clone();
        let state_handle = tokio::spawn(async move {
            let mut snapshots = coord_state.subscribe();
            let mut connection = coord_state.subscribe_connection();
            loop {
                let connection_changed = tokio::select! {
                    changed = snapshots.changed() => {
                        if changed.is_err() { break; }
                        false
                    }
                    changed = connection.changed() => {
                        if changed.is_err() { break; }
                        true
                    }
                };

                let snapshot = snapshots.borrow_and_update().clone();
                let state = *connection.borrow_and_update();
                let mut entities = entities_state.lock().await;

                if connection_changed && entities.connection.update(state) {
                    if state.is_ready() {
                        info!("Controller connection ready");
                    } else {
                        warn!("Controller connection lost ({state})");
                    }
                    publish_connection(&client_state, &topic_state, state.is_ready()).await;
                }
                entities.apply(&snapshot, state.is_ready());
                publish_snapshot(&client_state, &topic_state, &entities).await;
            }
        });

        // Task 2: MQTT event loop (receives messages, handles commands)
        let coord_cmds = Arc::clone(&coordinator);
        let entities_cmds = Arc::clone(&entities);
        let client_cmds = client.clone();
        let topic_cmds = base_topic.clone();
        let sub_topic = cmd_topic.clone();
        let mqtt_handle = tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        // rumqttc does not resubscribe after a broker reconnect
                        info!("MQTT: connected, subscribing to {sub_topic}");
                        if let Err(e) =
                            client_cmds.subscribe(&sub_topic, QoS::AtLeastOnce).await
                        {
                            error!("Failed to subscribe to {sub_topic}: {e}");
                        }
                    }
                    Ok(Event::Incoming(Packet::Publish(msg))) => {
                        if msg.topic == sub_topic {
                            let payload = String::from_utf8_lossy(&msg.payload);
                            match serde_json::from_str::<MqttCommand>(&payload) {
                                Ok(cmd) => {
                                    if cmd.op == "SNAPSHOT" {
                                        debug!("MQTT command received: {payload}");
                                    } else {
                                        info!("MQTT command received: {payload}");
                                    }
                                    handle_command(
                                        &payload,
                                        cmd,
                                        &client_cmds,
                                        &topic_cmds,
                                        &coord_cmds,
                                        &entities_cmds,
                                    )
                                    .await;
                                }
                                Err(e) => {
                                    warn!("Failed to parse MQTT command: {e}");
                                }
                            }
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("MQTT event loop error: {e}");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        // Task 3: periodic retained snapshot, so late subscribers and brokers
        // without persistence catch up
        let entities_snap = Arc::clone(&entities);
        let client_snap = client.clone();
        let topic_snap = base_topic.clone();
        let snap_handle = tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(snapshot_interval_secs));
            // Skip the first immediate tick (we already published an initial snapshot)
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let entities = entities_snap.lock().await;
                publish_snapshot(&client_snap, &topic_snap, &entities).await;
            }
        });

        // Wait for a signal
        info!("MQTT bridge running. Send SIGHUP to restart, SIGINT/SIGTERM to stop.");
        let restart = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT, shutting down...");
                false
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
                false
            }
            _ = sighup.recv() => {
                info!("Received SIGHUP, reloading config and restarting connections...");
                true
            }
        };

        state_handle.abort();
        mqtt_handle.abort();
        snap_handle.abort();

        if let Err(e) = coordinator.async_disconnect().await {
            warn!("Error disconnecting from controller: {e}");
        }

        if !restart {
            break;
        }

        // Reload config from disk; keep previous config on failure
        info!("Reloading config from {}", cli.config);
        match load_config(&cli.config) {
            Ok(new_config) => match build_controller_config(&new_config.controller) {
                Ok(new_controller_config) => match parse_mqtt_url(&new_config.mqtt.url) {
                    Ok((new_host, new_port)) => {
                        controller_config = new_controller_config;
                        controller_name = new_config.controller.name;
                        mqtt_host = new_host;
                        mqtt_port = new_port;
                        mqtt_client_id = new_config.mqtt.client_id;
                        base_topic = new_config.mqtt.base_topic;
                        snapshot_interval_secs = new_config.mqtt.snapshot_interval_secs;
                        info!("Config reloaded successfully");
                    }
                    Err(e) => warn!("Invalid MQTT URL in new config, keeping previous: {e}"),
                },
                Err(e) => warn!("Invalid controller config in new config, keeping previous: {e}"),
            },
            Err(e) => warn!("Failed to reload config, keeping previous: {e}"),
        }

        info!("Reconnecting...");
    }

    info!("Shutdown complete");
    Ok(())
}

/// Parse an MQTT URL like "mqtt://host:port" into (host, port).
fn parse_mqtt_url(url: &str) -> Result<(String, u16)> {
    let stripped = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url);

    let (host, port_str) = stripped
        .rsplit_once(':')
        .context("MQTT URL must be in format mqtt://host:port")?;

    let port: u16 = port_str
        .parse()
        .context("Invalid MQTT port number")?;

    Ok((host.to_string(), port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mqtt_url() {
        assert_eq!(
            parse_mqtt_url("mqtt://broker.local:1883").unwrap(),
            ("broker.local".to_string(), 1883)
        );
        assert_eq!(
            parse_mqtt_url("10.0.0.2:8883").unwrap(),
            ("10.0.0.2".to_string(), 8883)
        );
        assert!(parse_mqtt_url("mqtt://broker.local").is_err());
    }

    #[test]
    fn test_config_defaults() {
        let config: Config = toml::from_str(
            r#"
            [controller]
            host = "192.168.1.50"
            username = "admin"
            password = "secret"
            target_ids = ["c3b2a1", "A1B2C3"]

            [mqtt]
            url = "mqtt://localhost:1883"
            "#,
        )
        .unwrap();
        assert_eq!(config.controller.port, 23);
        assert_eq!(config.controller.name, "Somfy UAI+");
        assert_eq!(config.mqtt.base_topic, "somfy");

        let controller = build_controller_config(&config.controller).unwrap();
        assert_eq!(controller.target_ids, vec!["A1B2C3", "c3b2a1"]);
        assert_eq!(controller.poll_interval, Duration::from_millis(1000));
        assert_eq!(controller.reconnect_delay, Duration::from_millis(2000));
    }

    #[test]
    fn test_config_rejects_bad_ids() {
        let config: Config = toml::from_str(
            r#"
            [controller]
            host = "uai.local"
            username = "admin"
            password = "secret"
            group_ids = ["XYZ"]

            [mqtt]
            url = "mqtt://localhost:1883"
            "#,
        )
        .unwrap();
        assert!(build_controller_config(&config.controller).is_err());
    }

    #[test]
    fn test_snapshot_payload_shape() {
        let controller = ControllerConfig::builder()
            .host("uai.local")
            .target_ids(["A1B2C3"])
            .group_ids(["0000AA"])
            .build();
        let entities = Entities::new(&controller, "Somfy UAI+");
        let value = serde_json::to_value(build_snapshot(&entities)).unwrap();
        assert_eq!(value["op"], "SNAPSHOT");
        assert_eq!(value["connected"], false);
        assert_eq!(value["covers"][0]["id"], "A1B2C3");
        assert_eq!(value["covers"][0]["available"], false);
        assert!(value["covers"][0].get("position").is_none());
        assert_eq!(value["groups"][0]["name"], "Group 0000AA");
    }
}
