// MIT License - Copyright (c) 2026 Peter Wright
// Somfy UAI+ coordinator
//
//! # somfy-uai
//!
//! Keeps one telnet session to a Somfy UAI+ motor controller alive, polls
//! the configured targets (single covers) and groups once a second, and
//! forwards move/stop/position commands.
//!
//! Names and motor types are queried once per id and cached; positions are
//! queried every cycle. Each cycle publishes a fresh [`StateSnapshot`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use somfy_uai::{ControllerConfig, Coordinator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ControllerConfig::builder()
//!         .host("192.168.0.50")
//!         .username("admin")
//!         .password("secret")
//!         .target_ids(["A1B2C3"])
//!         .build();
//!
//!     let coordinator = Coordinator::new(config);
//!     coordinator.connect_and_stay_connected().await;
//!     coordinator.wait_for_connection_ready().await;
//!
//!     let mut snapshots = coordinator.subscribe();
//!     tokio::spawn(async move {
//!         while snapshots.changed().await.is_ok() {
//!             println!("State: {:?}", snapshots.borrow_and_update());
//!         }
//!     });
//!
//!     coordinator.set_position("A1B2C3", 70).await?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     coordinator.async_disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod constants;
pub mod coordinator;
pub mod devices;
pub mod error;
pub mod event;
pub mod lifecycle;
pub mod poll;
pub mod protocol;
pub mod state;
pub mod transport;

// Re-exports for convenience
pub use client::{GroupInfo, ProtocolClient, TargetInfo};
pub use config::{ControllerConfig, ControllerConfigBuilder};
pub use coordinator::{validate_connection, validate_with_client, Coordinator, SetupError};
pub use devices::{ConnectionIndicator, Cover, CoverFeatures, CoverGroup, DeviceClass};
pub use error::{Result, UaiError};
pub use event::{ClientEvent, EventReceiver};
pub use lifecycle::ConnectionManager;
pub use poll::PollEngine;
pub use state::{ConnectionState, DeviceId, DeviceState, GroupState, StateSnapshot, TargetState};
pub use transport::TelnetClient;
