// MIT License - Copyright (c) 2026 Peter Wright
// Entities presented to the host

pub mod connection;
pub mod cover;
pub mod group;

pub use connection::ConnectionIndicator;
pub use cover::{model_for_kind, Cover, CoverFeatures, DeviceClass};
pub use group::CoverGroup;
