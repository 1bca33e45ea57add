// MIT License - Copyright (c) 2026 Peter Wright
// Transports to the UAI+

pub mod command;
pub mod telnet;

pub use telnet::TelnetClient;
