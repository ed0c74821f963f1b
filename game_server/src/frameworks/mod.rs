// Frameworks layer: process bootstrap and environment config.

pub mod config;
pub mod server;
