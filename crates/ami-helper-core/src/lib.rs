//! ami-helper core - Shared paths and configuration for the ami-helper tools
//!
//! Everything here is resolved once at startup and handed to the binary;
//! nothing in this crate talks to the network.

pub mod config;
pub mod paths;

pub use config::Config;
pub use paths::Paths;
