//! Connection configuration for the filesystem hadoopit manages.

pub mod config;
pub mod loader;

pub use config::ConnectionConfig;
pub use loader::ConfigLoader;
