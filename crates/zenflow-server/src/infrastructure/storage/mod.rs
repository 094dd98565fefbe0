//! Storage infrastructure: the optional TOML configuration file.
//!
//! The server runs fine without a file; `--config <path>` (or
//! `ZENFLOW_CONFIG`) layers file values under the command-line flags.

pub mod config;

pub use config::{load_config, ConfigError, FileConfig};
