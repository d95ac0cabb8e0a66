//! CLI tool for inspecting segment placement.
//!
//! Provides commands for:
//! - Creating a placement for a member list
//! - Simulating leaves, joins and rebalances
//! - Locating the owners of keys

pub mod commands;
pub mod config;

pub use commands::{Command, CommandResult};
pub use config::CliConfig;
