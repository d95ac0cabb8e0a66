//! Command line configuration.
//!
//! Hash parameters come from an optional JSON file and are then overridden
//! by flags, so a checked-in cluster config can be explored with tweaks.

use crate::commands::{Command, CommandResult};
use anyhow::Context;
use clap::{Parser, ValueEnum};
use corelib::{HashConfig, HashKind};
use replication::DefaultConsistentHashFactory;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Hash function choice on the command line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum HashArg {
    Murmur3,
    Sip,
    Xxh3,
}

impl From<HashArg> for HashKind {
    fn from(arg: HashArg) -> Self {
        match arg {
            HashArg::Murmur3 => HashKind::Murmur3,
            HashArg::Sip => HashKind::Sip,
            HashArg::Xxh3 => HashKind::Xxh3,
        }
    }
}

/// Inspect and simulate segment ownership for a cluster.
#[derive(Debug, Parser)]
#[command(name = "chctl", version)]
pub struct CliConfig {
    /// JSON file with `num_owners`, `num_segments` and `hash`.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of owners per segment.
    #[arg(long, global = true)]
    pub owners: Option<usize>,

    /// Number of segments.
    #[arg(long, global = true)]
    pub segments: Option<usize>,

    /// Hash function.
    #[arg(long, value_enum, global = true)]
    pub hash: Option<HashArg>,

    /// Print JSON instead of a table.
    #[arg(long, global = true)]
    pub json: bool,

    /// Log factory decisions to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    /// Resolve the hash configuration: file first, then flag overrides.
    pub fn hash_config(&self) -> anyhow::Result<HashConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => HashConfig::default(),
        };

        if let Some(owners) = self.owners {
            config.num_owners = owners;
        }
        if let Some(segments) = self.segments {
            config.num_segments = segments;
        }
        if let Some(hash) = self.hash {
            config.hash = hash.into();
        }
        config.validate()?;
        debug!(?config, "resolved hash configuration");
        Ok(config)
    }

    /// Run the selected command and render its output.
    pub fn run(&self) -> anyhow::Result<String> {
        let config = self.hash_config()?;
        let factory = DefaultConsistentHashFactory::new();
        let result: CommandResult = self.command.execute(&factory, &config)?;
        result.render(self.json)
    }
}
