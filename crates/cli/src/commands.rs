//! CLI subcommands.

use anyhow::bail;
use clap::Subcommand;
use corelib::{ConsistentHash, HashConfig, Node, NodeId, RoutingTable, SegmentId};
use replication::ConsistentHashFactory;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt::Write;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a balanced placement for a member list (oldest first).
    Create {
        #[arg(long, value_delimiter = ',', required = true)]
        members: Vec<String>,
    },

    /// Apply leaves and joins to a fresh placement, then rebalance.
    Simulate {
        #[arg(long, value_delimiter = ',', required = true)]
        members: Vec<String>,
        /// Members that leave.
        #[arg(long, value_delimiter = ',')]
        leave: Vec<String>,
        /// Nodes that join (appended, so they are the youngest).
        #[arg(long, value_delimiter = ',')]
        join: Vec<String>,
        /// Also show the add-only intermediate placement.
        #[arg(long)]
        two_phase: bool,
    },

    /// Show the segment and owners of each key.
    Locate {
        #[arg(long, value_delimiter = ',', required = true)]
        members: Vec<String>,
        #[arg(required = true)]
        keys: Vec<String>,
    },
}

/// Where a key lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyLocation {
    pub key: String,
    pub segment: SegmentId,
    pub owners: Vec<String>,
}

/// Output of a command.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandResult {
    Placement {
        table: RoutingTable,
    },
    Simulation {
        before: RoutingTable,
        updated: RoutingTable,
        intermediate: Option<RoutingTable>,
        after: RoutingTable,
        /// Segments whose owner set differs between `before` and `after`.
        moved_segments: Vec<SegmentId>,
    },
    Locations {
        keys: Vec<KeyLocation>,
    },
}

/// Maps node ids back to the names given on the command line.
#[derive(Debug, Default)]
struct Names(HashMap<NodeId, String>);

impl Names {
    fn register(&mut self, names: &[String]) -> Vec<NodeId> {
        names
            .iter()
            .map(|name| {
                let node = Node::named(name.trim());
                let id = node.id;
                self.0.insert(id, node.name);
                id
            })
            .collect()
    }

    fn table(&self, ch: &ConsistentHash) -> RoutingTable {
        RoutingTable::new(ch, |id| self.name(id))
    }

    fn name(&self, id: &NodeId) -> String {
        self.0.get(id).cloned().unwrap_or_else(|| id.to_string())
    }
}

impl Command {
    pub fn execute(
        &self,
        factory: &dyn ConsistentHashFactory,
        config: &HashConfig,
    ) -> anyhow::Result<CommandResult> {
        let mut names = Names::default();
        match self {
            Command::Create { members } => {
                let members = names.register(members);
                let ch = factory.create_from_config(config, &members)?;
                Ok(CommandResult::Placement {
                    table: names.table(&ch),
                })
            }

            Command::Simulate {
                members,
                leave,
                join,
                two_phase,
            } => {
                let initial = names.register(members);
                let leavers: HashSet<NodeId> = names.register(leave).into_iter().collect();
                let joiners = names.register(join);
                for leaver in &leavers {
                    if !initial.contains(leaver) {
                        bail!("{} is not a member", names.name(leaver));
                    }
                }

                let before = factory.create_from_config(config, &initial)?;
                let mut next: Vec<NodeId> = initial
                    .iter()
                    .copied()
                    .filter(|m| !leavers.contains(m))
                    .collect();
                next.extend(joiners);

                let updated = factory.update_members(&before, &next)?;
                let intermediate = if *two_phase {
                    Some(factory.rebalance(&updated, true)?)
                } else {
                    None
                };
                let after = factory.rebalance(intermediate.as_ref().unwrap_or(&updated), false)?;

                let moved_segments = moved_segments(&before, &after);
                info!(
                    moved = moved_segments.len(),
                    segments = after.num_segments(),
                    "simulation finished"
                );

                Ok(CommandResult::Simulation {
                    before: names.table(&before),
                    updated: names.table(&updated),
                    intermediate: intermediate.map(|ch| names.table(&ch)),
                    after: names.table(&after),
                    moved_segments,
                })
            }

            Command::Locate { members, keys } => {
                let members = names.register(members);
                let ch = factory.create_from_config(config, &members)?;
                let keys = keys
                    .iter()
                    .map(|key| {
                        let segment = ch.segment_for(key.as_bytes());
                        KeyLocation {
                            key: key.clone(),
                            segment,
                            owners: ch
                                .owners_for_segment(segment)
                                .iter()
                                .map(|id| names.name(id))
                                .collect(),
                        }
                    })
                    .collect();
                Ok(CommandResult::Locations { keys })
            }
        }
    }
}

/// Segments whose owner set changed. Member order within a segment is
/// ignored: a primary swap does not move data.
fn moved_segments(before: &Arc<ConsistentHash>, after: &Arc<ConsistentHash>) -> Vec<SegmentId> {
    (0..before.num_segments())
        .filter(|&segment| {
            let old: HashSet<&NodeId> = before.owners_for_segment(segment).iter().collect();
            let new: HashSet<&NodeId> = after.owners_for_segment(segment).iter().collect();
            old != new
        })
        .collect()
}

impl CommandResult {
    /// Render as pretty JSON or as plain text tables.
    pub fn render(&self, json: bool) -> anyhow::Result<String> {
        if json {
            return Ok(serde_json::to_string_pretty(self)?);
        }

        let mut out = String::new();
        match self {
            CommandResult::Placement { table } => write_table(&mut out, "placement", table)?,
            CommandResult::Simulation {
                before,
                updated,
                intermediate,
                after,
                moved_segments,
            } => {
                write_table(&mut out, "before", before)?;
                write_table(&mut out, "after membership update", updated)?;
                if let Some(intermediate) = intermediate {
                    write_table(&mut out, "intermediate (add-only)", intermediate)?;
                }
                write_table(&mut out, "after rebalance", after)?;
                writeln!(
                    out,
                    "{} of {} segments changed owners",
                    moved_segments.len(),
                    after.num_segments
                )?;
            }
            CommandResult::Locations { keys } => {
                for location in keys {
                    writeln!(
                        out,
                        "{} -> segment {}: {}",
                        location.key,
                        location.segment,
                        location.owners.join(", ")
                    )?;
                }
            }
        }
        Ok(out.trim_end().to_string())
    }
}

fn write_table(out: &mut String, title: &str, table: &RoutingTable) -> std::fmt::Result {
    writeln!(
        out,
        "== {} (hash={}, owners={}, segments={})",
        title, table.hash, table.num_owners, table.num_segments
    )?;
    for (segment, owners) in table.segments.iter().enumerate() {
        write!(out, "{:>4}: {}", segment, owners[0])?;
        if owners.len() > 1 {
            write!(out, " ({})", owners[1..].join(", "))?;
        }
        writeln!(out)?;
    }
    for member in &table.members {
        if let Some(summary) = table.ownership.get(member) {
            writeln!(
                out,
                "  {}: primary={} total={}",
                member, summary.primary, summary.total
            )?;
        }
    }
    writeln!(out)
}
