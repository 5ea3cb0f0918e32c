// Command-line interface definition.

use clap::{Parser, Subcommand, ValueEnum};
use pennant_core::leaderboard::StatKind;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "League stats: leaderboards, standings and playoff bracket")]
pub struct Cli {
    /// Project directory holding config/, defaults/ and the sheet data
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Emit compact JSON instead of pretty-printed
    #[arg(long)]
    pub compact: bool,

    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "lower_case")]
pub enum Command {
    /// Stat leaderboards for the regular season or playoffs
    Leaders {
        #[arg(long, value_enum, default_value_t = Phase::Regular)]
        phase: Phase,
        /// Only this stat (e.g. avg, era, home_runs)
        #[arg(long, value_parser = parse_stat)]
        stat: Option<StatKind>,
    },
    /// Ranked standings table
    Standings,
    /// Playoff bracket with resolved series winners
    Bracket,
    /// Everything above in one document
    Report,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Regular,
    Playoffs,
}

/// Accepts the same names as the `[leaderboards]` stat lists.
fn parse_stat(s: &str) -> Result<StatKind, String> {
    serde_json::from_value(serde_json::Value::String(s.trim().to_lowercase()))
        .map_err(|_| format!("unknown stat '{s}'"))
}
