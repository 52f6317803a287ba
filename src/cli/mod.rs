//! CLI module for Roundtable.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Roundtable - turn-based multi-agent conversations
///
/// Runs a team of LLM agents that take turns on a shared conversation,
/// calling tools along the way.
#[derive(Parser, Debug)]
#[command(name = "roundtable")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "ROUNDTABLE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a team on a task
    Run {
        /// Team description (TOML)
        team: PathBuf,

        /// Task for the team (defaults to the team file's `task`)
        task: Option<String>,

        /// Write the session transcript (JSON) to this file
        #[arg(short, long)]
        transcript: Option<String>,

        /// Use this model for every agent
        #[arg(short, long)]
        model: Option<String>,

        /// Override the team's turn budget
        #[arg(long)]
        max_turns: Option<usize>,
    },

    /// List the built-in tools agents can use
    Tools {
        /// Print parameter schemas as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a saved transcript
    Show {
        /// Transcript file written by `run --transcript`
        transcript: PathBuf,
    },

    /// Check configuration and API access
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the current (or default) configuration to the config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show configuration file path
    Path,
}
