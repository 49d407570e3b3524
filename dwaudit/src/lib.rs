//! Library module for the dwaudit command-line tool.
//!
//! Argument parsing, file loading and report rendering live here so they can
//! be tested without spawning the binary. The binary entry point is in
//! `main.rs`.

pub mod data;
pub mod output;
pub mod runtime;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use dwaudit_core::PluginCategory;

use crate::data::TableSource;
use crate::output::OutputFormat;

/// CLI argument structure
#[derive(Debug, Parser)]
#[command(name = "dwaudit")]
#[command(about = "Data warehouse column auditor")]
#[command(version)]
#[command(long_about = "
dwaudit - Column-level data quality audits

Runs registered checks and insights against tables supplied as JSON rows.
Checks flag rule violations such as stray whitespace, duplicate keys or
out-of-range values; insights report profiling statistics.

Examples:
  dwaudit list --category check
  dwaudit describe numeric_range
  dwaudit run --config audit.json --data users=users.json --format summary
")]
pub struct Cli {
    /// Flags accepted by every subcommand
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Flags shared by every subcommand.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List registered plugins
    List {
        /// Only list plugins of this category
        #[arg(long, value_name = "CATEGORY")]
        category: Option<PluginCategory>,
    },

    /// Show the parameter schema of a plugin as JSON
    Describe {
        /// Registered plugin name
        name: String,

        /// Plugin category
        #[arg(long, value_name = "CATEGORY", default_value = "check")]
        category: PluginCategory,
    },

    /// Audit tables against a configuration
    Run(RunArgs),
}

/// Arguments of the `run` command.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Audit configuration file (JSON)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Table data as <table>=<rows.json>; repeatable
    #[arg(short, long = "data", value_name = "TABLE=FILE", required = true)]
    pub data: Vec<TableSource>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Reject parameters not declared by a plugin's schema
    #[arg(long)]
    pub strict: bool,

    /// Global timeout in seconds, overriding the configuration
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Evaluation instant (RFC 3339) for reproducible runs
    #[arg(long, value_name = "TIMESTAMP")]
    pub now: Option<DateTime<Utc>>,
}
