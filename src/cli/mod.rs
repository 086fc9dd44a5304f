//! CLI module for the indexer.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use output::OutputFormat;

/// Bulk document and passage indexer for a Vespa search application.
#[derive(Debug, Parser)]
#[command(name = "vindex")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(long, short = 'f', global = true, help = "Output format: text or json")]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate index records from parser outputs and feed them to the index
    Populate(commands::PopulateArgs),

    /// Check index connectivity
    Status,

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}
