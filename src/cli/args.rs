//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs, devices::DevicesArgs, extract::ExtractArgs, mods::ModsArgs,
    show::ShowArgs,
};

#[derive(Parser)]
#[command(name = "edm")]
#[command(author, version, about = "E-test device metadata extractor")]
#[command(long_about = "Builds per-device module placement and wafer geometry records from DIETEST, DIE, WAFER and WAFERTEST probe files.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug, Default)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Config file (default: ./edm.yaml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract every device and update the output collection
    Extract(ExtractArgs),

    /// Parse one device from its source files and print the record
    Show(ShowArgs),

    /// List devices in the output collection
    Devices(DevicesArgs),

    /// List modules across devices in the output collection
    Mods(ModsArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (table for lists, json for records)
    #[default]
    Auto,
    /// JSON format (for programming)
    Json,
    /// Human-readable text
    Text,
    /// Tab-separated values (for piping)
    Tsv,
}
