// src/cli/mod.rs — CLI definition (clap derive)

pub mod export;
pub mod progress;
pub mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "designloop",
    about = "Design space exploration for wearable sensing hardware",
    version
)]
pub struct Cli {
    /// Design brief (TOML or JSON). The built-in glucose monitor brief is used when omitted.
    #[arg(short, long)]
    pub brief: Option<PathBuf>,

    /// Model to use (provider/model, or a model id for the configured provider)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Max refinement rounds (0 = evaluate once, then select)
    #[arg(short, long)]
    pub iterate: Option<u32>,

    /// Number of candidates to generate
    #[arg(long)]
    pub candidates: Option<u32>,

    /// Candidates carried into each refinement round
    #[arg(long)]
    pub top_k: Option<u32>,

    /// What to print on stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Also write the run (state + metadata) as JSON to this file
    #[arg(long)]
    pub json_out: Option<PathBuf>,

    /// Suppress progress output (only emit the final result)
    #[arg(long)]
    pub quiet: bool,

    /// Log step-level detail to stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Config file path
    #[arg(long)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write the sample design brief
    Brief {
        /// Destination file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Re-render the report from an exported run
    Render {
        /// JSON written by --json-out or --format json
        state: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
