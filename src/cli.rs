// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::engine::Mode;

/// Command-line arguments for `grainflow`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "grainflow",
    version,
    about = "Add two 4-bit numbers by moving grains between memory rows.",
    long_about = None
)]
pub struct CliArgs {
    /// First operand (0..=15).
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=15), required_unless_present_any = ["exhaustive", "dry_run"])]
    pub a: Option<u8>,

    /// Second operand (0..=15).
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=15), required_unless_present_any = ["exhaustive", "dry_run"])]
    pub b: Option<u8>,

    /// Initial carry-in.
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=1))]
    pub c0: u8,

    /// Worker used to move grains.
    #[arg(long, value_enum, default_value_t = Mode::Virtual)]
    pub mode: Mode,

    /// Path to the config file (TOML).
    ///
    /// Default: `Grainflow.toml` in the current working directory if it
    /// exists, built-in defaults otherwise.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Run all 256 operand pairs and report mismatches.
    #[arg(long)]
    pub exhaustive: bool,

    /// Print the plan without executing it.
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `GRAINFLOW_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
