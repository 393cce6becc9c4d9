//! Stratum CLI: the command-line front end of the 3D-IC floorplanner.
//!
//! Provides `stratum run` to floorplan a design, `stratum check` to validate
//! a design and configuration without searching, and `stratum config` to
//! print the effective configuration.

#![warn(missing_docs)]

mod check;
mod config;
mod pipeline;
mod run;

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use stratum_diagnostics::Verbosity;

/// Stratum: simulated-annealing floorplanning for 3D ICs.
#[derive(Parser, Debug)]
#[command(name = "stratum", version, about = "Stratum 3D-IC Floorplanner")]
pub struct Cli {
    /// Suppress all output except errors and warnings.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase progress output (`-v` phases, `-vv` every temperature level).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a `stratum.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Floorplan a design.
    Run(RunArgs),
    /// Validate a design and configuration without searching.
    Check(CheckArgs),
    /// Print the effective configuration as TOML.
    Config(ConfigArgs),
}

/// Arguments for `stratum run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Design file (JSON).
    pub design: PathBuf,

    /// Write the result JSON here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Override `annealing.seed`.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override `annealing.max_levels`.
    #[arg(long)]
    pub max_levels: Option<usize>,

    /// Output format for diagnostics.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for `stratum check`.
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Design file (JSON).
    pub design: PathBuf,

    /// Output format for diagnostics.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for `stratum config`.
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Print the built-in defaults, ignoring `--config`.
    #[arg(long)]
    pub defaults: bool,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Diagnostic output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// One JSON object per line.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// How much progress output to keep.
    pub verbosity: Verbosity,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a configuration file.
    pub config: Option<PathBuf>,
}

impl GlobalArgs {
    /// Returns `true` if summaries should be printed.
    pub fn chatty(&self) -> bool {
        self.verbosity.allows(Verbosity::Normal)
    }
}

fn verbosity(quiet: bool, verbose: u8) -> Verbosity {
    match (quiet, verbose) {
        (true, _) => Verbosity::Quiet,
        (false, 0) => Verbosity::Normal,
        (false, 1) => Verbosity::Verbose,
        (false, _) => Verbosity::Debug,
    }
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => {
            std::env::var_os("NO_COLOR").is_none() && std::env::var_os("TERM").is_some()
        }
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        verbosity: verbosity(cli.quiet, cli.verbose),
        color,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Run(ref args) => run::run(args, &global),
        Command::Check(ref args) => check::run(args, &global),
        Command::Config(ref args) => config::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
