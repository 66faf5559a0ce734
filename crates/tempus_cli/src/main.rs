//! Tempus CLI, the command-line interface for the Tempus timing analyzer.
//!
//! Provides `tempus check-timing`, which loads a design's timing graph and
//! SDC constraints and reports the constraint gaps that would make timing
//! analysis untrustworthy.

#![warn(missing_docs)]

mod check_timing;
mod pipeline;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Exit code for a run that could not load its inputs.
const EXIT_LOAD_ERROR: i32 = 2;

/// Tempus static timing constraint checking.
#[derive(Parser, Debug)]
#[command(name = "tempus", version, about = "Tempus static timing analyzer")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `tempus.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check the design's constraints for gaps.
    CheckTiming(CheckTimingArgs),
}

/// Arguments for the `tempus check-timing` subcommand.
#[derive(Parser, Debug)]
pub struct CheckTimingArgs {
    /// Timing graph JSON file, overriding `design.netlist`.
    #[arg(long)]
    pub netlist: Option<String>,

    /// SDC files, overriding `design.sdc`.
    #[arg(long, num_args = 1..)]
    pub sdc: Vec<String>,

    /// Checks to run (e.g., `--check loops no-input-delay`). Default: all.
    #[arg(long, num_args = 1..)]
    pub check: Vec<String>,

    /// Checks to leave out.
    #[arg(long, num_args = 1..)]
    pub skip: Vec<String>,

    /// Output format for the report.
    #[arg(short, long, value_enum)]
    pub format: Option<ReportFormat>,

    /// Stop the loop search after this many vertices.
    #[arg(long)]
    pub loop_budget: Option<usize>,
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

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

impl From<tempus_config::ReportFormat> for ReportFormat {
    fn from(format: tempus_config::ReportFormat) -> Self {
        match format {
            tempus_config::ReportFormat::Text => ReportFormat::Text,
            tempus_config::ReportFormat::Json => ReportFormat::Json,
        }
    }
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::io::IsTerminal::is_terminal(&std::io::stderr()),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };
    init_tracing(&global);

    let result = match cli.command {
        Command::CheckTiming(ref args) => check_timing::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(EXIT_LOAD_ERROR);
        }
    }
}

/// Installs the log subscriber. `RUST_LOG` overrides the flag-derived level.
fn init_tracing(global: &GlobalArgs) {
    let level = if global.verbose {
        "debug"
    } else if global.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .with_ansi(global.color)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_check_timing_default() {
        let cli = Cli::parse_from(["tempus", "check-timing"]);
        match cli.command {
            Command::CheckTiming(ref args) => {
                assert!(args.netlist.is_none());
                assert!(args.sdc.is_empty());
                assert!(args.check.is_empty());
                assert!(args.skip.is_empty());
                assert!(args.format.is_none());
                assert!(args.loop_budget.is_none());
            }
        }
    }

    #[test]
    fn parse_check_timing_with_args() {
        let cli = Cli::parse_from([
            "tempus",
            "check-timing",
            "--netlist",
            "top.json",
            "--sdc",
            "clocks.sdc",
            "io.sdc",
            "--check",
            "loops",
            "--skip",
            "generated-clocks",
            "--format",
            "json",
            "--loop-budget",
            "1000",
        ]);
        let Command::CheckTiming(args) = cli.command;
        assert_eq!(args.netlist.as_deref(), Some("top.json"));
        assert_eq!(args.sdc, vec!["clocks.sdc", "io.sdc"]);
        assert_eq!(args.check, vec!["loops"]);
        assert_eq!(args.skip, vec!["generated-clocks"]);
        assert_eq!(args.format, Some(ReportFormat::Json));
        assert_eq!(args.loop_budget, Some(1000));
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["tempus", "--quiet", "--color", "never", "check-timing"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.color, ColorChoice::Never);
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["tempus", "check-timing", "--verbose", "--config", "x.toml"]);
        assert!(cli.verbose);
        assert_eq!(cli.config.as_deref(), Some("x.toml"));
    }

    #[test]
    fn parse_color_default_auto() {
        let cli = Cli::parse_from(["tempus", "check-timing"]);
        assert_eq!(cli.color, ColorChoice::Auto);
    }

    #[test]
    fn config_format_converts() {
        assert_eq!(
            ReportFormat::from(tempus_config::ReportFormat::Json),
            ReportFormat::Json
        );
    }

    #[test]
    fn unknown_subcommand_rejected() {
        assert!(Cli::try_parse_from(["tempus", "synthesize"]).is_err());
    }
}
