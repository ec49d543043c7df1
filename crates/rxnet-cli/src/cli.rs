use clap::{Args, Parser, Subcommand, ValueEnum};
use rxnet::engine::status::JobState;
use rxnet::workflows::extract::ExtractCriteria;
use rxnet::workflows::generate::{OverwriteCriteria, SpStrategy};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Davide Loddo",
    version,
    about = "rxnet - campaign manager for combinatorial quantum-chemistry reaction-network calculations: input generation, lifecycle status, and thermodynamic result extraction.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the reaction-network configuration file (TOML).
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,

    /// System directory holding the calculation tree (defaults to the
    /// current working directory).
    #[arg(short, long, global = true, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Materialize input files for every enumerated calculation.
    Generate(GenerateArgs),
    /// Classify every enumerated calculation and print a grouped report.
    Status(StatusArgs),
    /// Extract result records from completed outputs and assemble profiles.
    Extract(ExtractArgs),
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Overwrite existing input files matching the given criterion.
    #[arg(short, long, value_enum, value_name = "CRITERIA")]
    pub overwrite: Option<OverwriteArg>,

    /// Single-point generation strategy.
    #[arg(long = "sp-strategy", value_enum, default_value = "smart")]
    pub sp_strategy: SpStrategyArg,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print only the per-group and overall summaries, not every row.
    #[arg(long)]
    pub summary_only: bool,
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Lifecycle state eligible for extraction.
    #[arg(short, long, value_enum, default_value = "successful")]
    pub criteria: CriteriaArg,

    /// Output directory for CSV tables (defaults to
    /// `<dir>/extracted_data`).
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteArg {
    All,
    Nofile,
    Crash,
    Terminated,
    Successful,
    Running,
}

impl From<OverwriteArg> for OverwriteCriteria {
    fn from(arg: OverwriteArg) -> Self {
        match arg {
            OverwriteArg::All => OverwriteCriteria::All,
            OverwriteArg::Nofile => OverwriteCriteria::NoFile,
            OverwriteArg::Crash => OverwriteCriteria::State(JobState::Crash),
            OverwriteArg::Terminated => OverwriteCriteria::State(JobState::Terminated),
            OverwriteArg::Successful => OverwriteCriteria::State(JobState::Successful),
            OverwriteArg::Running => OverwriteCriteria::State(JobState::Running),
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpStrategyArg {
    Always,
    Smart,
    Never,
}

impl From<SpStrategyArg> for SpStrategy {
    fn from(arg: SpStrategyArg) -> Self {
        match arg {
            SpStrategyArg::Always => SpStrategy::Always,
            SpStrategyArg::Smart => SpStrategy::Smart,
            SpStrategyArg::Never => SpStrategy::Never,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriteriaArg {
    All,
    Successful,
    Running,
    Crash,
    Terminated,
    Nofile,
    Empty,
    Validation,
}

impl From<CriteriaArg> for ExtractCriteria {
    fn from(arg: CriteriaArg) -> Self {
        match arg {
            CriteriaArg::All => ExtractCriteria::All,
            CriteriaArg::Successful => ExtractCriteria::State(JobState::Successful),
            CriteriaArg::Running => ExtractCriteria::State(JobState::Running),
            CriteriaArg::Crash => ExtractCriteria::State(JobState::Crash),
            CriteriaArg::Terminated => ExtractCriteria::State(JobState::Terminated),
            CriteriaArg::Nofile => ExtractCriteria::State(JobState::NoFile),
            CriteriaArg::Empty => ExtractCriteria::State(JobState::Empty),
            CriteriaArg::Validation => ExtractCriteria::State(JobState::Validation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_extract_with_defaults() {
        let cli = Cli::try_parse_from(["rxnet", "network.toml", "extract"]).unwrap();
        match cli.command {
            Commands::Extract(args) => {
                assert_eq!(args.criteria, CriteriaArg::Successful);
                assert!(args.out_dir.is_none());
            }
            _ => panic!("expected extract"),
        }
    }

    #[test]
    fn parses_generate_overwrite_and_strategy() {
        let cli = Cli::try_parse_from([
            "rxnet",
            "network.toml",
            "generate",
            "--overwrite",
            "crash",
            "--sp-strategy",
            "never",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.overwrite, Some(OverwriteArg::Crash));
                assert_eq!(args.sp_strategy, SpStrategyArg::Never);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["rxnet", "c.toml", "-v", "-q", "status"]).is_err());
    }
}
