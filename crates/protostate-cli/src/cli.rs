use clap::{Args, Parser, Subcommand, ValueEnum};
use protostate::engine::config::EnvironmentSelection;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Protostate Developers",
    version,
    about = "Protostate CLI - Exact protonation-state thermodynamics of multi-site titratable systems.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used to enumerate microstates.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute protonation curves over a range of pH values and write them as CSV.
    Titrate(TitrateArgs),
    /// Report instance probabilities and the most probable state at a single pH.
    Analyze(AnalyzeArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentArg {
    Folded,
    Unfolded,
    Both,
}

impl From<EnvironmentArg> for EnvironmentSelection {
    fn from(arg: EnvironmentArg) -> Self {
        match arg {
            EnvironmentArg::Folded => EnvironmentSelection::Folded,
            EnvironmentArg::Unfolded => EnvironmentSelection::Unfolded,
            EnvironmentArg::Both => EnvironmentSelection::Both,
        }
    }
}

/// Arguments for the `titrate` subcommand.
#[derive(Args, Debug)]
pub struct TitrateArgs {
    // --- Core Arguments ---
    /// Path to the titratable system definition (TOML).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub system: PathBuf,

    /// Path for the CSV output. Written to stdout when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Path to an optional run configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Overrides ---
    /// Override the temperature in Kelvin.
    #[arg(short, long, value_name = "FLOAT")]
    pub temperature: Option<f64>,

    /// Override the first pH value of the grid.
    #[arg(long, value_name = "FLOAT", allow_negative_numbers = true)]
    pub ph_start: Option<f64>,

    /// Override the last pH value of the grid.
    #[arg(long, value_name = "FLOAT", allow_negative_numbers = true)]
    pub ph_end: Option<f64>,

    /// Override the pH increment of the grid.
    #[arg(long, value_name = "FLOAT")]
    pub ph_step: Option<f64>,

    /// Override which environments are evaluated.
    #[arg(short, long, value_enum, value_name = "ENV")]
    pub environments: Option<EnvironmentArg>,

    /// Override the tolerance used when checking interaction symmetry.
    #[arg(long, value_name = "FLOAT")]
    pub symmetry_tolerance: Option<f64>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S titration.ph-step=0.25
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `analyze` subcommand.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Path to the titratable system definition (TOML).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub system: PathBuf,

    /// Path to an optional run configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// pH at which the system is analyzed.
    #[arg(long, value_name = "FLOAT", allow_negative_numbers = true)]
    pub ph: Option<f64>,

    /// Override the temperature in Kelvin.
    #[arg(short, long, value_name = "FLOAT")]
    pub temperature: Option<f64>,

    /// Override the tolerance used when checking interaction symmetry.
    #[arg(long, value_name = "FLOAT")]
    pub symmetry_tolerance: Option<f64>,

    /// Set a specific configuration value, overriding the config file.
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}
