//! CLI argument definitions using clap derive

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// bcsched - OpenShift build dependency scheduler
///
/// Triggers builds in dependency order, running independent builds
/// concurrently, until every image stream in the batch is built.
#[derive(Parser, Debug)]
#[command(name = "bcsched")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "BCSCHED_CONFIG")]
    pub config: Option<PathBuf>,

    /// Namespace for names that don't carry one
    #[arg(short, long, global = true)]
    pub namespace: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Trigger builds in dependency order
    Build(BuildArgs),

    /// Show the build order without triggering anything
    Plan(PlanArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Which build configs to work on and where their resources come from
#[derive(Args, Debug, Clone, Default)]
pub struct ResourceArgs {
    /// Build configs as [namespace/]kind/name or a bare build config name
    /// (defaults to every build config in --file)
    pub names: Vec<String>,

    /// JSON resource or List holding the batch being applied
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    #[command(flatten)]
    pub resources: ResourceArgs,

    /// Output format
    #[arg(long, default_value = "table")]
    pub format: OutputFormat,

    /// Seconds to wait for each build (0 = forever)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Maximum builds running at once (0 = unbounded)
    #[arg(long)]
    pub max_concurrent: Option<usize>,

    /// Keep going when a build fails
    #[arg(long)]
    pub ignore_failures: bool,
}

/// Arguments for the plan command
#[derive(Parser, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub resources: ResourceArgs,

    /// Output format
    #[arg(long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}
