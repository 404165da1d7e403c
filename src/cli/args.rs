//! Command line argument parsing for the Vitrine CLI using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Vitrine - product recommendations from implicit shopper signals
#[derive(Parser, Debug, Clone)]
#[command(name = "vitrine")]
#[command(about = "Neighborhood-based product recommendations from implicit shopper signals")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct VitrineArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "json", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl VitrineArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Recommend products for a user
    Run(RunArgs),

    /// List the most popular products
    Popular(PopularArgs),

    /// Show pipeline statistics for an interactions file
    Stats(StatsArgs),
}

/// Settings shared by every command that builds an engine.
#[derive(Args, Debug, Clone, Default)]
pub struct EngineArgs {
    /// Engine configuration file (JSON)
    #[arg(long, value_name = "CONFIG_FILE", env = "VITRINE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Requested neighbor count
    #[arg(long, value_name = "K")]
    pub neighbors: Option<usize>,

    /// Distance metric (cosine, euclidean, manhattan, angular, dot_product)
    #[arg(long)]
    pub metric: Option<String>,

    /// Index structure (auto, brute_force, vp_tree)
    #[arg(long)]
    pub structure: Option<String>,

    /// Matrix weights, e.g. click=1,view=2,favorite=3,purchase=5
    #[arg(long, value_name = "SPEC")]
    pub weights: Option<String>,
}

/// Arguments for recommending products
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Interactions file (JSON array)
    #[arg(value_name = "INTERACTIONS")]
    pub interactions: PathBuf,

    /// User to recommend for
    #[arg(value_name = "USER_ID")]
    pub user_id: String,

    /// Number of recommendations (defaults to the configured limit)
    #[arg(value_name = "N")]
    pub limit: Option<usize>,

    /// Products file (JSON array)
    #[arg(long, value_name = "PRODUCTS_FILE")]
    pub products: Option<PathBuf>,

    /// Product ids to never recommend (JSON array of strings)
    #[arg(long, value_name = "EXCLUDE_FILE")]
    pub exclude: Option<PathBuf>,

    #[command(flatten)]
    pub engine: EngineArgs,
}

/// Arguments for listing popular products
#[derive(Parser, Debug, Clone)]
pub struct PopularArgs {
    /// Interactions file (JSON array)
    #[arg(value_name = "INTERACTIONS")]
    pub interactions: PathBuf,

    /// Number of products (defaults to the configured limit)
    #[arg(value_name = "N")]
    pub limit: Option<usize>,

    /// Engine configuration file (JSON)
    #[arg(long, value_name = "CONFIG_FILE", env = "VITRINE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Arguments for pipeline statistics
#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {
    /// Interactions file (JSON array)
    #[arg(value_name = "INTERACTIONS")]
    pub interactions: PathBuf,

    /// Products file (JSON array)
    #[arg(long, value_name = "PRODUCTS_FILE")]
    pub products: Option<PathBuf>,

    #[command(flatten)]
    pub engine: EngineArgs,
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable output
    Human,
}
