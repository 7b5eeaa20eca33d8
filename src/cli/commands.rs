//! CLI command definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "accord")]
#[command(about = "Accord - mediated bilateral price negotiation", long_about = None)]
pub struct Cli {
    /// Configuration file (TOML); built-in scenario when omitted
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Subcommand to execute, `run` when none was given
    pub fn command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Run(RunArgs::default()))
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Run one negotiation session end to end (default)
    Run(RunArgs),

    /// Validate a single JSON offer message
    Validate {
        /// Offer as a JSON object
        message: String,
    },

    /// Print the default configuration as TOML
    Config,
}

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Where to write the convergence chart
    #[arg(long, default_value = "negotiation_path.svg")]
    pub chart: PathBuf,

    /// Do not write a chart
    #[arg(long)]
    pub no_chart: bool,

    /// Print the session report as JSON
    #[arg(long)]
    pub json: bool,

    /// Abort the session if it runs longer than this
    #[arg(long, default_value = "30")]
    pub timeout_secs: u64,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            chart: PathBuf::from("negotiation_path.svg"),
            no_chart: false,
            json: false,
            timeout_secs: 30,
        }
    }
}
