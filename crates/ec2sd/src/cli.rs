use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Discover EC2 instances as scrape targets.
#[derive(Debug, Parser)]
#[command(name = "ec2sd", version, about, arg_required_else_help = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long, global = true, env = "EC2SD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the effective configuration (secret key redacted)
    Config,

    /// Print the compiled tag filters as JSON (`null` means no filtering)
    Filters,

    /// Run discovery over saved describe-instances pages
    Run(RunArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// JSON files from `aws ec2 describe-instances --output json`, one per page
    #[arg(long = "pages", required = true, num_args = 1..)]
    pub pages: Vec<PathBuf>,

    /// Refresh once, print the snapshot, and exit
    #[arg(long)]
    pub once: bool,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
