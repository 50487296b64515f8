use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "capstan")]
#[command(version)]
#[command(about = "Deployment workspace CLI - bounce, diff, and tear down app workspaces", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Tear down a repository's workspace: helm release, terraform
    /// infrastructure, then local generated state
    Destroy {
        /// Repository whose workspace to destroy
        repository: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Redeploy the installed helm chart
    Bounce {
        /// Repository whose release to bounce
        repository: String,
    },

    /// Preview what a bounce would change (requires the helm-diff plugin)
    Diff {
        /// Repository whose release to diff
        repository: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
