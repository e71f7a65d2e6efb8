//! Terminal front end: submit an article, watch the analysis, browse history.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use credcheck_common::ClientConfig;

mod cmd;
mod render;

use cmd::Context;

#[derive(Parser)]
#[command(name = "credcheck", about = "Check a news article's credibility")]
#[command(version)]
struct Cli {
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit an article URL and follow its analysis
    Check {
        url: String,

        /// Manual retries after a failed analysis
        #[arg(long, default_value_t = 0)]
        retries: u32,
    },

    /// Follow an analysis that was already submitted
    Resume {
        uid: String,

        /// Article URL, if not in the recent checks list
        #[arg(long)]
        url: Option<String>,

        #[arg(long, default_value_t = 0)]
        retries: u32,
    },

    /// List recent checks
    History {
        /// Fetch the backend's history instead of the local list
        #[arg(long)]
        remote: bool,

        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 20)]
        limit: u32,
    },

    /// Show proxy and backend reachability
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("credcheck=warn".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = Context {
        config: ClientConfig::from_env()?,
        json: cli.json,
    };

    match cli.command {
        Commands::Check { url, retries } => cmd::check::check(&ctx, &url, retries).await,
        Commands::Resume { uid, url, retries } => {
            cmd::check::resume(&ctx, &uid, url, retries).await
        }
        Commands::History {
            remote,
            page,
            limit,
        } => cmd::history::run(&ctx, remote, page, limit).await,
        Commands::Health => cmd::health::run(&ctx).await,
    }
}
