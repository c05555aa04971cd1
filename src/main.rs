use anyhow::Result;
use clap::{Args, Parser, Subcommand};

mod cmd;

#[derive(Parser)]
#[command(name = "milo-kanban")]
#[command(version, about = "Two-board kanban with a daily accomplishments log, stored in GitHub")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Selects the backing store for a command.
#[derive(Args, Clone, Debug)]
pub struct StoreArgs {
    /// Keep documents in process memory instead of GitHub (nothing is persisted)
    #[arg(long)]
    pub in_memory: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the kanban UI and JSON API
    Serve {
        /// Port to serve on
        #[arg(short, long, env = "PORT", default_value = "3000")]
        port: u16,

        /// Open a browser once the server is up
        #[arg(long)]
        open: bool,

        /// Enable dev mode (permissive CORS, bind on all interfaces)
        #[arg(long)]
        dev: bool,

        #[command(flatten)]
        store: StoreArgs,
    },
    /// Create the kanban and accomplishments documents if they are missing
    Init {
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Print a summary of both boards and the latest accomplishments
    Show {
        /// Print the raw JSON snapshot instead of a summary
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        store: StoreArgs,
    },
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_env("KANBAN_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match &cli.command {
        Commands::Serve {
            port,
            open,
            dev,
            store,
        } => cmd::cmd_serve(*port, *open, *dev, store).await?,
        Commands::Init { store } => cmd::cmd_init(store).await?,
        Commands::Show { json, store } => cmd::cmd_show(*json, store).await?,
    }

    Ok(())
}
