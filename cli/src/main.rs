mod commands;
mod util;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::session::SessionCommands;

#[derive(Parser)]
#[command(
    name = "dost",
    version,
    about = "Dost CLI: crisis keyword detection and escalation for wellness chat"
)]
struct Cli {
    /// API base URL
    #[arg(long, env = "DOST_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    /// Compact JSON output
    #[arg(long, global = true)]
    raw: bool,

    /// Log detection events to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check API health
    Health,
    /// Scan a single message offline and print the detection and action
    Scan {
        message: String,
        /// Matches already counted in this session
        #[arg(long, default_value_t = 0)]
        match_count: u32,
        /// Time of the previous match (RFC3339)
        #[arg(long)]
        last_match_at: Option<String>,
    },
    /// Show the trigger phrases, grouped by category
    Keywords {
        /// Only this category (e.g. self_harm)
        #[arg(long)]
        category: Option<String>,
    },
    /// Chat locally with the detector and escalation policy in-process
    Chat {
        /// Skip the simulated typing delay
        #[arg(long)]
        no_delay: bool,
    },
    /// Session operations against the API
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "dost_core=info,dost=info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let code = match cli.command {
        Commands::Health => commands::health::run(&cli.api_url, cli.raw).await,
        Commands::Scan {
            message,
            match_count,
            last_match_at,
        } => commands::scan::run(&message, match_count, last_match_at.as_deref(), cli.raw),
        Commands::Keywords { category } => commands::keywords::run(category.as_deref(), cli.raw),
        Commands::Chat { no_delay } => commands::chat::run(!no_delay).await,
        Commands::Session { command } => {
            commands::session::run(&cli.api_url, cli.raw, command).await
        }
    };

    std::process::exit(code);
}
