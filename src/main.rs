mod api;
mod cli;
mod config;
mod db;
mod error;
mod models;
mod services;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "wcpredict")]
#[command(about = "Prediction pool backend for the 48-team World Cup")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Initialize the database
    InitDb,
    /// Load the group-stage draw, fixtures and a demo user
    Seed {
        /// Wipe every table first
        #[arg(long)]
        reset: bool,
    },
    /// Show the group tables implied by a user's predictions
    Standings {
        #[arg(short, long)]
        user: String,
    },
    /// Recompute every point total from the recorded results
    Rescore,
    /// Print the leaderboard
    Leaderboard {
        /// Also write it to this CSV file
        #[arg(short, long)]
        export: Option<PathBuf>,
    },
    /// Query a team and its group fixtures
    Team {
        #[arg(short, long)]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { port }) => {
            tracing::info!("Starting World Cup predictor API on port {}", port);
            api::serve(config, port).await?;
        }
        Some(Commands::InitDb) => {
            tracing::info!("Initializing database...");
            db::init_database(&config.database_url).await?;
        }
        Some(Commands::Seed { reset }) => {
            cli::seed(&config, reset).await?;
        }
        Some(Commands::Standings { user }) => {
            cli::show_standings(&config, &user).await?;
        }
        Some(Commands::Rescore) => {
            cli::rescore(&config).await?;
        }
        Some(Commands::Leaderboard { export }) => {
            cli::leaderboard(&config, export.as_deref()).await?;
        }
        Some(Commands::Team { name }) => {
            tracing::info!("Querying team: {}", name);
            cli::query_team(&config, &name).await?;
        }
        None => {
            // Default to serving
            tracing::info!("Starting World Cup predictor API on port 3000");
            api::serve(config, 3000).await?;
        }
    }

    Ok(())
}
