//! Stockroom CLI - database migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply schema and session-table migrations
//! stockroom migrate
//!
//! # Create an admin account
//! stockroom admin create -u alice -n "Alice Admin"
//!
//! # Load categories and products from YAML
//! stockroom seed crates/cli/seed/catalog.yaml
//! ```
//!
//! # Environment Variables
//!
//! - `STOCKROOM_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - `STOCKROOM_NEW_ADMIN_PASSWORD` - password for `admin create`; generated when unset

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "stockroom")]
#[command(author, version, about = "Stockroom operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations (schema and session store)
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Load categories and products from a YAML file
    Seed {
        /// Path to the seed file
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user
    Create {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Display name
        #[arg(short, long, default_value = "")]
        name: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create { username, name } => {
                commands::admin::create_user(&username, &name).await?;
            }
        },
        Commands::Seed { file } => {
            commands::seed::catalog(&file).await?;
        }
    }
    Ok(())
}
