//! `showroom` - operator commands for the Showroom app.
//!
//! ```bash
//! showroom migrate
//! showroom sessions list --shop gallery.myshopify.com
//! showroom sessions revoke --shop gallery.myshopify.com
//! ```
//!
//! Every command reads `SHOWROOM_DATABASE_URL` (or `DATABASE_URL`), from a
//! `.env` file if present.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "showroom", author, version, about = "Showroom CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending database migrations
    Migrate,
    /// Inspect or revoke stored Shopify sessions
    #[command(subcommand)]
    Sessions(SessionsCommand),
}

#[derive(Subcommand)]
enum SessionsCommand {
    /// Show the stored sessions of a shop
    List {
        /// Shop domain (e.g. `gallery.myshopify.com`)
        #[arg(short, long)]
        shop: String,
    },
    /// Delete the stored sessions of a shop, forcing OAuth on next launch
    Revoke {
        #[arg(short, long)]
        shop: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    match Cli::parse().command.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            ExitCode::FAILURE
        }
    }
}

impl Command {
    #[allow(clippy::print_stdout)]
    async fn run(self) -> Result<(), CommandError> {
        match self {
            Self::Migrate => commands::migrate::run().await,
            Self::Sessions(SessionsCommand::List { shop }) => {
                for line in commands::sessions::list(&shop).await? {
                    println!("{line}");
                }
                Ok(())
            }
            Self::Sessions(SessionsCommand::Revoke { shop }) => {
                let deleted = commands::sessions::revoke(&shop).await?;
                tracing::info!(%shop, deleted, "Sessions revoked");
                Ok(())
            }
        }
    }
}
