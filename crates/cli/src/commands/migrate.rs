//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! showroom migrate
//! ```
//!
//! # Environment Variables
//!
//! - `SHOWROOM_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! `crates/app/migrations/`, embedded at compile time.

use super::{CommandError, connect};

/// Run the app's database migrations.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../app/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
