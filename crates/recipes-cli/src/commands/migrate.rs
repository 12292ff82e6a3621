//! Database migration command.

use recipes_core::config::AppConfig;
use recipes_core::error::AppError;

use crate::output;

/// Apply all pending migrations, including the seeded roles.
pub async fn execute(config: &AppConfig) -> Result<(), AppError> {
    let pool = super::create_db_pool(config).await?;

    println!("Running database migrations...");
    recipes_database::migration::run_migrations(&pool).await?;
    output::print_success("All migrations applied successfully.");

    pool.close().await;
    Ok(())
}
