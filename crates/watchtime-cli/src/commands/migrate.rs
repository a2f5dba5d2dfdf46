//! Catalog migration command.

use watchtime_core::AppError;
use watchtime_core::config::AppConfig;
use watchtime_database::DatabasePool;
use watchtime_database::migration::run_migrations;

use crate::output;

/// Apply pending migrations to the configured catalog database.
pub async fn execute(config: &AppConfig) -> Result<(), AppError> {
    if config.catalog.provider != "postgres" {
        output::print_warning("Catalog provider is not 'postgres'; nothing to migrate.");
        return Ok(());
    }

    println!("Running catalog migrations...");
    let db = DatabasePool::connect(&config.database).await?;
    run_migrations(db.pool()).await?;
    db.close().await;
    output::print_success("All migrations applied successfully.");
    Ok(())
}
