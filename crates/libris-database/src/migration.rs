//! Schema migrations embedded from the workspace `migrations/` directory.

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::info;

use libris_core::error::{AppError, ErrorKind};
use libris_core::result::AppResult;

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Apply every migration the database has not seen yet.
pub async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    info!(
        known = MIGRATOR.iter().count(),
        latest = latest_version().unwrap_or_default(),
        "Applying schema migrations"
    );

    MIGRATOR.run(pool).await.map_err(|e| {
        AppError::with_source(ErrorKind::Database, "Failed to apply schema migrations", e)
    })?;

    info!("Schema is up to date");
    Ok(())
}

/// Version of the newest embedded migration.
pub fn latest_version() -> Option<i64> {
    MIGRATOR.iter().map(|m| m.version).max()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_migrations_are_ordered() {
        let versions: Vec<i64> = MIGRATOR.iter().map(|m| m.version).collect();
        assert!(!versions.is_empty());
        assert!(versions.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(latest_version(), versions.last().copied());
    }
}
