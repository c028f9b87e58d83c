//! Embedded schema migrations, applied at startup.

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

/// Migrations from `backend/migrations`, compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Failure to connect or to apply a migration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("database migration failed: {message}")]
pub struct MigrationError {
    message: String,
}

impl MigrationError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Apply every pending migration to `database_url`.
///
/// Diesel's migration harness is synchronous, so the work runs on the
/// blocking pool with its own short-lived connection.
///
/// # Errors
///
/// [`MigrationError`] when the connection, a migration, or the blocking
/// task fails.
pub async fn run_pending_migrations(database_url: &str) -> Result<usize, MigrationError> {
    let url = database_url.to_owned();
    let applied = tokio::task::spawn_blocking(move || {
        let mut conn = PgConnection::establish(&url)
            .map_err(|err| MigrationError::new(format!("connect: {err}")))?;
        conn.run_pending_migrations(MIGRATIONS)
            .map(|versions| versions.len())
            .map_err(|err| MigrationError::new(err.to_string()))
    })
    .await
    .map_err(|err| MigrationError::new(format!("migration task: {err}")))??;

    info!(applied, "database migrations applied");
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use diesel::migration::MigrationSource;
    use diesel::pg::Pg;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn migrations_are_embedded_in_order() {
        let migrations = MigrationSource::<Pg>::migrations(&MIGRATIONS).expect("embedded");
        let names: Vec<String> = migrations
            .iter()
            .map(|migration| migration.name().to_string())
            .collect();

        assert_eq!(names.len(), 2);
        assert!(names.first().is_some_and(|name| name.ends_with("create_game_tables")));
        assert!(names.last().is_some_and(|name| name.ends_with("create_problem_library")));
    }
}
