use std::path::Path;

use tracing::debug;

/// Checked first so the binary works when launched from the workspace root.
const WORKSPACE_MIGRATIONS_DIR: &str = "server/migrations";
const CRATE_MIGRATIONS_DIR: &str = "./migrations";

fn migrations_dir() -> &'static Path {
    [WORKSPACE_MIGRATIONS_DIR, CRATE_MIGRATIONS_DIR]
        .into_iter()
        .map(Path::new)
        .find(|dir| dir.is_dir())
        .unwrap_or_else(|| Path::new(CRATE_MIGRATIONS_DIR))
}

/// Apply pending migrations (`river_details`, `river_levels`).
pub async fn run(pool: &sqlx::PgPool) -> Result<(), sqlx_core::migrate::MigrateError> {
    let dir = migrations_dir();
    let migrator = sqlx_core::migrate::Migrator::new(dir).await?;
    debug!(
        dir = %dir.display(),
        migrations = migrator.iter().count(),
        "applying river schema migrations"
    );
    migrator.run(pool).await
}
