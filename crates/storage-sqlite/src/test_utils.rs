//! Temp-file databases for repository tests.

use std::sync::Arc;

use tempfile::TempDir;

use crate::db::{create_pool, prepare_database_file, run_migrations, spawn_writer, DbPool, WriteHandle};

/// A migrated database in a temp dir. Keep the `TempDir` alive for the test's duration.
pub(crate) fn setup_db() -> (Arc<DbPool>, WriteHandle, TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");
    let db_path = db_path.to_string_lossy().to_string();

    prepare_database_file(&db_path).expect("Failed to init database");
    let pool = create_pool(&db_path).expect("Failed to create pool");
    run_migrations(&pool).expect("Failed to run migrations");
    let writer = spawn_writer((*pool).clone());
    (pool, writer, temp_dir)
}
