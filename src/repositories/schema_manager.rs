use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{error, info, instrument};

use crate::models::{RepositoryError, RepositoryResult, MAX_IMAGE_PATH_LENGTH, MAX_ITEM_NAME_LENGTH};

/// Open a SQLite pool, creating the database file when it does not exist yet
pub async fn connect_pool(database_url: &str, max_connections: u32) -> RepositoryResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| {
            error!("Invalid database URL: {}", e);
            RepositoryError::ConnectionFailed
        })?
        .create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .map_err(|e| {
            error!("Failed to open database pool: {}", e);
            RepositoryError::ConnectionFailed
        })
}

/// Creates the menu table at start-up
pub struct SchemaManager {
    pool: SqlitePool,
}

impl SchemaManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the menu table if it doesn't exist
    #[instrument(skip(self))]
    pub async fn create_menu_table(&self, table_name: &str) -> RepositoryResult<()> {
        info!("Ensuring menu table exists");

        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL CHECK (length(name) <= {name_max}),
                price REAL NOT NULL,
                category TEXT NOT NULL CHECK (category IN ('1', '2')),
                image_path TEXT NOT NULL CHECK (length(image_path) <= {path_max})
            )",
            table = table_name,
            name_max = MAX_ITEM_NAME_LENGTH,
            path_max = MAX_IMAGE_PATH_LENGTH,
        );

        sqlx::query(&sql).execute(&self.pool).await?;

        info!("Menu table ready");
        Ok(())
    }
}
