use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn, Instrument};

use crate::models::{Category, MenuItem, MenuItemDraft, RepositoryError, RepositoryResult};
use crate::observability::Metrics;

/// Trait defining the interface for menu item data access operations
#[async_trait]
pub trait MenuItemRepository: Send + Sync {
    /// Find all items in primary-key order
    async fn find_all(&self) -> RepositoryResult<Vec<MenuItem>>;

    /// Find an item by its ID
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<MenuItem>>;

    /// Insert a new row and return it with its assigned ID
    async fn create(&self, draft: MenuItemDraft, image_path: String) -> RepositoryResult<MenuItem>;

    /// Overwrite an existing row; `NotFound` if the ID is gone
    async fn update(&self, item: MenuItem) -> RepositoryResult<MenuItem>;

    /// Delete a row; `NotFound` if the ID is gone
    async fn delete(&self, id: i64) -> RepositoryResult<()>;
}

/// SQLite implementation of the MenuItemRepository trait
pub struct SqliteMenuItemRepository {
    pool: SqlitePool,
    table_name: String,
    metrics: Option<Arc<Metrics>>,
}

impl SqliteMenuItemRepository {
    /// Create a new SQLite menu item repository
    pub fn new(pool: SqlitePool, table_name: String) -> Self {
        Self {
            pool,
            table_name,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    fn create_sqlite_span(&self, operation: &str) -> tracing::Span {
        tracing::info_span!(
            "SQLite",
            "db.system" = "sqlite",
            "db.name" = %self.table_name,
            "db.operation" = operation,
            "otel.kind" = "client",
            "otel.name" = format!("SQLite.{}", operation),
        )
    }

    /// Run a statement inside a client span and record its outcome
    async fn observe<T, F>(&self, operation: &str, future: F) -> RepositoryResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        let start_time = Instant::now();
        let result = future
            .instrument(self.create_sqlite_span(operation))
            .await
            .map_err(RepositoryError::from);

        if let Some(metrics) = &self.metrics {
            metrics.record_database_operation(
                operation,
                &self.table_name,
                result.is_ok(),
                start_time.elapsed().as_secs_f64(),
            );
        }

        result
    }

    /// Convert a table row into a MenuItem
    pub fn row_to_item(row: &SqliteRow) -> RepositoryResult<MenuItem> {
        let id: i64 = row.try_get("id")?;
        let code: String = row.try_get("category")?;
        let category = Category::from_code(&code).ok_or_else(|| RepositoryError::InvalidRecord {
            id,
            reason: format!("unrecognized category code '{}'", code),
        })?;

        Ok(MenuItem {
            id,
            name: row.try_get("name")?,
            price: row.try_get("price")?,
            category,
            image_path: row.try_get("image_path")?,
        })
    }

    /// Convert rows, skipping records whose category code is outside the known set
    fn rows_to_items(rows: &[SqliteRow]) -> RepositoryResult<Vec<MenuItem>> {
        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            match Self::row_to_item(row) {
                Ok(item) => items.push(item),
                Err(RepositoryError::InvalidRecord { id, reason }) => {
                    warn!(id, reason = %reason, "Skipping menu item with invalid record");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(items)
    }
}

#[async_trait]
impl MenuItemRepository for SqliteMenuItemRepository {
    #[instrument(skip(self), fields(table = %self.table_name))]
    async fn find_all(&self) -> RepositoryResult<Vec<MenuItem>> {
        info!("Finding all menu items");

        let sql = format!(
            "SELECT id, name, price, category, image_path FROM {} ORDER BY id",
            self.table_name
        );
        let rows = self
            .observe("select_all", sqlx::query(&sql).fetch_all(&self.pool))
            .await?;

        let items = Self::rows_to_items(&rows)?;
        info!("Found {} menu items", items.len());
        Ok(items)
    }

    #[instrument(skip(self), fields(table = %self.table_name, id = %id))]
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<MenuItem>> {
        info!("Finding menu item by ID");

        let sql = format!(
            "SELECT id, name, price, category, image_path FROM {} WHERE id = ?",
            self.table_name
        );
        let row = self
            .observe(
                "select_by_id",
                sqlx::query(&sql).bind(id).fetch_optional(&self.pool),
            )
            .await?;

        match row {
            Some(row) => match Self::row_to_item(&row) {
                Ok(item) => {
                    info!("Menu item found");
                    Ok(Some(item))
                }
                Err(RepositoryError::InvalidRecord { reason, .. }) => {
                    warn!(reason = %reason, "Menu item has an invalid record, treating as absent");
                    Ok(None)
                }
                Err(e) => Err(e),
            },
            None => {
                info!("Menu item not found");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, draft), fields(table = %self.table_name, name = %draft.name))]
    async fn create(&self, draft: MenuItemDraft, image_path: String) -> RepositoryResult<MenuItem> {
        info!("Creating new menu item");

        let sql = format!(
            "INSERT INTO {} (name, price, category, image_path) VALUES (?, ?, ?, ?)",
            self.table_name
        );
        let result = self
            .observe(
                "insert",
                sqlx::query(&sql)
                    .bind(&draft.name)
                    .bind(draft.price)
                    .bind(draft.category.code())
                    .bind(&image_path)
                    .execute(&self.pool),
            )
            .await?;

        let item = MenuItem::from_draft(result.last_insert_rowid(), draft, image_path);
        info!(id = item.id, "Menu item created successfully");
        Ok(item)
    }

    #[instrument(skip(self, item), fields(table = %self.table_name, id = %item.id))]
    async fn update(&self, item: MenuItem) -> RepositoryResult<MenuItem> {
        info!("Updating menu item");

        let sql = format!(
            "UPDATE {} SET name = ?, price = ?, category = ?, image_path = ? WHERE id = ?",
            self.table_name
        );
        let result = self
            .observe(
                "update",
                sqlx::query(&sql)
                    .bind(&item.name)
                    .bind(item.price)
                    .bind(item.category.code())
                    .bind(&item.image_path)
                    .bind(item.id)
                    .execute(&self.pool),
            )
            .await?;

        if result.rows_affected() == 0 {
            warn!("Menu item vanished before update");
            return Err(RepositoryError::NotFound);
        }

        info!("Menu item updated successfully");
        Ok(item)
    }

    #[instrument(skip(self), fields(table = %self.table_name, id = %id))]
    async fn delete(&self, id: i64) -> RepositoryResult<()> {
        info!("Deleting menu item");

        let sql = format!("DELETE FROM {} WHERE id = ?", self.table_name);
        let result = self
            .observe("delete", sqlx::query(&sql).bind(id).execute(&self.pool))
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        info!("Menu item deleted successfully");
        Ok(())
    }
}
