#[cfg(test)]
mod repository_tests {
    use crate::models::{Category, MenuItemDraft, RepositoryError};
    use crate::observability::Metrics;
    use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
    use std::sync::Arc;

    use crate::repositories::menu_item_repository::*;
    use crate::repositories::schema_manager::*;

    const TABLE: &str = "menu_items";

    async fn create_test_pool() -> SqlitePool {
        // A single connection keeps every query on the same in-memory database
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    async fn create_test_repository() -> SqliteMenuItemRepository {
        let pool = create_test_pool().await;
        SchemaManager::new(pool.clone())
            .create_menu_table(TABLE)
            .await
            .unwrap();
        SqliteMenuItemRepository::new(pool, TABLE.to_string())
    }

    fn cafe() -> MenuItemDraft {
        MenuItemDraft::new("Café", 4.5, Category::Beverage)
    }

    fn coxinha() -> MenuItemDraft {
        MenuItemDraft::new("Coxinha", 7.0, Category::Food)
    }

    #[tokio::test]
    async fn test_create_assigns_increasing_ids() {
        let repo = create_test_repository().await;

        let first = repo
            .create(cafe(), "static/uploads/a_cafe.png".to_string())
            .await
            .unwrap();
        let second = repo
            .create(coxinha(), "static/uploads/b_coxinha.png".to_string())
            .await
            .unwrap();

        assert!(second.id > first.id);
        assert_eq!(first.name, "Café");
        assert_eq!(first.category, Category::Beverage);
        assert_eq!(repo.find_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_find_by_id_round_trip() {
        let repo = create_test_repository().await;
        let created = repo
            .create(cafe(), "static/uploads/a_cafe.png".to_string())
            .await
            .unwrap();

        let found = repo.find_by_id(created.id).await.unwrap();
        assert_eq!(found, Some(created));

        assert_eq!(repo.find_by_id(9999).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_find_all_in_id_order() {
        let repo = create_test_repository().await;
        for draft in [cafe(), coxinha(), cafe()] {
            repo.create(draft, "static/uploads/x.png".to_string())
                .await
                .unwrap();
        }

        let items = repo.find_all().await.unwrap();
        let ids: Vec<i64> = items.iter().map(|i| i.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
        assert_eq!(items.len(), 3);
    }

    #[tokio::test]
    async fn test_update_overwrites_fields() {
        let repo = create_test_repository().await;
        let mut item = repo
            .create(cafe(), "static/uploads/a.png".to_string())
            .await
            .unwrap();

        item.apply(coxinha(), "static/uploads/b.png".to_string());
        let updated = repo.update(item.clone()).await.unwrap();
        assert_eq!(updated, item);

        let found = repo.find_by_id(item.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Coxinha");
        assert_eq!(found.category, Category::Food);
        assert_eq!(found.image_path, "static/uploads/b.png");
    }

    #[tokio::test]
    async fn test_update_missing_row_is_not_found() {
        let repo = create_test_repository().await;
        let mut ghost = repo
            .create(cafe(), "static/uploads/a.png".to_string())
            .await
            .unwrap();
        repo.delete(ghost.id).await.unwrap();

        ghost.name = "Fantasma".to_string();
        let result = repo.update(ghost).await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = create_test_repository().await;
        let item = repo
            .create(cafe(), "static/uploads/a.png".to_string())
            .await
            .unwrap();

        repo.delete(item.id).await.unwrap();
        assert_eq!(repo.find_by_id(item.id).await.unwrap(), None);
        assert!(repo.find_all().await.unwrap().is_empty());

        assert!(matches!(
            repo.delete(item.id).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_constraint_violation_on_long_name() {
        let repo = create_test_repository().await;
        let draft = MenuItemDraft::new("x".repeat(150), 1.0, Category::Food);

        let result = repo.create(draft, "static/uploads/a.png".to_string()).await;
        assert!(matches!(
            result,
            Err(RepositoryError::ConstraintViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_rows_with_unknown_category_are_skipped() {
        let pool = create_test_pool().await;
        // Legacy layout without the category check
        sqlx::query(
            "CREATE TABLE legacy (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, \
             price REAL NOT NULL, category TEXT NOT NULL, image_path TEXT NOT NULL)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO legacy (name, price, category, image_path) VALUES \
             ('Bolo', 5.0, '1', 'a.png'), ('Mistério', 1.0, '9', 'b.png')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let repo = SqliteMenuItemRepository::new(pool, "legacy".to_string());

        let items = repo.find_all().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Bolo");

        assert_eq!(repo.find_by_id(2).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_schema_manager_is_idempotent() {
        let pool = create_test_pool().await;
        let manager = SchemaManager::new(pool.clone());

        manager.create_menu_table(TABLE).await.unwrap();
        manager.create_menu_table(TABLE).await.unwrap();

        let repo = SqliteMenuItemRepository::new(pool, TABLE.to_string());
        repo.create(cafe(), "static/uploads/a.png".to_string())
            .await
            .unwrap();

        // Running it again keeps existing rows
        manager.create_menu_table(TABLE).await.unwrap();
        assert_eq!(repo.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_category_check_rejects_unknown_codes() {
        let pool = create_test_pool().await;
        SchemaManager::new(pool.clone())
            .create_menu_table(TABLE)
            .await
            .unwrap();

        let result = sqlx::query(
            "INSERT INTO menu_items (name, price, category, image_path) VALUES ('X', 1.0, '9', 'x.png')",
        )
        .execute(&pool)
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_repository_records_database_metrics() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let repo = create_test_repository()
            .await
            .with_metrics(metrics.clone());

        repo.find_all().await.unwrap();

        let encoded = metrics.encode().unwrap();
        assert!(encoded.contains("database_operations_total"));
        assert!(encoded.contains("select_all"));
    }
}
