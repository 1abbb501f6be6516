// Repositories module - data access layer

pub mod menu_item_repository;
pub mod schema_manager;

#[cfg(test)]
mod tests;

pub use menu_item_repository::{MenuItemRepository, SqliteMenuItemRepository};
pub use schema_manager::{connect_pool, SchemaManager};
