use std::sync::Arc;
use tracing::instrument;

use crate::models::{
    validate_cart_quantity, validate_image_path, validate_image_upload, CartLine, ImageUpload,
    MenuItem, MenuItemDraft, MenuView, RepositoryError, ServiceError, ServiceResult, StorageResult,
    Validate,
};
use crate::observability::Metrics;
use crate::repositories::MenuItemRepository;
use crate::storage::{ImageStore, StagedImage};

/// Catalog operations over the menu table and the uploaded image files
pub struct MenuService {
    repository: Arc<dyn MenuItemRepository>,
    image_store: Arc<dyn ImageStore>,
    allowed_extensions: Vec<String>,
    metrics: Option<Arc<Metrics>>,
}

impl MenuService {
    pub fn new(
        repository: Arc<dyn MenuItemRepository>,
        image_store: Arc<dyn ImageStore>,
        allowed_extensions: Vec<String>,
    ) -> Self {
        Self {
            repository,
            image_store,
            allowed_extensions,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    /// Register a new item together with its image
    ///
    /// The image is staged first, then the row is inserted with the final
    /// path, then the staged file is moved into place. A failed insert
    /// discards the staged file; a failed move deletes the new row again.
    #[instrument(skip(self, draft, image), fields(name = %draft.name, category = %draft.category))]
    pub async fn create_item(
        &self,
        draft: MenuItemDraft,
        image: ImageUpload,
    ) -> ServiceResult<MenuItem> {
        crate::info_with_trace!("Creating menu item");

        let category = draft.category;
        let result = self.create_item_inner(draft, image).await;
        self.record("create", Some(category.to_string().as_str()), result.is_ok());

        if let Ok(item) = &result {
            crate::info_with_trace!(id = item.id, image_path = %item.image_path, "Menu item created");
        }
        result
    }

    async fn create_item_inner(
        &self,
        draft: MenuItemDraft,
        image: ImageUpload,
    ) -> ServiceResult<MenuItem> {
        let draft = draft.normalized();
        draft.validate()?;
        validate_image_upload(&image, &self.allowed_extensions)?;

        let staged = self.stage_image(&image).await?;
        if let Err(e) = validate_image_path(&staged.image_path) {
            self.discard_image(&staged).await;
            return Err(e.into());
        }

        let item = match self
            .repository
            .create(draft, staged.image_path.clone())
            .await
        {
            Ok(item) => item,
            Err(e) => {
                crate::warn_with_trace!(error = %e, "Insert failed, discarding staged image");
                self.discard_image(&staged).await;
                return Err(e.into());
            }
        };

        if let Err(e) = self.commit_image(&staged).await {
            crate::warn_with_trace!(id = item.id, error = %e, "Image move failed, removing inserted row");
            if let Err(delete_err) = self.repository.delete(item.id).await {
                crate::error_with_trace!(
                    id = item.id,
                    error = %delete_err,
                    "Storage inconsistency: row kept without its image"
                );
            }
            self.discard_image(&staged).await;
            return Err(e.into());
        }

        Ok(item)
    }

    /// List every item
    #[instrument(skip(self))]
    pub async fn list_items(&self) -> ServiceResult<Vec<MenuItem>> {
        crate::info_with_trace!("Listing menu items");

        let result = self.repository.find_all().await;
        self.record("list", None, result.is_ok());

        let items = result?;
        if let Some(metrics) = &self.metrics {
            metrics.set_menu_items(items.len());
        }

        crate::info_with_trace!("Found {} menu items", items.len());
        Ok(items)
    }

    /// Get a specific item by ID
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_item(&self, id: i64) -> ServiceResult<MenuItem> {
        crate::info_with_trace!("Retrieving menu item");

        match self.repository.find_by_id(id).await? {
            Some(item) => Ok(item),
            None => {
                crate::warn_with_trace!("Menu item not found");
                Err(ServiceError::ItemNotFound { id })
            }
        }
    }

    /// Overwrite the mutable fields and the image of an existing item
    ///
    /// The previous image file is left on disk.
    #[instrument(skip(self, draft, image), fields(id = %id, name = %draft.name))]
    pub async fn update_item(
        &self,
        id: i64,
        draft: MenuItemDraft,
        image: ImageUpload,
    ) -> ServiceResult<MenuItem> {
        crate::info_with_trace!("Updating menu item");

        let category = draft.category;
        let result = self.update_item_inner(id, draft, image).await;
        self.record("update", Some(category.to_string().as_str()), result.is_ok());

        if result.is_ok() {
            crate::info_with_trace!("Menu item updated");
        }
        result
    }

    async fn update_item_inner(
        &self,
        id: i64,
        draft: MenuItemDraft,
        image: ImageUpload,
    ) -> ServiceResult<MenuItem> {
        let previous = self.get_item(id).await?;
        let draft = draft.normalized();

        draft.validate()?;
        validate_image_upload(&image, &self.allowed_extensions)?;

        let staged = self.stage_image(&image).await?;
        if let Err(e) = validate_image_path(&staged.image_path) {
            self.discard_image(&staged).await;
            return Err(e.into());
        }

        let mut item = previous.clone();
        item.apply(draft, staged.image_path.clone());

        let updated = match self.repository.update(item).await {
            Ok(updated) => updated,
            Err(e) => {
                self.discard_image(&staged).await;
                return Err(match e {
                    RepositoryError::NotFound => ServiceError::ItemNotFound { id },
                    other => other.into(),
                });
            }
        };

        if let Err(e) = self.commit_image(&staged).await {
            crate::warn_with_trace!(error = %e, "Image move failed, restoring previous row");
            if let Err(restore_err) = self.repository.update(previous).await {
                crate::error_with_trace!(
                    error = %restore_err,
                    "Storage inconsistency: row points at a missing image"
                );
            }
            self.discard_image(&staged).await;
            return Err(e.into());
        }

        Ok(updated)
    }

    /// Delete an item; its image file stays on disk
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete_item(&self, id: i64) -> ServiceResult<()> {
        crate::info_with_trace!("Deleting menu item");

        let result = match self.repository.delete(id).await {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(ServiceError::ItemNotFound { id }),
            Err(e) => Err(e.into()),
        };
        self.record("delete", None, result.is_ok());

        if result.is_ok() {
            crate::info_with_trace!("Menu item deleted");
        } else if let Err(ServiceError::ItemNotFound { .. }) = &result {
            crate::warn_with_trace!("Menu item not found");
        }
        result
    }

    /// Partition all items into foods and beverages
    #[instrument(skip(self))]
    pub async fn menu_view(&self) -> ServiceResult<MenuView> {
        let view = MenuView::from_items(self.list_items().await?);
        crate::info_with_trace!(
            foods = view.foods.len(),
            beverages = view.beverages.len(),
            "Menu view built"
        );
        Ok(view)
    }

    /// One item with a quantity, for the cart page
    #[instrument(skip(self), fields(id = %id, quantity = %quantity))]
    pub async fn cart_line(&self, id: i64, quantity: u32) -> ServiceResult<CartLine> {
        validate_cart_quantity(quantity)?;
        let item = self.get_item(id).await?;
        Ok(CartLine::new(item, quantity))
    }

    async fn stage_image(&self, image: &ImageUpload) -> StorageResult<StagedImage> {
        let result = self.image_store.stage(image).await;
        self.record_image("stage", result.is_ok());
        result
    }

    async fn commit_image(&self, staged: &StagedImage) -> StorageResult<()> {
        let result = self.image_store.commit(staged).await;
        self.record_image("commit", result.is_ok());
        result
    }

    async fn discard_image(&self, staged: &StagedImage) {
        let result = self.image_store.discard(staged).await;
        self.record_image("discard", result.is_ok());
        if let Err(e) = result {
            crate::error_with_trace!(
                staging_path = %staged.staging_path.display(),
                error = %e,
                "Storage inconsistency: staged image could not be removed"
            );
        }
    }

    fn record(&self, operation: &str, category: Option<&str>, success: bool) {
        if let Some(metrics) = &self.metrics {
            metrics.record_menu_operation(operation, category, success);
        }
    }

    fn record_image(&self, operation: &str, success: bool) {
        if let Some(metrics) = &self.metrics {
            metrics.record_image_store_operation(operation, success);
        }
    }
}
