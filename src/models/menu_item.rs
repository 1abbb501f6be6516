use serde::{Deserialize, Serialize};

use super::Category;

/// A single catalog record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub category: Category,
    pub image_path: String,
}

/// The mutable fields of a menu item, without the image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItemDraft {
    pub name: String,
    pub price: f64,
    pub category: Category,
}

/// Response model with a resolved image URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItemResponse {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub category: Category,
    pub category_code: String,
    pub image_path: String,
    pub image_url: String,
}

/// Public menu split by category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuView {
    pub foods: Vec<MenuItem>,
    pub beverages: Vec<MenuItem>,
}

/// Route under which uploaded images are served
pub const UPLOADS_ROUTE: &str = "/uploads";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuViewResponse {
    pub foods: Vec<MenuItemResponse>,
    pub beverages: Vec<MenuItemResponse>,
}

impl MenuItemDraft {
    pub fn new(name: impl Into<String>, price: f64, category: Category) -> Self {
        Self {
            name: name.into(),
            price,
            category,
        }
        .normalized()
    }

    /// Surrounding whitespace is not part of a stored name
    pub fn normalized(mut self) -> Self {
        let trimmed = self.name.trim();
        if trimmed.len() != self.name.len() {
            self.name = trimmed.to_string();
        }
        self
    }
}

impl MenuItem {
    /// Build a record from a draft once the row id and image path are known
    pub fn from_draft(id: i64, draft: MenuItemDraft, image_path: String) -> Self {
        Self {
            id,
            name: draft.name,
            price: draft.price,
            category: draft.category,
            image_path,
        }
    }

    /// Overwrite the four mutable fields; `id` is left untouched
    pub fn apply(&mut self, draft: MenuItemDraft, image_path: String) {
        self.name = draft.name;
        self.price = draft.price;
        self.category = draft.category;
        self.image_path = image_path;
    }

    pub fn draft(&self) -> MenuItemDraft {
        MenuItemDraft {
            name: self.name.clone(),
            price: self.price,
            category: self.category,
        }
    }

    /// File name of the stored image, without its directory
    pub fn image_file_name(&self) -> &str {
        self.image_path
            .rsplit(|c| c == '/' || c == '\\')
            .next()
            .unwrap_or_default()
    }

    /// Public URL of the image: the uploads route on this server, or on `assets_base_url` when set.
    /// Only the file name is used, so the upload directory may live anywhere on disk.
    pub fn image_url(&self, assets_base_url: &str) -> String {
        let base = assets_base_url.trim_end_matches('/');
        format!("{}{}/{}", base, UPLOADS_ROUTE, self.image_file_name())
    }

    pub fn to_response(&self, assets_base_url: &str) -> MenuItemResponse {
        MenuItemResponse {
            id: self.id,
            name: self.name.clone(),
            price: self.price,
            category: self.category,
            category_code: self.category.code().to_string(),
            image_path: self.image_path.clone(),
            image_url: self.image_url(assets_base_url),
        }
    }
}

impl MenuView {
    /// Partition items by category, preserving their relative order
    pub fn from_items(items: Vec<MenuItem>) -> Self {
        let (foods, beverages) = items
            .into_iter()
            .partition(|item| item.category == Category::Food);
        Self { foods, beverages }
    }

    pub fn len(&self) -> usize {
        self.foods.len() + self.beverages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.foods.is_empty() && self.beverages.is_empty()
    }

    pub fn to_response(&self, assets_base_url: &str) -> MenuViewResponse {
        MenuViewResponse {
            foods: self
                .foods
                .iter()
                .map(|item| item.to_response(assets_base_url))
                .collect(),
            beverages: self
                .beverages
                .iter()
                .map(|item| item.to_response(assets_base_url))
                .collect(),
        }
    }
}

/// One item with a chosen quantity, as shown on the cart page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartLine {
    pub item: MenuItem,
    pub quantity: u32,
    pub subtotal: f64,
}

impl CartLine {
    pub fn new(item: MenuItem, quantity: u32) -> Self {
        let subtotal = item.price * f64::from(quantity);
        Self {
            item,
            quantity,
            subtotal,
        }
    }
}
