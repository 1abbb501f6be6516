use axum::response::Html;
use serde::Serialize;
use std::path::Path;
use tera::{Context, Tera};
use thiserror::Error;
use tracing::{error, info};

use crate::models::{Category, MenuItem};

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("Failed to load templates from {dir}: {source}")]
    Load {
        dir: String,
        #[source]
        source: tera::Error,
    },

    #[error("Failed to render view {view}: {source}")]
    Render {
        view: String,
        #[source]
        source: tera::Error,
    },
}

/// Named HTML views rendered from a template directory
#[derive(Debug, Clone)]
pub struct Views {
    tera: Tera,
}

impl Views {
    /// Load every `*.html.tera` file under `templates_dir`
    pub fn new(templates_dir: impl AsRef<Path>) -> Result<Self, ViewError> {
        let dir = templates_dir.as_ref().display().to_string();
        let glob = format!("{}/**/*.html.tera", dir.trim_end_matches('/'));

        let mut tera = Tera::new(&glob).map_err(|source| ViewError::Load {
            dir: dir.clone(),
            source,
        })?;
        tera.autoescape_on(vec![".html.tera", ".html"]);

        info!(
            templates = tera.get_template_names().count(),
            dir = %dir,
            "Templates loaded"
        );
        Ok(Self { tera })
    }

    /// Render a view by name, e.g. `"cardapio"` for `cardapio.html.tera`
    pub fn render(&self, view: &str, context: &Context) -> Result<Html<String>, ViewError> {
        let template = format!("{}.html.tera", view);
        self.tera
            .render(&template, context)
            .map(Html)
            .map_err(|source| {
                error!(view = %view, error = ?source, "Template rendering failed");
                ViewError::Render {
                    view: view.to_string(),
                    source,
                }
            })
    }

    pub fn has_view(&self, view: &str) -> bool {
        let template = format!("{}.html.tera", view);
        self.tera.get_template_names().any(|name| name == template)
    }
}

/// Display model for one menu item in a template
#[derive(Debug, Clone, Serialize)]
pub struct ItemCard {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub price_label: String,
    pub category: Category,
    pub category_code: &'static str,
    pub category_label: &'static str,
    pub image_url: String,
}

impl ItemCard {
    pub fn new(item: &MenuItem, assets_base_url: &str) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            price: item.price,
            price_label: format_price(item.price),
            category: item.category,
            category_code: item.category.code(),
            category_label: item.category.label(),
            image_url: item.image_url(assets_base_url),
        }
    }

    pub fn from_items(items: &[MenuItem], assets_base_url: &str) -> Vec<Self> {
        items
            .iter()
            .map(|item| Self::new(item, assets_base_url))
            .collect()
    }
}

/// Option entry for the category select
#[derive(Debug, Clone, Serialize)]
pub struct CategoryOption {
    pub code: &'static str,
    pub label: &'static str,
}

pub fn category_options() -> Vec<CategoryOption> {
    Category::ALL
        .iter()
        .map(|category| CategoryOption {
            code: category.code(),
            label: category.label(),
        })
        .collect()
}

/// Brazilian currency label, e.g. `R$ 4,50`
pub fn format_price(price: f64) -> String {
    let formatted = format!("{:.2}", price.abs()).replace('.', ",");
    if price < 0.0 {
        format!("-R$ {}", formatted)
    } else {
        format!("R$ {}", formatted)
    }
}
