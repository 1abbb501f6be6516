use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::models::{MenuItemResponse, MenuViewResponse, RepositoryError, ServiceError};
use crate::services::MenuService;

/// Shared state for the JSON endpoints
#[derive(Clone)]
pub struct ApiState {
    pub menu_service: Arc<MenuService>,
    pub assets_base_url: String,
}

/// List every item
#[instrument(name = "api_list_items", skip(state))]
pub async fn list_items(
    State(state): State<ApiState>,
) -> Result<Json<Vec<MenuItemResponse>>, (StatusCode, Json<Value>)> {
    match state.menu_service.list_items().await {
        Ok(items) => {
            info!("Successfully listed {} items", items.len());
            Ok(Json(
                items
                    .iter()
                    .map(|item| item.to_response(&state.assets_base_url))
                    .collect(),
            ))
        }
        Err(err) => {
            error!("Failed to list items: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Get a specific item by ID
#[instrument(name = "api_get_item", skip(state), fields(item_id = %item_id))]
pub async fn get_item(
    State(state): State<ApiState>,
    Path(item_id): Path<String>,
) -> Result<Json<MenuItemResponse>, (StatusCode, Json<Value>)> {
    let id = item_id.parse::<i64>().map_err(|_| {
        service_error_to_response(ServiceError::ValidationError {
            message: format!("Item ID must be an integer, got '{}'", item_id),
        })
    })?;

    match state.menu_service.get_item(id).await {
        Ok(item) => Ok(Json(item.to_response(&state.assets_base_url))),
        Err(err) => {
            error!("Failed to get item {}: {}", id, err);
            Err(service_error_to_response(err))
        }
    }
}

/// Menu split by category
#[instrument(name = "api_get_menu", skip(state))]
pub async fn get_menu(
    State(state): State<ApiState>,
) -> Result<Json<MenuViewResponse>, (StatusCode, Json<Value>)> {
    match state.menu_service.menu_view().await {
        Ok(view) => Ok(Json(view.to_response(&state.assets_base_url))),
        Err(err) => {
            error!("Failed to build menu: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

pub(crate) fn service_error_to_response(err: ServiceError) -> (StatusCode, Json<Value>) {
    let (status, message) = match &err {
        ServiceError::ItemNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::ValidationError { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        ServiceError::Repository { source } => match source {
            RepositoryError::NotFound => (StatusCode::NOT_FOUND, "Resource not found".to_string()),
            RepositoryError::ConnectionFailed => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Database connection failed".to_string(),
            ),
            RepositoryError::Timeout => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Database timeout".to_string(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        },
        ServiceError::Storage { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Image storage error".to_string(),
        ),
        ServiceError::Configuration { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Configuration error".to_string(),
        ),
    };

    (
        status,
        Json(json!({
            "error": message,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}
