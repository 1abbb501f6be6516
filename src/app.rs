use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use thiserror::Error;
use tower_http::{services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

use crate::config::{Config, ServerConfig, StorageConfig};
use crate::handlers::{
    api, catalog, health_check, metrics_handler, pages, request_validation_middleware,
    security_headers_middleware, ApiState, AppState,
};
use crate::models::{RepositoryError, StorageError, UPLOADS_ROUTE};
use crate::observability::{observability_middleware, Metrics};
use crate::repositories::{connect_pool, SchemaManager, SqliteMenuItemRepository};
use crate::security::{CsrfError, CsrfGuard};
use crate::services::MenuService;
use crate::storage::LocalImageStore;
use crate::views::{ViewError, Views};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Database setup failed: {0}")]
    Database(#[from] RepositoryError),

    #[error("Upload directory setup failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Template setup failed: {0}")]
    Views(#[from] ViewError),

    #[error("Form protection setup failed: {0}")]
    Csrf(#[from] CsrfError),
}

/// Wire the database, file store, service, views and form protection from configuration
pub async fn build_state(
    config: &Config,
    metrics: Arc<Metrics>,
) -> Result<(AppState, ApiState), StartupError> {
    let pool = connect_pool(&config.database.database_url, config.database.max_connections).await?;
    SchemaManager::new(pool.clone())
        .create_menu_table(&config.database.table_name)
        .await?;
    info!(
        table = %config.database.table_name,
        "Database initialized successfully"
    );

    let repository = Arc::new(
        SqliteMenuItemRepository::new(pool, config.database.table_name.clone())
            .with_metrics(metrics.clone()),
    );

    let image_store = LocalImageStore::new(config.storage.upload_path());
    image_store.ensure_directories().await?;
    info!(upload_dir = %config.storage.upload_dir, "Image store initialized successfully");

    let menu_service = Arc::new(
        MenuService::new(
            repository,
            Arc::new(image_store),
            config.storage.allowed_extensions(),
        )
        .with_metrics(metrics),
    );

    let views = Arc::new(Views::new(&config.storage.templates_dir)?);
    let csrf = Arc::new(CsrfGuard::new(
        &config.security.secret_key,
        config.security.csrf_time_limit(),
    )?);
    info!("Services initialized successfully");

    let app_state = AppState {
        menu_service: menu_service.clone(),
        views,
        csrf,
        assets_base_url: config.storage.assets_base_url.clone(),
    };
    let api_state = ApiState {
        menu_service,
        assets_base_url: config.storage.assets_base_url.clone(),
    };

    Ok((app_state, api_state))
}

/// Build the complete application router from configuration
pub async fn build_app(config: &Config, metrics: Arc<Metrics>) -> Result<Router, StartupError> {
    let (app_state, api_state) = build_state(config, metrics.clone()).await?;
    Ok(create_app(
        metrics,
        app_state,
        api_state,
        &config.storage,
        &config.server,
    ))
}

pub fn create_app(
    metrics: Arc<Metrics>,
    app_state: AppState,
    api_state: ApiState,
    storage: &StorageConfig,
    server: &ServerConfig,
) -> Router {
    let metrics_for_middleware = metrics.clone();

    Router::new()
        // Health and metrics endpoints (with metrics state)
        .route("/health/status", get(health_check))
        .route("/metrics", get(metrics_handler))
        .with_state(metrics)
        // JSON endpoints (with API state)
        .route("/api/items", get(api::list_items))
        .route("/api/items/:item_id", get(api::get_item))
        .route("/api/menu", get(api::get_menu))
        .with_state(api_state)
        // HTML pages (with page state)
        .route("/", get(pages::index))
        .route("/sobre", get(pages::sobre))
        .route(
            "/cadastro",
            get(catalog::cadastro_form).post(catalog::cadastro_submit),
        )
        .route("/listagem", get(catalog::listagem))
        .route(
            "/editar/:id",
            get(catalog::editar_form).post(catalog::editar_submit),
        )
        .route("/excluir/:id", get(catalog::excluir))
        .route("/cardapio", get(catalog::cardapio))
        .route(
            "/carrinho/:id",
            get(catalog::carrinho).post(catalog::carrinho_submit),
        )
        .fallback(pages::not_found)
        .with_state(app_state)
        .nest_service("/static", ServeDir::new(&storage.static_dir))
        .nest_service(UPLOADS_ROUTE, ServeDir::new(storage.upload_path()))
        // Add middleware layers (order matters - outer to inner)
        .layer(DefaultBodyLimit::max(server.max_request_size))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_validation_middleware))
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(move |req, next| {
            observability_middleware(metrics_for_middleware.clone(), req, next)
        }))
}
