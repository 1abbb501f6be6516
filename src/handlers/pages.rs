use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;
use tera::Context;
use tracing::{error, info, instrument};

use crate::models::{RepositoryError, ServiceError};
use crate::security::CsrfGuard;
use crate::services::MenuService;
use crate::views::{ItemCard, Views};

/// Shared state for the HTML pages
#[derive(Clone)]
pub struct AppState {
    pub menu_service: Arc<MenuService>,
    pub views: Arc<Views>,
    pub csrf: Arc<CsrfGuard>,
    pub assets_base_url: String,
}

impl AppState {
    /// Context with the navigation entry to highlight
    pub fn context(&self, active: &str) -> Context {
        let mut context = Context::new();
        context.insert("active", active);
        context
    }

    pub fn render(&self, view: &str, context: &Context, status: StatusCode) -> Response {
        match self.views.render(view, context) {
            Ok(html) => (status, html).into_response(),
            Err(e) => {
                error!(error = %e, view = view, "Failed to render view");
                internal_error_page()
            }
        }
    }

    /// Render the error page for a failed service call
    pub fn error_page(&self, err: &ServiceError) -> Response {
        let (status, title, message) = match err {
            ServiceError::ItemNotFound { id } => (
                StatusCode::NOT_FOUND,
                "Item não encontrado",
                format!("O item {} não existe ou foi removido.", id),
            ),
            ServiceError::ValidationError { message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Dados inválidos",
                message.clone(),
            ),
            ServiceError::Repository {
                source: RepositoryError::ConnectionFailed | RepositoryError::Timeout,
            } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Serviço indisponível",
                "O banco de dados não respondeu. Tente novamente em instantes.".to_string(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Erro interno",
                "Não foi possível concluir a operação.".to_string(),
            ),
        };

        if status.is_server_error() {
            error!(error = %err, status = status.as_u16(), "Request failed");
        }

        self.status_page(status, title, &message)
    }

    pub fn not_found_page(&self, message: &str) -> Response {
        self.status_page(StatusCode::NOT_FOUND, "Página não encontrada", message)
    }

    fn status_page(&self, status: StatusCode, title: &str, message: &str) -> Response {
        let mut context = self.context("");
        context.insert("status", &status.as_u16());
        context.insert("title", title);
        context.insert("message", message);
        self.render("erro", &context, status)
    }
}

fn internal_error_page() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html("<h1>Erro interno</h1><p>Não foi possível exibir a página.</p>"),
    )
        .into_response()
}

/// Landing page
#[instrument(name = "index", skip(state))]
pub async fn index(State(state): State<AppState>) -> Response {
    state.render("index", &state.context("inicio"), StatusCode::OK)
}

/// About page, given every item
#[instrument(name = "sobre", skip(state))]
pub async fn sobre(State(state): State<AppState>) -> Response {
    match state.menu_service.list_items().await {
        Ok(items) => {
            info!("Rendering about page with {} items", items.len());
            let mut context = state.context("sobre");
            context.insert("items", &ItemCard::from_items(&items, &state.assets_base_url));
            state.render("sobre", &context, StatusCode::OK)
        }
        Err(err) => state.error_page(&err),
    }
}

/// Fallback for unknown paths
pub async fn not_found(State(state): State<AppState>) -> Response {
    state.not_found_page("O endereço solicitado não existe.")
}
