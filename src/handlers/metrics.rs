use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, error, instrument};

use crate::observability::Metrics;

/// Catalog metric families; the labelled ones appear after their first observation
pub const CATALOG_METRIC_FAMILIES: [&str; 3] = [
    "menu_items_total",
    "menu_operations_total",
    "image_store_operations_total",
];

/// Families from `CATALOG_METRIC_FAMILIES` not present in an exposition body
pub fn missing_catalog_families(exposition: &str) -> Vec<&'static str> {
    CATALOG_METRIC_FAMILIES
        .iter()
        .filter(|family| !exposition.contains(&format!("# TYPE {} ", family)))
        .copied()
        .collect()
}

/// Prometheus scrape endpoint for the catalog registry
#[instrument(name = "metrics_scrape", skip(metrics))]
pub async fn metrics_handler(State(metrics): State<Arc<Metrics>>) -> Response {
    let exposition = match metrics.encode() {
        Ok(exposition) => exposition,
        Err(e) => {
            error!(error = %e, "Failed to encode catalog metrics");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Falha ao exportar métricas",
            )
                .into_response();
        }
    };

    let missing = missing_catalog_families(&exposition);
    if !missing.is_empty() {
        debug!(missing = ?missing, "Catalog metrics not observed yet");
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
        exposition,
    )
        .into_response()
}
