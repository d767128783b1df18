//! HTTP surface for the stock reservation system.
//!
//! Exposes item CRUD and listing under `/api/v1/items`, plus health and
//! Prometheus metrics endpoints, with structured logging (tracing). The
//! reservation pipeline itself runs beside the server; this crate only
//! manages the ledger entries it operates on.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use ledger_store::LedgerStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::items::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: LedgerStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let items = Router::new()
        .route(
            "/api/v1/items",
            get(routes::items::list::<S>).post(routes::items::create::<S>),
        )
        .route(
            "/api/v1/items/{id}",
            get(routes::items::get_by_id::<S>)
                .patch(routes::items::update::<S>)
                .delete(routes::items::delete::<S>),
        )
        .with_state(state);

    Router::new()
        .route("/health", get(routes::health::check))
        .merge(items)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
