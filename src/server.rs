// src/server.rs
//
// Development backend: serves a `Ledger` over the same REST contract the
// desk consumes, so the workflow can be driven without the real service.

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::backend::Ledger;
use crate::config::DeskConfig;
use crate::routes;

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Ledger>,
}

pub fn router(state: AppState) -> Router {
    // Very permissive CORS for local dev
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // results & disposition
        .route("/payroll/results/", get(routes::results::list_results))
        .route("/payroll/generate/", post(routes::results::generate))
        .route("/payroll/approve/:id/", post(routes::results::approve))
        .route("/payroll/reject/:id/", post(routes::results::reject))
        // archive & history
        .route("/payroll/archive/", post(routes::history::archive))
        .route("/payroll/history/", get(routes::history::list_runs))
        .route("/payroll/history/:id/", get(routes::history::get_run))
        .route("/payroll/history/:id/delete/", delete(routes::history::delete_run))
        // reference data & uploads
        .route("/employees/", get(routes::uploads::list_employees))
        .route("/components/manual-add/", post(routes::uploads::manual_add))
        .route("/upload/employee/", post(routes::uploads::upload_employee))
        .route("/upload/component/", post(routes::uploads::upload_component));

    Router::new()
        .route("/health", get(routes::health::health))
        .route("/media/:name", get(routes::media::media))
        .nest("/api", api)
        // state & middleware
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(config: &DeskConfig, ledger: Arc<Ledger>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.bind_addr, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "development payroll backend listening on http://{addr}/api");
    axum::serve(listener, router(AppState { ledger }).into_make_service()).await?;
    Ok(())
}
