// src/routes/health.rs

use axum::{extract::State, Json};
use serde::Serialize;

use crate::backend::PayrollBackend;
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResp { pub status: &'static str, pub backend: &'static str }

pub async fn health(State(state): State<AppState>) -> Json<HealthResp> {
    Json(HealthResp { status: "ok", backend: state.ledger.backend_tag() })
}
