// src/routes/history.rs

use axum::{extract::{Path, State}, Json};
use serde_json::json;

use super::{api_error, ApiError};
use crate::backend::PayrollBackend;
use crate::models::{ArchiveBody, ArchivedResult, MessageResp, PayrollRunSummary, RunId};
use crate::server::AppState;

/// POST /api/payroll/archive/
pub async fn archive(
    State(state): State<AppState>,
    Json(b): Json<ArchiveBody>,
) -> Result<Json<MessageResp>, ApiError> {
    state.ledger.archive(&b.run_name).await.map(Json).map_err(api_error)
}

/// GET /api/payroll/history/
pub async fn list_runs(State(state): State<AppState>) -> Result<Json<Vec<PayrollRunSummary>>, ApiError> {
    state.ledger.list_runs().await.map(Json).map_err(api_error)
}

/// GET /api/payroll/history/:id/
pub async fn get_run(
    State(state): State<AppState>,
    Path(id): Path<RunId>,
) -> Result<Json<Vec<ArchivedResult>>, ApiError> {
    state.ledger.run_detail(id).await.map(Json).map_err(api_error)
}

/// DELETE /api/payroll/history/:id/delete/
pub async fn delete_run(
    State(state): State<AppState>,
    Path(id): Path<RunId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.ledger.delete_run(id).await.map_err(api_error)?;
    Ok(Json(json!({ "deleted": true })))
}
