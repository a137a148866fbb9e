// src/routes/results.rs

use axum::{extract::{Path, Query, State}, Json};
use serde::Deserialize;

use super::{api_error, bad_request, ApiError};
use crate::backend::{PayrollBackend, ResultQuery};
use crate::models::{MessageResp, PayrollResult, ReasonBody, ResultId, ResultStatus};
use crate::server::AppState;

#[derive(Deserialize)]
pub struct ListQ {
    pub search: Option<String>,
    pub status: Option<String>,   // "" | pending | approved | rejected
}

/// GET /api/payroll/results/
pub async fn list_results(
    State(state): State<AppState>,
    Query(q): Query<ListQ>,
) -> Result<Json<Vec<PayrollResult>>, ApiError> {
    let status = match q.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(s) => Some(s.parse::<ResultStatus>().map_err(bad_request)?),
    };
    let query = ResultQuery::new(q.search.as_deref().unwrap_or(""), status);
    let rows = state.ledger.fetch_results(&query).await.map_err(api_error)?;
    Ok(Json(rows))
}

/// POST /api/payroll/generate/
pub async fn generate(State(state): State<AppState>) -> Result<Json<MessageResp>, ApiError> {
    state.ledger.generate().await.map(Json).map_err(api_error)
}

/// POST /api/payroll/approve/:id/
pub async fn approve(
    State(state): State<AppState>,
    Path(id): Path<ResultId>,
) -> Result<Json<MessageResp>, ApiError> {
    state.ledger.approve(id).await.map_err(api_error)?;
    Ok(Json(MessageResp { message: "Payroll approved.".into() }))
}

/// POST /api/payroll/reject/:id/
pub async fn reject(
    State(state): State<AppState>,
    Path(id): Path<ResultId>,
    Json(b): Json<ReasonBody>,
) -> Result<Json<MessageResp>, ApiError> {
    state.ledger.reject(id, &b.reason).await.map_err(api_error)?;
    Ok(Json(MessageResp { message: "Payroll rejected.".into() }))
}
