// src/routes/uploads.rs

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;

use super::{api_error, bad_request, ApiError};
use crate::backend::PayrollBackend;
use crate::error::DeskError;
use crate::models::{ComponentKind, Employee, ManualComponent, MessageResp, UploadFile, UploadResp};
use crate::server::AppState;

// Text fields and file parts of one multipart body, in arrival order.
#[derive(Default)]
struct FormParts {
    texts: Vec<(String, String)>,
    files: Vec<(String, UploadFile)>,
}

impl FormParts {
    fn text(&self, key: &str) -> Option<&str> {
        self.texts.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    fn take_files(&mut self, key: &str) -> Vec<UploadFile> {
        let (hit, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|(k, _)| k == key);
        self.files = rest;
        hit.into_iter().map(|(_, f)| f).collect()
    }
}

async fn read_form(mut multipart: Multipart) -> Result<FormParts, ApiError> {
    let mut parts = FormParts::default();
    while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let bytes = field.bytes().await.map_err(bad_request)?;
                parts.files.push((name, UploadFile { name: file_name, bytes: bytes.to_vec() }));
            }
            None => {
                let text = field.text().await.map_err(bad_request)?;
                parts.texts.push((name, text));
            }
        }
    }
    Ok(parts)
}

/// POST /api/upload/employee/
pub async fn upload_employee(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResp>), ApiError> {
    let mut form = read_form(multipart).await?;
    let mut files = form.take_files("file");
    if files.is_empty() {
        files = form.take_files("files");
    }
    let Some(file) = files.into_iter().next() else {
        return Err(api_error(DeskError::validation("No employee master file provided.")));
    };
    let resp = state.ledger.upload_employees(file).await.map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(resp)))
}

/// POST /api/upload/component/
pub async fn upload_component(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResp>), ApiError> {
    let mut form = read_form(multipart).await?;
    let kind: ComponentKind = form
        .text("type")
        .ok_or_else(|| api_error(DeskError::validation("Files and a valid type are required.")))?
        .parse()
        .map_err(bad_request)?;
    let files = form.take_files("files");
    let resp = state.ledger.upload_components(kind, files).await.map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(resp)))
}

/// POST /api/components/manual-add/
pub async fn manual_add(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<MessageResp>), ApiError> {
    let mut form = read_form(multipart).await?;
    let employee_id = form.text("employee").unwrap_or_default().trim().to_string();
    let amount: Decimal = form
        .text("amount")
        .unwrap_or_default()
        .trim()
        .parse()
        .map_err(|e| bad_request(format!("invalid amount: {e}")))?;
    let reason = form.text("reason").unwrap_or_default().to_string();
    let attachment = form.take_files("attachment").into_iter().next();

    state
        .ledger
        .manual_add(ManualComponent { employee_id, amount, reason, attachment })
        .await
        .map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(MessageResp { message: "Manual component added.".into() })))
}

/// GET /api/employees/
pub async fn list_employees(State(state): State<AppState>) -> Result<Json<Vec<Employee>>, ApiError> {
    state.ledger.list_employees().await.map(Json).map_err(api_error)
}
