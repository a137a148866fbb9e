use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::error::DeskError;

pub mod health;
pub mod history;
pub mod media;
pub mod results;
pub mod uploads;

pub type ApiError = (StatusCode, Json<Value>);

// Common error mapper
pub fn api_error(e: DeskError) -> ApiError {
    let status = match &e {
        DeskError::Validation(_) => StatusCode::BAD_REQUEST,
        DeskError::NotFound(_) => StatusCode::NOT_FOUND,
        DeskError::Busy(_) => StatusCode::CONFLICT,
        DeskError::Service { status, .. } => {
            StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        }
        DeskError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let message = match e {
        DeskError::Validation(m) | DeskError::NotFound(m) | DeskError::Transport(m) => m,
        DeskError::Busy(m) => m.to_string(),
        DeskError::Service { message, .. } => message.unwrap_or_else(|| "internal error".into()),
    };
    (status, Json(json!({ "error": message })))
}

pub fn bad_request<E: std::fmt::Display>(e: E) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_taxonomy_to_status_codes() {
        assert_eq!(api_error(DeskError::validation("x")).0, StatusCode::BAD_REQUEST);
        assert_eq!(api_error(DeskError::NotFound("run 3".into())).0, StatusCode::NOT_FOUND);
        let (code, Json(body)) = api_error(DeskError::Service { status: 502, message: None });
        assert_eq!(code, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "internal error");
    }
}
