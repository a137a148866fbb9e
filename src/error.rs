use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeskError {
    /// Refused locally, before any request was issued.
    #[error("VALIDATION: {0}")]
    Validation(String),
    /// The control that triggers this action is already in flight.
    #[error("BUSY: {0}")]
    Busy(&'static str),
    #[error("SERVICE({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Service { status: u16, message: Option<String> },
    #[error("TRANSPORT: {0}")]
    Transport(String),
    #[error("NOT_FOUND: {0}")]
    NotFound(String),
}

impl DeskError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Text to show an operator: the server's own message when it sent one,
    /// the validation text for local refusals, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::Service { message: Some(msg), .. } if !msg.trim().is_empty() => msg.clone(),
            _ => fallback.to_string(),
        }
    }

    /// Like `user_message`, but service text never reaches the operator.
    /// Used where only a generic notice is shown for a failed request.
    pub fn notice(&self, generic: &str) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            _ => generic.to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<reqwest::Error> for DeskError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value.to_string())
    }
}

impl From<serde_json::Error> for DeskError {
    fn from(value: serde_json::Error) -> Self {
        Self::Transport(format!("decode failed: {value}"))
    }
}

impl From<std::io::Error> for DeskError {
    fn from(value: std::io::Error) -> Self {
        Self::Validation(format!("could not read file: {value}"))
    }
}

pub type DeskResult<T> = Result<T, DeskError>;

/// Pull a human-readable message out of an error body.
///
/// Accepts `{"message": "..."}`, `{"error": "..."}` or `{"error": ["a", "b"]}`.
pub fn extract_message(body: &serde_json::Value) -> Option<String> {
    for key in ["message", "error"] {
        match body.get(key) {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => return Some(s.clone()),
            Some(serde_json::Value::Array(items)) => {
                let parts: Vec<&str> = items.iter().filter_map(|v| v.as_str()).collect();
                if !parts.is_empty() {
                    return Some(parts.join(" "));
                }
            }
            _ => {}
        }
    }
    // DRF field errors: {"reason": ["This field may not be blank."]}
    body.as_object().and_then(|map| {
        map.values()
            .filter_map(|v| v.as_array())
            .flat_map(|a| a.iter().filter_map(|s| s.as_str()))
            .next()
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_message_prefers_server_text() {
        let err = DeskError::Service { status: 400, message: Some("No payroll results to archive.".into()) };
        assert_eq!(err.user_message("Archive failed."), "No payroll results to archive.");

        let bare = DeskError::Service { status: 500, message: None };
        assert_eq!(bare.user_message("Archive failed."), "Archive failed.");

        let net = DeskError::Transport("connection refused".into());
        assert_eq!(net.user_message("Action failed."), "Action failed.");
    }

    #[test]
    fn notice_hides_service_text() {
        let err = DeskError::Service { status: 404, message: Some("no pending payroll result 5".into()) };
        assert_eq!(err.notice("Action failed."), "Action failed.");
        let err = DeskError::NotFound("payroll run 9".into());
        assert_eq!(err.notice("Failed to delete the payroll run."), "Failed to delete the payroll run.");
        let local = DeskError::validation("Rejection reason cannot be empty.");
        assert_eq!(local.notice("Action failed."), "Rejection reason cannot be empty.");
    }

    #[test]
    fn extracts_message_shapes() {
        assert_eq!(extract_message(&json!({"message": "ok"})).as_deref(), Some("ok"));
        assert_eq!(extract_message(&json!({"error": "bad file"})).as_deref(), Some("bad file"));
        assert_eq!(extract_message(&json!({"error": ["row 2", "row 5"]})).as_deref(), Some("row 2 row 5"));
        assert_eq!(
            extract_message(&json!({"reason": ["This field may not be blank."]})).as_deref(),
            Some("This field may not be blank.")
        );
        assert_eq!(extract_message(&json!({})), None);
    }
}
