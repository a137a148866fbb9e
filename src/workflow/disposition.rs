// src/workflow/disposition.rs

use std::fmt;

use tracing::info;

use super::store::ResultStore;
use crate::backend::PayrollBackend;
use crate::error::{DeskError, DeskResult};
use crate::models::{PayrollResult, ResultId, ResultStatus};

/// Generic notice shown when the service refuses or cannot be reached.
pub const ACTION_FAILED: &str = "Action failed.";
pub const EMPTY_REASON: &str = "Rejection reason cannot be empty.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Approve,
    Reject,
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        })
    }
}

/// What the action column of a result row shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowControls {
    /// Approve / reject buttons plus the reason input.
    Decide,
    Locked,
    RejectedWith(String),
}

pub fn row_controls(result: &PayrollResult) -> RowControls {
    match result.status {
        ResultStatus::Pending => RowControls::Decide,
        ResultStatus::Approved => RowControls::Locked,
        ResultStatus::Rejected => {
            RowControls::RejectedWith(result.rejection_reason.clone().unwrap_or_default())
        }
    }
}

/// A disposition that passed local checks and may be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispositionRequest {
    pub action: Disposition,
    pub id: ResultId,
    pub reason: String,
}

/// Local checks: the row must be on screen and pending, and a rejection
/// needs a non-blank reason from the row's draft.
pub fn prepare(store: &ResultStore, action: Disposition, id: ResultId) -> DeskResult<DispositionRequest> {
    let result = store
        .get(id)
        .ok_or_else(|| DeskError::validation(format!("Payroll result {id} is not in the current view.")))?;
    if result.is_locked() {
        return Err(DeskError::validation(format!(
            "Payroll result {id} is already {} and locked.",
            result.status
        )));
    }
    let reason = match action {
        Disposition::Approve => String::new(),
        Disposition::Reject => {
            let draft = store.reason_draft(id).trim();
            if draft.is_empty() {
                return Err(DeskError::validation(EMPTY_REASON));
            }
            draft.to_string()
        }
    };
    Ok(DispositionRequest { action, id, reason })
}

pub async fn submit<B: PayrollBackend + ?Sized>(backend: &B, req: &DispositionRequest) -> DeskResult<()> {
    match req.action {
        Disposition::Approve => backend.approve(req.id).await?,
        Disposition::Reject => backend.reject(req.id, &req.reason).await?,
    }
    info!(id = req.id, action = %req.action, "disposition recorded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ComponentsSnapshot, Employee};
    use crate::workflow::store::StoreAction;
    use rust_decimal::Decimal;

    fn loaded(rows: Vec<PayrollResult>) -> ResultStore {
        let mut store = ResultStore::new();
        let ticket = store.issue();
        store.reduce(StoreAction::FetchResolved { ticket, outcome: Ok(rows) });
        store
    }

    fn result(id: ResultId, status: ResultStatus) -> PayrollResult {
        PayrollResult {
            id,
            employee: Employee { employee_id: "E1".into(), name: "Ava".into(), base_salary: Decimal::from(5000) },
            total_incentives: Decimal::ZERO,
            total_deductions: Decimal::ZERO,
            final_salary: Decimal::from(5000),
            status,
            rejection_reason: (status == ResultStatus::Rejected).then(|| "dup".to_string()),
            components_snapshot: ComponentsSnapshot::default(),
            created_at: None,
        }
    }

    #[test]
    fn reject_requires_non_blank_draft() {
        let mut store = loaded(vec![result(1, ResultStatus::Pending)]);
        let err = prepare(&store, Disposition::Reject, 1).unwrap_err();
        assert_eq!(err.user_message(""), EMPTY_REASON);

        store.reduce(StoreAction::EditReason { id: 1, text: "   ".into() });
        assert!(prepare(&store, Disposition::Reject, 1).is_err());

        store.reduce(StoreAction::EditReason { id: 1, text: " policy violation ".into() });
        let req = prepare(&store, Disposition::Reject, 1).unwrap();
        assert_eq!(req.reason, "policy violation");
    }

    #[test]
    fn approve_sends_empty_reason() {
        let mut store = loaded(vec![result(1, ResultStatus::Pending)]);
        store.reduce(StoreAction::EditReason { id: 1, text: "typed but unused".into() });
        let req = prepare(&store, Disposition::Approve, 1).unwrap();
        assert_eq!(req.reason, "");
    }

    #[test]
    fn locked_rows_have_no_controls() {
        let store = loaded(vec![result(1, ResultStatus::Approved), result(2, ResultStatus::Rejected)]);
        assert!(prepare(&store, Disposition::Reject, 1).unwrap_err().is_validation());
        assert!(prepare(&store, Disposition::Approve, 2).is_err());
        assert_eq!(row_controls(store.get(1).unwrap()), RowControls::Locked);
        assert_eq!(row_controls(store.get(2).unwrap()), RowControls::RejectedWith("dup".into()));
    }

    #[test]
    fn unknown_rows_are_refused() {
        let store = loaded(vec![]);
        assert!(prepare(&store, Disposition::Approve, 9).is_err());
    }
}
