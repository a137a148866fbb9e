// src/workflow/history.rs

use tracing::{debug, warn};

use crate::error::{DeskError, DeskResult};
use crate::models::{ArchivedResult, PayrollRunSummary, RunId};

pub const DELETE_PROMPT: &str =
    "Are you sure you want to permanently delete this payroll run? This action cannot be undone.";
pub const DELETE_OK: &str = "Payroll run deleted successfully.";
pub const DELETE_FAILED: &str = "Failed to delete the payroll run.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailTicket {
    pub run_id: RunId,
    seq: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toggle {
    /// The open run was closed; nothing to fetch.
    Collapsed,
    /// `run_id` is now open and its line items must be fetched.
    Expand(DetailTicket),
}

/// Proof that the operator was asked before a run is deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteConfirmation {
    run_id: RunId,
    label: String,
}

impl DeleteConfirmation {
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn prompt(&self) -> &'static str {
        DELETE_PROMPT
    }
}

/// Accordion over archived runs: at most one run open, its details fetched
/// on every expansion and dropped on collapse.
#[derive(Debug, Default)]
pub struct HistoryBrowser {
    runs: Vec<PayrollRunSummary>,
    active_run_id: Option<RunId>,
    details: Vec<ArchivedResult>,
    loading_details: bool,
    detail_seq: u64,
}

impl HistoryBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn runs(&self) -> &[PayrollRunSummary] {
        &self.runs
    }

    pub fn active_run_id(&self) -> Option<RunId> {
        self.active_run_id
    }

    pub fn details(&self) -> &[ArchivedResult] {
        &self.details
    }

    pub fn is_loading_details(&self) -> bool {
        self.loading_details
    }

    /// Replace the run list. A failed listing keeps what was shown before.
    pub fn set_runs(&mut self, outcome: DeskResult<Vec<PayrollRunSummary>>) {
        match outcome {
            Ok(runs) => {
                self.runs = runs;
                if let Some(active) = self.active_run_id {
                    if !self.runs.iter().any(|r| r.id == active) {
                        self.collapse();
                    }
                }
            }
            Err(e) => warn!(error = %e, "failed to fetch payroll runs"),
        }
    }

    fn collapse(&mut self) {
        self.active_run_id = None;
        self.details.clear();
        self.loading_details = false;
    }

    pub fn toggle(&mut self, run_id: RunId) -> Toggle {
        if self.active_run_id == Some(run_id) {
            self.collapse();
            return Toggle::Collapsed;
        }
        self.detail_seq += 1;
        self.active_run_id = Some(run_id);
        self.details.clear();
        self.loading_details = true;
        debug!(run_id, "expanding payroll run");
        Toggle::Expand(DetailTicket { run_id, seq: self.detail_seq })
    }

    /// Land a detail response. Responses for a run that is no longer the open
    /// one (or for an earlier expansion of it) are dropped.
    pub fn resolve_details(&mut self, ticket: DetailTicket, outcome: DeskResult<Vec<ArchivedResult>>) -> bool {
        if ticket.seq != self.detail_seq || self.active_run_id != Some(ticket.run_id) {
            return false;
        }
        self.loading_details = false;
        match outcome {
            Ok(rows) => {
                self.details = rows;
                true
            }
            Err(e) => {
                warn!(run_id = ticket.run_id, error = %e, "failed to fetch archived results");
                false
            }
        }
    }

    /// First half of deletion: name the run and produce the confirmation the
    /// operator must accept. Leaves the accordion as it is.
    pub fn request_delete(&self, run_id: RunId) -> DeskResult<DeleteConfirmation> {
        let run = self
            .runs
            .iter()
            .find(|r| r.id == run_id)
            .ok_or_else(|| DeskError::validation(format!("Payroll run {run_id} is not listed.")))?;
        Ok(DeleteConfirmation { run_id, label: run.label() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn summary(id: RunId, name: Option<&str>) -> PayrollRunSummary {
        PayrollRunSummary { id, run_name: name.map(str::to_string), run_timestamp: Utc::now() }
    }

    fn ticket(t: Toggle) -> DetailTicket {
        match t {
            Toggle::Expand(t) => t,
            Toggle::Collapsed => panic!("expected expansion"),
        }
    }

    #[test]
    fn one_run_open_at_a_time() {
        let mut h = HistoryBrowser::new();
        h.set_runs(Ok(vec![summary(1, Some("June")), summary(2, None)]));

        let first = ticket(h.toggle(1));
        assert!(h.resolve_details(first, Ok(vec![])));
        let second = ticket(h.toggle(2));
        assert_eq!(h.active_run_id(), Some(2));
        assert!(h.is_loading_details());

        assert_eq!(h.toggle(2), Toggle::Collapsed);
        assert_eq!(h.active_run_id(), None);
        // late response for the collapsed run is ignored
        assert!(!h.resolve_details(second, Ok(vec![])));
    }

    #[test]
    fn stale_detail_response_does_not_overwrite() {
        let mut h = HistoryBrowser::new();
        h.set_runs(Ok(vec![summary(1, None), summary(2, None)]));
        let a = ticket(h.toggle(1));
        let b = ticket(h.toggle(2));
        assert!(!h.resolve_details(a, Ok(vec![])));
        assert!(h.is_loading_details());
        assert!(h.resolve_details(b, Ok(vec![])));
        assert!(!h.is_loading_details());
    }

    #[test]
    fn delete_requires_listed_run_and_keeps_accordion() {
        let mut h = HistoryBrowser::new();
        h.set_runs(Ok(vec![summary(1, Some("June 2025"))]));
        let _ = h.toggle(1);
        let confirm = h.request_delete(1).unwrap();
        assert_eq!(confirm.label(), "June 2025");
        assert_eq!(confirm.prompt(), DELETE_PROMPT);
        assert_eq!(h.active_run_id(), Some(1));
        assert!(h.request_delete(7).is_err());
    }

    #[test]
    fn removed_active_run_collapses_on_relist() {
        let mut h = HistoryBrowser::new();
        h.set_runs(Ok(vec![summary(1, None)]));
        let _ = h.toggle(1);
        h.set_runs(Err(DeskError::Transport("down".into())));
        assert_eq!(h.runs().len(), 1);
        h.set_runs(Ok(vec![]));
        assert_eq!(h.active_run_id(), None);
    }
}
