// src/workflow/store.rs

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::backend::ResultQuery;
use crate::error::DeskResult;
use crate::models::{PayrollResult, ResultId, ResultStatus};

/// Handle for one issued results query. Only the most recently issued
/// ticket may write into the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub seq: u64,
    pub query: ResultQuery,
}

#[derive(Debug)]
pub enum StoreAction {
    SetSearch(String),
    SetStatusFilter(Option<ResultStatus>),
    /// Bump the refresh trigger (after generate, archive or a disposition).
    Refresh,
    FetchResolved {
        ticket: FetchTicket,
        outcome: DeskResult<Vec<PayrollResult>>,
    },
    EditReason { id: ResultId, text: String },
    /// A disposition on `id` was accepted by the service.
    Disposed(ResultId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    Failed,
    /// A newer query was issued; this response was dropped.
    Stale,
}

#[derive(Debug, Default)]
pub struct ResultStore {
    results: Vec<PayrollResult>,
    loading: bool,
    loaded_once: bool,
    search: String,
    status_filter: Option<ResultStatus>,
    refresh_tick: u64,
    issued_seq: u64,
    reason_drafts: HashMap<ResultId, String>,
    last_resolution: Option<Resolution>,
    // Size of the whole working set as of the last unfiltered fetch.
    working_set_len: Option<usize>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one action. Actions that change what should be displayed return
    /// the ticket of the query that must now be issued.
    pub fn reduce(&mut self, action: StoreAction) -> Option<FetchTicket> {
        match action {
            StoreAction::SetSearch(term) => {
                self.search = term;
                Some(self.issue())
            }
            StoreAction::SetStatusFilter(filter) => {
                self.status_filter = filter;
                Some(self.issue())
            }
            StoreAction::Refresh => {
                // generate and archive both replace the working set
                self.working_set_len = None;
                self.refresh_tick += 1;
                Some(self.issue())
            }
            StoreAction::FetchResolved { ticket, outcome } => {
                self.last_resolution = Some(self.resolve(ticket, outcome));
                None
            }
            StoreAction::EditReason { id, text } => {
                self.reason_drafts.insert(id, text);
                None
            }
            StoreAction::Disposed(id) => {
                self.reason_drafts.remove(&id);
                self.refresh_tick += 1;
                Some(self.issue())
            }
        }
    }

    /// Issue a query for the current parameters (first mount uses this directly).
    pub fn issue(&mut self) -> FetchTicket {
        self.issued_seq += 1;
        self.loading = true;
        let ticket = FetchTicket {
            seq: self.issued_seq,
            query: ResultQuery::new(&self.search, self.status_filter),
        };
        debug!(seq = ticket.seq, query = ?ticket.query, "results query issued");
        ticket
    }

    fn resolve(&mut self, ticket: FetchTicket, outcome: DeskResult<Vec<PayrollResult>>) -> Resolution {
        if ticket.seq != self.issued_seq {
            debug!(seq = ticket.seq, latest = self.issued_seq, "dropping stale results response");
            return Resolution::Stale;
        }
        self.loading = false;
        match outcome {
            Ok(rows) => {
                if ticket.query == ResultQuery::default() {
                    self.working_set_len = Some(rows.len());
                }
                self.results = rows;
                self.loaded_once = true;
                Resolution::Applied
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch payroll results; keeping last good set");
                Resolution::Failed
            }
        }
    }

    /// Rows to render. While loading these are the previous rows, shown as stale.
    pub fn results(&self) -> &[PayrollResult] {
        &self.results
    }

    pub fn get(&self, id: ResultId) -> Option<&PayrollResult> {
        self.results.iter().find(|r| r.id == id)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// True until the first query lands; there is nothing to show yet.
    pub fn is_first_load(&self) -> bool {
        !self.loaded_once
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn status_filter(&self) -> Option<ResultStatus> {
        self.status_filter
    }

    pub fn is_filtered(&self) -> bool {
        !self.search.trim().is_empty() || self.status_filter.is_some()
    }

    pub fn refresh_tick(&self) -> u64 {
        self.refresh_tick
    }

    pub fn reason_draft(&self, id: ResultId) -> &str {
        self.reason_drafts.get(&id).map(String::as_str).unwrap_or("")
    }

    pub fn last_resolution(&self) -> Option<Resolution> {
        self.last_resolution
    }

    /// Working set size as of the last unfiltered fetch. Cleared by every
    /// refresh, since generate and archive replace the set.
    pub fn known_working_set_len(&self) -> Option<usize> {
        self.working_set_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeskError;
    use crate::models::{ComponentsSnapshot, Employee};
    use rust_decimal::Decimal;

    fn row(id: ResultId, name: &str) -> PayrollResult {
        PayrollResult {
            id,
            employee: Employee {
                employee_id: format!("E{id}"),
                name: name.into(),
                base_salary: Decimal::from(1000),
            },
            total_incentives: Decimal::ZERO,
            total_deductions: Decimal::ZERO,
            final_salary: Decimal::from(1000),
            status: ResultStatus::Pending,
            rejection_reason: None,
            components_snapshot: ComponentsSnapshot::default(),
            created_at: None,
        }
    }

    fn resolve(store: &mut ResultStore, ticket: FetchTicket, rows: DeskResult<Vec<PayrollResult>>) -> Resolution {
        store.reduce(StoreAction::FetchResolved { ticket, outcome: rows });
        store.last_resolution().unwrap()
    }

    #[test]
    fn latest_issued_query_wins() {
        let mut store = ResultStore::new();
        let early = store.reduce(StoreAction::SetSearch("Ja".into())).unwrap();
        let late = store.reduce(StoreAction::SetSearch("Jane".into())).unwrap();
        assert_eq!(late.query.search.as_deref(), Some("Jane"));

        assert_eq!(resolve(&mut store, late, Ok(vec![row(1, "Jane")])), Resolution::Applied);
        assert_eq!(resolve(&mut store, early, Ok(vec![row(1, "Jane"), row(2, "Jake")])), Resolution::Stale);
        assert_eq!(store.results().len(), 1);
        assert!(!store.is_loading());
    }

    #[test]
    fn failed_fetch_keeps_last_good_rows() {
        let mut store = ResultStore::new();
        let t = store.issue();
        resolve(&mut store, t, Ok(vec![row(1, "Ava")]));

        let t = store.reduce(StoreAction::Refresh).unwrap();
        assert!(store.is_loading());
        assert_eq!(store.results().len(), 1, "prior rows stay visible while loading");

        let outcome = resolve(&mut store, t, Err(DeskError::Transport("down".into())));
        assert_eq!(outcome, Resolution::Failed);
        assert!(!store.is_loading());
        assert_eq!(store.results()[0].employee.name, "Ava");
    }

    #[test]
    fn first_load_failure_leaves_store_empty() {
        let mut store = ResultStore::new();
        assert!(store.is_first_load());
        let t = store.issue();
        resolve(&mut store, t, Err(DeskError::Transport("down".into())));
        assert!(store.results().is_empty());
        assert!(store.is_first_load());
        assert!(!store.is_loading());
    }

    #[test]
    fn clearing_status_filter_keeps_search() {
        let mut store = ResultStore::new();
        store.reduce(StoreAction::SetSearch("Jane".into()));
        let t = store.reduce(StoreAction::SetStatusFilter(Some(ResultStatus::Approved))).unwrap();
        assert_eq!(t.query.status, Some(ResultStatus::Approved));
        let t = store.reduce(StoreAction::SetStatusFilter(None)).unwrap();
        assert_eq!(t.query.search.as_deref(), Some("Jane"));
        assert_eq!(t.query.status, None);
    }

    #[test]
    fn unfiltered_fetch_records_working_set_size() {
        let mut store = ResultStore::new();
        let t = store.issue();
        resolve(&mut store, t, Ok(vec![row(1, "Ava"), row(2, "Ben")]));
        assert_eq!(store.known_working_set_len(), Some(2));

        // a filtered response says nothing about the whole set
        let t = store.reduce(StoreAction::SetSearch("zed".into())).unwrap();
        resolve(&mut store, t, Ok(vec![]));
        assert_eq!(store.known_working_set_len(), Some(2));

        store.reduce(StoreAction::Refresh);
        assert_eq!(store.known_working_set_len(), None);
    }

    #[test]
    fn reason_drafts_survive_refreshes_until_disposed() {
        let mut store = ResultStore::new();
        store.reduce(StoreAction::EditReason { id: 4, text: "missing timesh".into() });
        let t = store.reduce(StoreAction::Refresh).unwrap();
        resolve(&mut store, t, Ok(vec![row(4, "Ben")]));
        assert_eq!(store.reason_draft(4), "missing timesh");

        let tick = store.refresh_tick();
        assert!(store.reduce(StoreAction::Disposed(4)).is_some());
        assert_eq!(store.reason_draft(4), "");
        assert_eq!(store.refresh_tick(), tick + 1);
    }
}
