// src/workflow/mod.rs

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::backend::{PayrollBackend, ResultQuery};
use crate::config::DeskConfig;
use crate::error::DeskResult;
use crate::models::{ComponentKind, PayrollResult, ResultId, ResultStatus, RunId, UploadFile};

pub mod archive;
pub mod breakdown;
pub mod disposition;
pub mod history;
pub mod store;
pub mod upload;

pub use archive::{ArchiveController, ArchiveState};
pub use breakdown::{breakdown, format_currency, BreakdownLine, Provenance};
pub use disposition::{row_controls, Disposition, RowControls};
pub use history::{DeleteConfirmation, HistoryBrowser, Toggle};
pub use store::{FetchTicket, ResultStore, StoreAction};
pub use upload::{AdapterState, ManualEntryForm, UploadAdapter, UploadTarget};

pub const GENERATE_OK: &str = "Payroll generated successfully!";
pub const GENERATE_FAILED: &str = "Payroll generation failed.";

/// The operator's desk: every workflow container wired to one backend.
///
/// All mutations go through the backend and are then observed by re-fetching;
/// nothing here flips a status or clears the working set on its own.
pub struct Workbench<B: PayrollBackend> {
    backend: Arc<B>,
    config: DeskConfig,
    store: ResultStore,
    archive: ArchiveController,
    history: HistoryBrowser,
    employee_upload: UploadAdapter,
    incentive_upload: UploadAdapter,
    deduction_upload: UploadAdapter,
    manual: ManualEntryForm,
}

impl<B: PayrollBackend> Workbench<B> {
    pub fn new(backend: Arc<B>, config: DeskConfig) -> Self {
        let window = config.notice_window;
        Self {
            backend,
            store: ResultStore::new(),
            archive: ArchiveController::new(),
            history: HistoryBrowser::new(),
            employee_upload: UploadAdapter::new(UploadTarget::EmployeeMaster, window),
            incentive_upload: UploadAdapter::new(UploadTarget::Components(ComponentKind::Incentive), window),
            deduction_upload: UploadAdapter::new(UploadTarget::Components(ComponentKind::Deduction), window),
            manual: ManualEntryForm::new(window),
            config,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &DeskConfig {
        &self.config
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    pub fn archive(&self) -> &ArchiveController {
        &self.archive
    }

    pub fn history(&self) -> &HistoryBrowser {
        &self.history
    }

    pub fn manual_entry(&self) -> &ManualEntryForm {
        &self.manual
    }

    pub fn manual_entry_mut(&mut self) -> &mut ManualEntryForm {
        &mut self.manual
    }

    pub fn upload_card(&self, target: UploadTarget) -> &UploadAdapter {
        match target {
            UploadTarget::EmployeeMaster => &self.employee_upload,
            UploadTarget::Components(ComponentKind::Incentive) => &self.incentive_upload,
            UploadTarget::Components(ComponentKind::Deduction) => &self.deduction_upload,
        }
    }

    fn upload_card_mut(&mut self, target: UploadTarget) -> &mut UploadAdapter {
        match target {
            UploadTarget::EmployeeMaster => &mut self.employee_upload,
            UploadTarget::Components(ComponentKind::Incentive) => &mut self.incentive_upload,
            UploadTarget::Components(ComponentKind::Deduction) => &mut self.deduction_upload,
        }
    }

    // ── results ────────────────────────────────────────────────────────────

    async fn run_fetch(&mut self, ticket: Option<FetchTicket>) {
        if let Some(ticket) = ticket {
            let outcome = self.backend.fetch_results(&ticket.query).await;
            self.store.reduce(StoreAction::FetchResolved { ticket, outcome });
        }
    }

    /// Initial load of the dashboard, history and employee picker.
    pub async fn mount(&mut self) {
        let ticket = self.store.issue();
        self.run_fetch(Some(ticket)).await;
        self.reload_history().await;
        self.reload_employees().await;
    }

    pub async fn refresh(&mut self) {
        let ticket = self.store.reduce(StoreAction::Refresh);
        self.run_fetch(ticket).await;
    }

    pub async fn set_search(&mut self, term: &str) {
        let ticket = self.store.reduce(StoreAction::SetSearch(term.to_string()));
        self.run_fetch(ticket).await;
    }

    pub async fn set_status_filter(&mut self, filter: Option<ResultStatus>) {
        let ticket = self.store.reduce(StoreAction::SetStatusFilter(filter));
        self.run_fetch(ticket).await;
    }

    pub fn results(&self) -> &[PayrollResult] {
        self.store.results()
    }

    pub async fn generate(&mut self) -> DeskResult<String> {
        let resp = self.backend.generate().await?;
        info!("payroll generated");
        self.refresh().await;
        Ok(if resp.message.trim().is_empty() { GENERATE_OK.to_string() } else { resp.message })
    }

    // ── disposition ────────────────────────────────────────────────────────

    pub fn edit_reason(&mut self, id: ResultId, text: &str) {
        self.store.reduce(StoreAction::EditReason { id, text: text.to_string() });
    }

    pub async fn dispose(&mut self, action: Disposition, id: ResultId) -> DeskResult<()> {
        let req = disposition::prepare(&self.store, action, id)?;
        disposition::submit(self.backend.as_ref(), &req).await?;
        let ticket = self.store.reduce(StoreAction::Disposed(id));
        self.run_fetch(ticket).await;
        Ok(())
    }

    pub async fn approve(&mut self, id: ResultId) -> DeskResult<()> {
        self.dispose(Disposition::Approve, id).await
    }

    pub async fn reject(&mut self, id: ResultId) -> DeskResult<()> {
        self.dispose(Disposition::Reject, id).await
    }

    // ── archive ────────────────────────────────────────────────────────────

    // A filtered view can be empty while the working set is not. Only when
    // the last unfiltered count is stale does this cost a fetch.
    async fn working_set_len(&self) -> usize {
        let shown = self.store.results().len();
        if shown > 0 || !self.store.is_filtered() {
            return shown;
        }
        if let Some(len) = self.store.known_working_set_len() {
            return len;
        }
        match self.backend.fetch_results(&ResultQuery::default()).await {
            Ok(rows) => rows.len(),
            Err(e) => {
                warn!(error = %e, "could not size the working set");
                0
            }
        }
    }

    pub async fn open_archive(&mut self) -> DeskResult<()> {
        let len = self.working_set_len().await;
        self.archive.open(len)
    }

    pub fn set_archive_name(&mut self, name: &str) -> DeskResult<()> {
        self.archive.set_name(name)
    }

    pub fn cancel_archive(&mut self) -> DeskResult<()> {
        self.archive.cancel()
    }

    /// Submit the named snapshot. The confirm control stays disabled until
    /// the service answers.
    pub async fn confirm_archive(&mut self) -> DeskResult<String> {
        let len = self.working_set_len().await;
        let run_name = self.archive.begin_confirm(len)?;
        let outcome = self.backend.archive(&run_name).await;
        let message = self.archive.finish(outcome)?;
        self.refresh().await;
        self.reload_history().await;
        Ok(message)
    }

    // ── history ────────────────────────────────────────────────────────────

    pub async fn reload_history(&mut self) {
        let outcome = self.backend.list_runs().await;
        self.history.set_runs(outcome);
    }

    pub async fn toggle_run(&mut self, run_id: RunId) {
        if let Toggle::Expand(ticket) = self.history.toggle(run_id) {
            let outcome = self.backend.run_detail(ticket.run_id).await;
            self.history.resolve_details(ticket, outcome);
        }
    }

    pub fn request_delete_run(&self, run_id: RunId) -> DeskResult<DeleteConfirmation> {
        self.history.request_delete(run_id)
    }

    pub async fn confirm_delete_run(&mut self, confirmation: DeleteConfirmation) -> DeskResult<String> {
        self.backend.delete_run(confirmation.run_id()).await?;
        info!(run_id = confirmation.run_id(), "payroll run deleted");
        self.reload_history().await;
        Ok(history::DELETE_OK.to_string())
    }

    // ── uploads & manual entry ─────────────────────────────────────────────

    pub async fn reload_employees(&mut self) {
        let outcome = self.backend.list_employees().await;
        self.manual.set_employees(outcome);
    }

    pub async fn upload(&mut self, target: UploadTarget, files: Vec<UploadFile>) -> DeskResult<AdapterState> {
        let backend = Arc::clone(&self.backend);
        self.upload_card_mut(target).upload(backend.as_ref(), files).await
    }

    pub async fn submit_manual_entry(&mut self) -> DeskResult<AdapterState> {
        let backend = Arc::clone(&self.backend);
        self.manual.submit(backend.as_ref()).await
    }

    /// Return any settled upload notice to idle once its window is over.
    pub fn tick(&mut self, now: Instant) {
        self.employee_upload.tick(now);
        self.incentive_upload.tick(now);
        self.deduction_upload.tick(now);
        self.manual.tick(now);
    }
}
