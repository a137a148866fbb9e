// src/workflow/upload.rs
//
// Upload cards and the manual-entry form. Each reports
// idle -> uploading -> {success | warning | error} and falls back to idle
// once the notice window has elapsed.

use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use tracing::info;

use crate::backend::PayrollBackend;
use crate::error::{DeskError, DeskResult};
use crate::models::{ComponentKind, Employee, ManualComponent, UploadFile, UploadResp};

pub const UNKNOWN_UPLOAD_ERROR: &str = "An unknown error occurred.";
pub const REQUIRED_FIELDS: &str = "Please fill out all required fields.";
pub const MANUAL_OK: &str = "Incentive added successfully!";
pub const MANUAL_FAILED: &str = "Failed to add incentive. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    Idle,
    Uploading,
    Success,
    /// Partially applied; the service listed what it skipped.
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct AdapterStatus {
    state: AdapterState,
    idle_message: String,
    message: String,
    warnings: Vec<String>,
    settled_at: Option<Instant>,
    window: Duration,
}

impl AdapterStatus {
    pub fn new(idle_message: impl Into<String>, window: Duration) -> Self {
        let idle_message = idle_message.into();
        Self {
            state: AdapterState::Idle,
            message: idle_message.clone(),
            idle_message,
            warnings: Vec::new(),
            settled_at: None,
            window,
        }
    }

    pub fn state(&self) -> AdapterState {
        self.state
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn is_busy(&self) -> bool {
        self.state == AdapterState::Uploading
    }

    fn begin(&mut self, message: String) -> DeskResult<()> {
        if self.is_busy() {
            return Err(DeskError::Busy("upload in progress"));
        }
        self.state = AdapterState::Uploading;
        self.message = message;
        self.warnings.clear();
        self.settled_at = None;
        Ok(())
    }

    fn settle(&mut self, state: AdapterState, message: String, warnings: Vec<String>, now: Instant) {
        self.state = state;
        self.message = message;
        self.warnings = warnings;
        self.settled_at = Some(now);
    }

    /// Revert a settled outcome to idle once its window has passed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.settled_at {
            Some(at) if now.saturating_duration_since(at) >= self.window => {
                self.state = AdapterState::Idle;
                self.message = self.idle_message.clone();
                self.warnings.clear();
                self.settled_at = None;
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadTarget {
    EmployeeMaster,
    Components(ComponentKind),
}

impl UploadTarget {
    pub fn single_file(self) -> bool {
        matches!(self, Self::EmployeeMaster)
    }
}

#[derive(Debug, Clone)]
pub struct UploadAdapter {
    target: UploadTarget,
    status: AdapterStatus,
}

impl UploadAdapter {
    pub fn new(target: UploadTarget, window: Duration) -> Self {
        let idle = if target.single_file() {
            "Click to select a file."
        } else {
            "Click to select one or more files."
        };
        Self { target, status: AdapterStatus::new(idle, window) }
    }

    pub fn target(&self) -> UploadTarget {
        self.target
    }

    pub fn status(&self) -> &AdapterStatus {
        &self.status
    }

    pub fn tick(&mut self, now: Instant) -> bool {
        self.status.tick(now)
    }

    pub fn begin(&mut self, files: &[UploadFile]) -> DeskResult<()> {
        if files.is_empty() {
            return Err(DeskError::validation("Please select a file to upload."));
        }
        if self.target.single_file() && files.len() > 1 {
            return Err(DeskError::validation("The employee master takes a single file."));
        }
        self.status.begin(format!("Uploading {} file(s)...", files.len()))
    }

    pub fn finish(&mut self, outcome: DeskResult<UploadResp>, now: Instant) -> AdapterState {
        match outcome {
            Ok(resp) => {
                let message = if resp.message.trim().is_empty() {
                    "Upload processed.".to_string()
                } else {
                    resp.message
                };
                let state = if resp.warnings.is_empty() {
                    AdapterState::Success
                } else {
                    AdapterState::Warning
                };
                self.status.settle(state, message, resp.warnings, now);
            }
            Err(e) => {
                self.status.settle(AdapterState::Error, e.user_message(UNKNOWN_UPLOAD_ERROR), Vec::new(), now);
            }
        }
        self.status.state()
    }

    pub async fn upload<B: PayrollBackend + ?Sized>(
        &mut self,
        backend: &B,
        mut files: Vec<UploadFile>,
    ) -> DeskResult<AdapterState> {
        self.begin(&files)?;
        let outcome = match self.target {
            UploadTarget::EmployeeMaster => match files.pop() {
                Some(f) => backend.upload_employees(f).await,
                None => Err(DeskError::validation("Please select a file to upload.")),
            },
            UploadTarget::Components(kind) => backend.upload_components(kind, files).await,
        };
        let state = self.finish(outcome, Instant::now());
        info!(target = ?self.target, ?state, "upload settled");
        Ok(state)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Manual entry
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ManualEntryForm {
    employees: Vec<Employee>,
    pub picker_search: String,
    pub selected_employee: Option<String>,
    pub amount: String,
    pub remark: String,
    pub attachment: Option<UploadFile>,
    status: AdapterStatus,
}

impl ManualEntryForm {
    pub fn new(window: Duration) -> Self {
        Self {
            employees: Vec::new(),
            picker_search: String::new(),
            selected_employee: None,
            amount: String::new(),
            remark: String::new(),
            attachment: None,
            status: AdapterStatus::new("", window),
        }
    }

    pub fn status(&self) -> &AdapterStatus {
        &self.status
    }

    pub fn tick(&mut self, now: Instant) -> bool {
        self.status.tick(now)
    }

    pub fn set_employees(&mut self, outcome: DeskResult<Vec<Employee>>) {
        match outcome {
            Ok(list) => self.employees = list,
            Err(e) => tracing::warn!(error = %e, "failed to fetch employees"),
        }
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    /// Picker options narrowed by the search box, by name or id.
    pub fn visible_employees(&self) -> Vec<&Employee> {
        self.employees
            .iter()
            .filter(|e| e.matches(&self.picker_search))
            .collect()
    }

    pub fn validate(&self) -> DeskResult<ManualComponent> {
        let employee_id = self
            .selected_employee
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let amount = self.amount.trim();
        let remark = self.remark.trim();
        let (Some(employee_id), false, false) = (employee_id, amount.is_empty(), remark.is_empty()) else {
            return Err(DeskError::validation(REQUIRED_FIELDS));
        };
        let amount: Decimal = amount
            .parse()
            .map_err(|_| DeskError::validation(format!("'{amount}' is not a valid amount.")))?;
        if amount.is_sign_negative() {
            return Err(DeskError::validation("Amount must not be negative."));
        }
        Ok(ManualComponent {
            employee_id: employee_id.to_string(),
            amount,
            reason: remark.to_string(),
            attachment: self.attachment.clone(),
        })
    }

    fn reset_fields(&mut self) {
        self.picker_search.clear();
        self.selected_employee = None;
        self.amount.clear();
        self.remark.clear();
        self.attachment = None;
    }

    pub async fn submit<B: PayrollBackend + ?Sized>(&mut self, backend: &B) -> DeskResult<AdapterState> {
        if self.status.is_busy() {
            return Err(DeskError::Busy("manual entry in progress"));
        }
        let entry = self.validate()?;
        self.status.begin("Adding...".to_string())?;
        let employee = entry.employee_id.clone();
        let outcome = backend.manual_add(entry).await;
        let now = Instant::now();
        match outcome {
            Ok(()) => {
                info!(%employee, "manual incentive added");
                self.reset_fields();
                self.status.settle(AdapterState::Success, MANUAL_OK.to_string(), Vec::new(), now);
            }
            Err(e) => {
                tracing::warn!(error = %e, "manual entry failed");
                self.status.settle(AdapterState::Error, MANUAL_FAILED.to_string(), Vec::new(), now);
            }
        }
        Ok(self.status.state())
    }
}
