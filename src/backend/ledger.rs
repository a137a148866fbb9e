// src/backend/ledger.rs
//
// In-memory stand-in for the payroll service. It honours the REST contract
// (statuses, locking, archive semantics) with a deliberately naive calculation:
// final = base + incentives - deductions.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::info;

use super::{PayrollBackend, ResultQuery};
use crate::error::{DeskError, DeskResult};
use crate::models::{
    run_label, ArchivedResult, ComponentKind, ComponentLineItem, ComponentsSnapshot, Employee,
    ManualComponent, MessageResp, PayrollResult, PayrollRunSummary, ResultId, ResultStatus, RunId,
    UploadFile, UploadResp, MANUAL_ENTRY,
};

struct PendingComponent {
    employee_id: String,
    kind: ComponentKind,
    item: ComponentLineItem,
}

struct StoredRun {
    summary: PayrollRunSummary,
    results: Vec<ArchivedResult>,
}

#[derive(Default)]
struct LedgerState {
    employees: BTreeMap<String, Employee>,
    components: Vec<PendingComponent>,
    results: Vec<PayrollResult>,
    runs: Vec<StoredRun>,
    media: HashMap<String, Vec<u8>>,
    next_result_id: i64,
    next_run_id: i64,
    next_archived_id: i64,
}

impl LedgerState {
    fn store_media(&mut self, file: &UploadFile) -> String {
        let digest = format!("{:x}", Sha256::digest(&file.bytes));
        let base = file
            .name
            .rsplit(['/', '\\'])
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("upload");
        let stored = format!("{}_{}", &digest[..8], base.replace(' ', "_"));
        self.media.insert(stored.clone(), file.bytes.clone());
        stored
    }

    fn pending_mut(&mut self, id: ResultId) -> DeskResult<&mut PayrollResult> {
        self.results
            .iter_mut()
            .find(|r| r.id == id && r.status == ResultStatus::Pending)
            .ok_or_else(|| DeskError::NotFound(format!("no pending payroll result {id}")))
    }
}

#[derive(Default)]
pub struct Ledger {
    state: Mutex<LedgerState>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed (or overwrite) employee master records directly.
    pub async fn seed_employees(&self, employees: impl IntoIterator<Item = Employee>) {
        let mut st = self.state.lock().await;
        for e in employees {
            st.employees.insert(e.employee_id.clone(), e);
        }
    }

    /// Queue an uploaded-sheet component without going through a file.
    pub async fn seed_component(
        &self,
        employee_id: &str,
        kind: ComponentKind,
        amount: Decimal,
        reason: &str,
        source_file: &str,
    ) {
        let mut st = self.state.lock().await;
        st.components.push(PendingComponent {
            employee_id: employee_id.to_string(),
            kind,
            item: ComponentLineItem {
                reason: reason.to_string(),
                amount,
                source_file: source_file.to_string(),
                attachment_url: None,
            },
        });
    }

    pub async fn media(&self, stored_name: &str) -> Option<Vec<u8>> {
        self.state.lock().await.media.get(stored_name).cloned()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sheet helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Keep digits, `.` and `-`, then parse. Mirrors how the sheets arrive
/// ("$1,200.00", "1 200").
fn clean_decimal(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

type Row = HashMap<String, String>;

fn read_sheet(file: &UploadFile) -> DeskResult<(Vec<String>, Vec<Row>)> {
    let unreadable = || {
        DeskError::validation(format!(
            "Could not read file '{}': only CSV sheets are supported.",
            file.name
        ))
    };
    let text = std::str::from_utf8(&file.bytes).map_err(|_| unreadable())?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.trim_start_matches('\u{feff}').as_bytes());

    let header: Vec<String> = reader
        .headers()
        .map_err(|_| unreadable())?
        .iter()
        .map(str::to_lowercase)
        .collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|_| unreadable())?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows.push(
            header
                .iter()
                .cloned()
                .zip(record.iter().map(str::to_string))
                .collect::<Row>(),
        );
    }
    Ok((header, rows))
}

fn cell<'a>(row: &'a Row, key: &str) -> &'a str {
    row.get(key).map(String::as_str).unwrap_or("")
}

fn totals(items: &[ComponentLineItem]) -> Decimal {
    items.iter().map(|i| i.amount).sum()
}

// ─────────────────────────────────────────────────────────────────────────────
// Contract
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl PayrollBackend for Ledger {
    fn backend_tag(&self) -> &'static str {
        "ledger"
    }

    async fn fetch_results(&self, query: &ResultQuery) -> DeskResult<Vec<PayrollResult>> {
        let st = self.state.lock().await;
        let mut rows: Vec<PayrollResult> = st
            .results
            .iter()
            .filter(|r| query.status.map_or(true, |s| r.status == s))
            .filter(|r| query.search.as_deref().map_or(true, |t| r.employee.matches(t)))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(rows)
    }

    async fn generate(&self) -> DeskResult<MessageResp> {
        let mut st = self.state.lock().await;
        let now = Utc::now();
        let pending = std::mem::take(&mut st.components);

        let employees: Vec<Employee> = st.employees.values().cloned().collect();
        let mut fresh = Vec::with_capacity(employees.len());
        for emp in employees {
            let mut snapshot = ComponentsSnapshot::default();
            for c in pending.iter().filter(|c| c.employee_id == emp.employee_id) {
                match c.kind {
                    ComponentKind::Incentive => snapshot.incentives.push(c.item.clone()),
                    ComponentKind::Deduction => snapshot.deductions.push(c.item.clone()),
                }
            }
            let total_incentives = totals(&snapshot.incentives);
            let total_deductions = totals(&snapshot.deductions);
            st.next_result_id += 1;
            fresh.push(PayrollResult {
                id: st.next_result_id,
                final_salary: emp.base_salary + total_incentives - total_deductions,
                employee: emp,
                total_incentives,
                total_deductions,
                status: ResultStatus::Pending,
                rejection_reason: None,
                components_snapshot: snapshot,
                created_at: Some(now),
            });
        }
        info!(count = fresh.len(), "generated payroll results");
        st.results = fresh;
        Ok(MessageResp { message: "New payroll generated successfully.".into() })
    }

    async fn approve(&self, id: ResultId) -> DeskResult<()> {
        let mut st = self.state.lock().await;
        let r = st.pending_mut(id)?;
        r.status = ResultStatus::Approved;
        Ok(())
    }

    async fn reject(&self, id: ResultId, reason: &str) -> DeskResult<()> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(DeskError::validation("This field may not be blank."));
        }
        let mut st = self.state.lock().await;
        let r = st.pending_mut(id)?;
        r.status = ResultStatus::Rejected;
        r.rejection_reason = Some(reason.to_string());
        Ok(())
    }

    async fn archive(&self, run_name: &str) -> DeskResult<MessageResp> {
        let mut st = self.state.lock().await;
        if st.results.is_empty() {
            return Err(DeskError::validation("No payroll results to archive."));
        }
        let name = run_name.trim();
        let run_name = (!name.is_empty()).then(|| name.to_string());
        st.next_run_id += 1;
        let run_id = st.next_run_id;
        let summary = PayrollRunSummary {
            id: run_id,
            run_name,
            run_timestamp: Utc::now(),
        };

        let mut live = std::mem::take(&mut st.results);
        live.sort_by_key(|r| r.id);
        let mut frozen = Vec::with_capacity(live.len());
        for r in live {
            st.next_archived_id += 1;
            frozen.push(ArchivedResult {
                id: st.next_archived_id,
                run: Some(run_id),
                employee_id: r.employee.employee_id,
                employee_name: r.employee.name,
                base_salary: r.employee.base_salary,
                total_incentives: r.total_incentives,
                total_deductions: r.total_deductions,
                final_salary: r.final_salary,
                status: r.status,
                rejection_reason: r.rejection_reason,
                components_snapshot: r.components_snapshot,
            });
        }
        let label = run_label(summary.run_name.as_deref(), summary.run_timestamp);
        info!(run_id, lines = frozen.len(), %label, "archived payroll run");
        st.runs.push(StoredRun { summary, results: frozen });
        Ok(MessageResp { message: format!("Payroll run '{label}' archived successfully.") })
    }

    async fn list_runs(&self) -> DeskResult<Vec<PayrollRunSummary>> {
        let st = self.state.lock().await;
        let mut runs: Vec<PayrollRunSummary> = st.runs.iter().map(|r| r.summary.clone()).collect();
        runs.sort_by(|a, b| b.run_timestamp.cmp(&a.run_timestamp).then(b.id.cmp(&a.id)));
        Ok(runs)
    }

    async fn run_detail(&self, id: RunId) -> DeskResult<Vec<ArchivedResult>> {
        let st = self.state.lock().await;
        st.runs
            .iter()
            .find(|r| r.summary.id == id)
            .map(|r| r.results.clone())
            .ok_or_else(|| DeskError::NotFound(format!("payroll run {id}")))
    }

    async fn delete_run(&self, id: RunId) -> DeskResult<()> {
        let mut st = self.state.lock().await;
        let before = st.runs.len();
        st.runs.retain(|r| r.summary.id != id);
        if st.runs.len() == before {
            return Err(DeskError::NotFound(format!("payroll run {id}")));
        }
        info!(run_id = id, "deleted payroll run");
        Ok(())
    }

    async fn list_employees(&self) -> DeskResult<Vec<Employee>> {
        Ok(self.state.lock().await.employees.values().cloned().collect())
    }

    async fn manual_add(&self, entry: ManualComponent) -> DeskResult<()> {
        if entry.amount.is_sign_negative() {
            return Err(DeskError::validation("Amount must not be negative."));
        }
        if entry.reason.trim().is_empty() {
            return Err(DeskError::validation("A remark is required."));
        }
        let mut st = self.state.lock().await;
        if !st.employees.contains_key(&entry.employee_id) {
            return Err(DeskError::NotFound(format!("employee {}", entry.employee_id)));
        }
        let attachment_url = entry
            .attachment
            .as_ref()
            .map(|f| format!("/media/{}", st.store_media(f)));
        st.components.push(PendingComponent {
            employee_id: entry.employee_id,
            kind: ComponentKind::Incentive,
            item: ComponentLineItem {
                reason: entry.reason.trim().to_string(),
                amount: entry.amount,
                source_file: MANUAL_ENTRY.to_string(),
                attachment_url,
            },
        });
        Ok(())
    }

    async fn upload_employees(&self, file: UploadFile) -> DeskResult<UploadResp> {
        let (header, rows) = read_sheet(&file)?;
        if !header.iter().any(|h| h == "employee_id") {
            return Err(DeskError::validation(
                "The master file must have an 'employee_id' column.",
            ));
        }
        let mut st = self.state.lock().await;
        st.store_media(&file);
        let mut warnings = Vec::new();
        for (n, row) in rows.iter().enumerate() {
            let line = n + 2;
            let id = cell(row, "employee_id");
            if id.is_empty() {
                warnings.push(format!("Row {line}: missing employee_id, skipped."));
                continue;
            }
            let raw_salary = cell(row, "base_salary");
            let base_salary = match clean_decimal(raw_salary) {
                Some(d) => d,
                None => {
                    if !raw_salary.is_empty() {
                        warnings.push(format!("Row {line}: invalid base_salary '{raw_salary}', using 0."));
                    }
                    Decimal::ZERO
                }
            };
            st.employees.insert(
                id.to_string(),
                Employee {
                    employee_id: id.to_string(),
                    name: cell(row, "name").to_string(),
                    base_salary,
                },
            );
        }
        Ok(UploadResp {
            message: "Employee master sheet processed successfully.".into(),
            warnings,
        })
    }

    async fn upload_components(
        &self,
        kind: ComponentKind,
        files: Vec<UploadFile>,
    ) -> DeskResult<UploadResp> {
        if files.is_empty() {
            return Err(DeskError::validation("Files and a valid type are required."));
        }
        let mut st = self.state.lock().await;
        let mut warnings = Vec::new();
        let mut staged = Vec::new();
        for file in &files {
            let stored = st.store_media(file);
            let (header, rows) = match read_sheet(file) {
                Ok(sheet) => sheet,
                Err(e) => {
                    warnings.push(e.user_message("unreadable file"));
                    continue;
                }
            };
            if !(header.iter().any(|h| h == "employee_id") && header.iter().any(|h| h == "amount")) {
                warnings.push(format!("{}: needs 'employee_id' and 'amount' columns, skipped.", file.name));
                continue;
            }
            for (n, row) in rows.iter().enumerate() {
                let line = n + 2;
                let emp = cell(row, "employee_id");
                if !st.employees.contains_key(emp) {
                    warnings.push(format!("{} row {line}: unknown employee '{emp}', skipped.", file.name));
                    continue;
                }
                let Some(amount) = clean_decimal(cell(row, "amount")) else {
                    warnings.push(format!("{} row {line}: invalid amount, skipped.", file.name));
                    continue;
                };
                staged.push(PendingComponent {
                    employee_id: emp.to_string(),
                    kind,
                    item: ComponentLineItem {
                        reason: cell(row, "reason").to_string(),
                        amount,
                        source_file: stored.clone(),
                        attachment_url: None,
                    },
                });
            }
        }
        let count = staged.len();
        st.components.extend(staged);
        Ok(UploadResp {
            message: format!("{count} {} records processed.", kind.as_str()),
            warnings,
        })
    }
}
