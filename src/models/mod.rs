// src/models/mod.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

pub type ResultId = i64;
pub type RunId = i64;

/// Source label the backend stamps on components entered by hand.
pub const MANUAL_ENTRY: &str = "Manual Entry";

// Django serializes blank char fields as `null`.
fn null_as_empty<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(de)?.unwrap_or_default())
}

// ───────────────────────────────────────
// Reference data
// ───────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub employee_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    pub base_salary: Decimal,
}

impl Employee {
    /// Case-insensitive substring match on name or id.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || self.name.to_lowercase().contains(&term)
            || self.employee_id.to_lowercase().contains(&term)
    }
}

// ───────────────────────────────────────
// Result status & facets
// ───────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Pending,
    Approved,
    Rejected,
}

impl ResultStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResultStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Incentive,
    Deduction,
}

impl ComponentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Incentive => "incentive",
            Self::Deduction => "deduction",
        }
    }
}

impl FromStr for ComponentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "incentive" | "incentives" => Ok(Self::Incentive),
            "deduction" | "deductions" => Ok(Self::Deduction),
            other => Err(format!("unknown component type '{other}'")),
        }
    }
}

// ───────────────────────────────────────
// Payroll results (working set)
// ───────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentLineItem {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub reason: String,
    pub amount: Decimal,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
}

impl ComponentLineItem {
    pub fn is_manual(&self) -> bool {
        self.source_file == MANUAL_ENTRY
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentsSnapshot {
    #[serde(default)]
    pub incentives: Vec<ComponentLineItem>,
    #[serde(default)]
    pub deductions: Vec<ComponentLineItem>,
}

impl ComponentsSnapshot {
    pub fn bucket(&self, kind: ComponentKind) -> &[ComponentLineItem] {
        match kind {
            ComponentKind::Incentive => &self.incentives,
            ComponentKind::Deduction => &self.deductions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollResult {
    pub id: ResultId,
    pub employee: Employee,                 // snapshot, not a live reference
    pub total_incentives: Decimal,
    pub total_deductions: Decimal,
    pub final_salary: Decimal,
    pub status: ResultStatus,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub components_snapshot: ComponentsSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl PayrollResult {
    /// A decided result can no longer be approved or rejected.
    pub fn is_locked(&self) -> bool {
        self.status != ResultStatus::Pending
    }
}

// ───────────────────────────────────────
// History (archived runs)
// ───────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollRunSummary {
    pub id: RunId,
    #[serde(default)]
    pub run_name: Option<String>,
    pub run_timestamp: DateTime<Utc>,
}

impl PayrollRunSummary {
    pub fn label(&self) -> String {
        run_label(self.run_name.as_deref(), self.run_timestamp)
    }
}

pub fn run_label(run_name: Option<&str>, run_timestamp: DateTime<Utc>) -> String {
    match run_name.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!(
            "Payroll Run - {}",
            run_timestamp.format("%Y-%m-%d %H:%M:%S")
        ),
    }
}

/// Frozen copy of a result inside an archived run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedResult {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<RunId>,
    pub employee_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub employee_name: String,
    pub base_salary: Decimal,
    pub total_incentives: Decimal,
    pub total_deductions: Decimal,
    pub final_salary: Decimal,
    pub status: ResultStatus,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub components_snapshot: ComponentsSnapshot,
}

// ───────────────────────────────────────
// DTOs for endpoints
// ───────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasonBody {
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveBody {
    pub run_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResp {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResp {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// A file picked for upload: display name plus raw bytes.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ManualComponent {
    pub employee_id: String,
    pub amount: Decimal,
    pub reason: String,
    pub attachment: Option<UploadFile>,
}
