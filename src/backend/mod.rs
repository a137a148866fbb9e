// src/backend/mod.rs

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DeskResult;
use crate::models::{
    ArchivedResult, ComponentKind, Employee, ManualComponent, MessageResp, PayrollResult,
    PayrollRunSummary, ResultId, ResultStatus, RunId, UploadFile, UploadResp,
};

pub mod http;
pub mod ledger;

pub use http::HttpBackend;
pub use ledger::Ledger;

/// Parameters of the results listing. `None` means "not constrained".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultQuery {
    pub search: Option<String>,
    pub status: Option<ResultStatus>,
}

impl ResultQuery {
    pub fn new(search: &str, status: Option<ResultStatus>) -> Self {
        let search = search.trim();
        Self {
            search: (!search.is_empty()).then(|| search.to_string()),
            status,
        }
    }
}

/// The REST contract the desk consumes. Calculation lives behind it.
#[async_trait]
pub trait PayrollBackend: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    async fn fetch_results(&self, query: &ResultQuery) -> DeskResult<Vec<PayrollResult>>;
    async fn generate(&self) -> DeskResult<MessageResp>;
    async fn approve(&self, id: ResultId) -> DeskResult<()>;
    async fn reject(&self, id: ResultId, reason: &str) -> DeskResult<()>;
    async fn archive(&self, run_name: &str) -> DeskResult<MessageResp>;

    async fn list_runs(&self) -> DeskResult<Vec<PayrollRunSummary>>;
    async fn run_detail(&self, id: RunId) -> DeskResult<Vec<ArchivedResult>>;
    async fn delete_run(&self, id: RunId) -> DeskResult<()>;

    async fn list_employees(&self) -> DeskResult<Vec<Employee>>;
    async fn manual_add(&self, entry: ManualComponent) -> DeskResult<()>;
    async fn upload_employees(&self, file: UploadFile) -> DeskResult<UploadResp>;
    async fn upload_components(
        &self,
        kind: ComponentKind,
        files: Vec<UploadFile>,
    ) -> DeskResult<UploadResp>;
}
