// src/backend/http.rs

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{PayrollBackend, ResultQuery};
use crate::config::DeskConfig;
use crate::error::{extract_message, DeskError, DeskResult};
use crate::models::{
    ArchiveBody, ArchivedResult, ComponentKind, Employee, ManualComponent, MessageResp,
    PayrollResult, PayrollRunSummary, ReasonBody, ResultId, RunId, UploadFile, UploadResp,
};

/// Talks to the payroll service over its REST API.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    config: DeskConfig,
}

impl HttpBackend {
    pub fn new(config: DeskConfig) -> DeskResult<Self> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| DeskError::Transport(format!("reqwest build error: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &DeskConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        self.config.endpoint(path)
    }

    // Non-2xx responses become `Service` errors carrying whatever message the body had.
    async fn check(resp: Response) -> DeskResult<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| extract_message(&v));
        Err(DeskError::Service { status: status.as_u16(), message })
    }

    async fn json<T: DeserializeOwned>(resp: Response) -> DeskResult<T> {
        let resp = Self::check(resp).await?;
        Ok(resp.json::<T>().await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> DeskResult<T> {
        debug!(path, "GET");
        let resp = self.client.get(self.url(path)).send().await?;
        Self::json(resp).await
    }

    async fn post_json<B: serde::Serialize + Sync>(&self, path: &str, body: &B) -> DeskResult<Response> {
        debug!(path, "POST");
        let resp = self.client.post(self.url(path)).json(body).send().await?;
        Self::check(resp).await
    }

    async fn post_form(&self, path: &str, form: Form) -> DeskResult<Response> {
        debug!(path, "POST multipart");
        let resp = self.client.post(self.url(path)).multipart(form).send().await?;
        Self::check(resp).await
    }
}

fn file_part(file: UploadFile) -> Part {
    Part::bytes(file.bytes).file_name(file.name)
}

#[async_trait]
impl PayrollBackend for HttpBackend {
    fn backend_tag(&self) -> &'static str {
        "http"
    }

    async fn fetch_results(&self, query: &ResultQuery) -> DeskResult<Vec<PayrollResult>> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(s) = &query.search {
            params.push(("search", s.clone()));
        }
        if let Some(st) = query.status {
            params.push(("status", st.as_str().to_string()));
        }
        debug!(?params, "GET payroll/results/");
        let resp = self
            .client
            .get(self.url("payroll/results/"))
            .query(&params)
            .send()
            .await?;
        Self::json(resp).await
    }

    async fn generate(&self) -> DeskResult<MessageResp> {
        debug!("POST payroll/generate/");
        let resp = self.client.post(self.url("payroll/generate/")).send().await?;
        Self::json(resp).await
    }

    async fn approve(&self, id: ResultId) -> DeskResult<()> {
        let body = ReasonBody { reason: String::new() };
        self.post_json(&format!("payroll/approve/{id}/"), &body).await?;
        Ok(())
    }

    async fn reject(&self, id: ResultId, reason: &str) -> DeskResult<()> {
        let body = ReasonBody { reason: reason.to_string() };
        self.post_json(&format!("payroll/reject/{id}/"), &body).await?;
        Ok(())
    }

    async fn archive(&self, run_name: &str) -> DeskResult<MessageResp> {
        let body = ArchiveBody { run_name: run_name.to_string() };
        let resp = self.post_json("payroll/archive/", &body).await?;
        Ok(resp.json().await?)
    }

    async fn list_runs(&self) -> DeskResult<Vec<PayrollRunSummary>> {
        self.get("payroll/history/").await
    }

    async fn run_detail(&self, id: RunId) -> DeskResult<Vec<ArchivedResult>> {
        self.get(&format!("payroll/history/{id}/")).await
    }

    async fn delete_run(&self, id: RunId) -> DeskResult<()> {
        let path = format!("payroll/history/{id}/delete/");
        debug!(path, "DELETE");
        let resp = self.client.delete(self.url(&path)).send().await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn list_employees(&self) -> DeskResult<Vec<Employee>> {
        self.get("employees/").await
    }

    async fn manual_add(&self, entry: ManualComponent) -> DeskResult<()> {
        let mut form = Form::new()
            .text("employee", entry.employee_id)
            .text("amount", entry.amount.to_string())
            .text("reason", entry.reason);
        if let Some(att) = entry.attachment {
            form = form.part("attachment", file_part(att));
        }
        self.post_form("components/manual-add/", form).await?;
        Ok(())
    }

    async fn upload_employees(&self, file: UploadFile) -> DeskResult<UploadResp> {
        let form = Form::new().part("file", file_part(file));
        let resp = self.post_form("upload/employee/", form).await?;
        Ok(resp.json().await?)
    }

    async fn upload_components(
        &self,
        kind: ComponentKind,
        files: Vec<UploadFile>,
    ) -> DeskResult<UploadResp> {
        let mut form = Form::new().text("type", kind.as_str());
        for f in files {
            form = form.part("files", file_part(f));
        }
        let resp = self.post_form("upload/component/", form).await?;
        Ok(resp.json().await?)
    }
}
