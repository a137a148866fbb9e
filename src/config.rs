// src/config.rs

use std::env;
use std::time::Duration;

pub const DEFAULT_API_ROOT: &str = "http://127.0.0.1:8000/api";

#[derive(Debug, Clone)]
pub struct DeskConfig {
    /// Base address every REST path is appended to, without trailing `/`.
    pub api_root: String,
    pub http_timeout: Duration,
    /// How long an upload outcome stays on screen before reverting to idle.
    pub notice_window: Duration,
    pub bind_addr: String,
    pub port: u16,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            api_root: DEFAULT_API_ROOT.to_string(),
            http_timeout: Duration::from_secs(30),
            notice_window: Duration::from_secs(8),
            bind_addr: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

impl DeskConfig {
    pub fn from_env() -> Self {
        // Load environment from .env if present
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        Self {
            api_root: env::var("PAYROLL_API_ROOT")
                .map(|s| s.trim().trim_end_matches('/').to_string())
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.api_root),
            http_timeout: env_parse("PAYROLL_HTTP_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
            notice_window: env_parse("PAYROLL_NOTICE_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.notice_window),
            bind_addr: env::var("PAYROLL_BIND").unwrap_or(defaults.bind_addr),
            port: env_parse("PORT").unwrap_or(defaults.port),
        }
    }

    pub fn with_api_root(mut self, root: impl Into<String>) -> Self {
        self.api_root = root.into().trim_end_matches('/').to_string();
        self
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_root, path.trim_start_matches('/'))
    }

    /// The API root with its `/api` suffix removed; media is served from here.
    pub fn server_root(&self) -> &str {
        self.api_root
            .strip_suffix("/api")
            .unwrap_or(&self.api_root)
    }

    pub fn media_url(&self, stored_name: &str) -> String {
        format!("{}/media/{}", self.server_root(), stored_name)
    }

    /// Attachment urls may come back relative (`/media/x.pdf`) or absolute.
    pub fn resolve_attachment(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}/{}", self.server_root(), url.trim_start_matches('/'))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_urls_strip_api_suffix() {
        let cfg = DeskConfig::default();
        assert_eq!(cfg.server_root(), "http://127.0.0.1:8000");
        assert_eq!(cfg.media_url("june.xlsx"), "http://127.0.0.1:8000/media/june.xlsx");
        assert_eq!(cfg.endpoint("/payroll/results/"), "http://127.0.0.1:8000/api/payroll/results/");
    }

    #[test]
    fn attachment_resolution_keeps_absolute_urls() {
        let cfg = DeskConfig::default().with_api_root("https://pay.example.com/api/");
        assert_eq!(
            cfg.resolve_attachment("/media/proof.pdf"),
            "https://pay.example.com/media/proof.pdf"
        );
        assert_eq!(
            cfg.resolve_attachment("https://cdn.example.com/p.pdf"),
            "https://cdn.example.com/p.pdf"
        );
    }

    #[test]
    fn root_without_api_suffix_is_its_own_server_root() {
        let cfg = DeskConfig::default().with_api_root("http://localhost:9000");
        assert_eq!(cfg.server_root(), "http://localhost:9000");
    }
}
