use std::collections::HashMap;

use crate::services::llm::{ModelClientError, OllamaClient};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Connection settings for [`OllamaClient`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientConfig {
    pub base_url: Option<String>,
    pub extra_headers: Option<HashMap<String, String>>,
}

impl ClientConfig {
    /// Read the server location from `OLLAMA_HOST`, if set.
    pub fn from_env() -> Self {
        let base_url = std::env::var("OLLAMA_HOST")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|v| normalize_base_url(&v));
        Self {
            base_url,
            extra_headers: None,
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn extra_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn extra_headers(mut self, extra_headers: HashMap<String, String>) -> Self {
        self.extra_headers = Some(extra_headers);
        self
    }

    /// The configured base URL without a trailing slash, or the local default.
    pub fn resolved_base_url(&self) -> String {
        match &self.base_url {
            Some(url) => normalize_base_url(url),
            None => DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn build(self) -> Result<OllamaClient, ModelClientError> {
        OllamaClient::new(self)
    }
}

fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}
