use std::fmt;

use futures::future::BoxFuture;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Client,
};
use serde_json::Value;
use tracing::{debug, error, span, Instrument, Level};

use crate::services::llm::{ClientConfig, ModelClientError};

pub type TransportFuture<'a> = BoxFuture<'a, Result<Value, ModelClientError>>;

/// The HTTP collaborator the chat controller delegates to.
///
/// Implementations map connection failures to [`ModelClientError::Request`],
/// undecodable bodies to [`ModelClientError::Serialization`] and bodies that
/// carry an `error` field to [`ModelClientError::Api`]. Retrying is their
/// business; the controller never retries.
pub trait Transport: Send + Sync + fmt::Debug {
    fn post<'a>(&'a self, endpoint: &'a str, payload: Value) -> TransportFuture<'a>;
}

/// [`Transport`] speaking JSON over HTTP to an Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    pub client: Client,
    pub base_url: String,
}

impl OllamaClient {
    pub fn new(cfg: ClientConfig) -> Result<Self, ModelClientError> {
        let base_url = cfg.resolved_base_url();

        let mut headers = HeaderMap::new();
        for (name, value) in cfg.extra_headers.unwrap_or_default() {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ModelClientError::Config(format!("Invalid header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(&value)
                .map_err(|e| ModelClientError::Config(format!("Invalid value for header '{name}': {e}")))?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ModelClientError::Config(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    async fn post_json(&self, endpoint: &str, request_body: &Value) -> Result<Value, ModelClientError> {
        let url = format!("{}{}", self.base_url, endpoint);

        let span = span!(
            Level::INFO,
            "Ollama HTTP Request",
            "http.request.method" = "POST",
            "url.full" = url.as_str(),
        );

        async {
            let response = self
                .client
                .post(&url)
                .json(request_body)
                .send()
                .await
                .map_err(|e| {
                    error!(error = %e, "connection failed");
                    ModelClientError::Request(format!("Failed to connect to Ollama API at {url}: {e}"))
                })?;

            let status = response.status();
            let response_text = response.text().await.map_err(|e| {
                ModelClientError::Request(format!("Failed to read response from {url}: {e}"))
            })?;

            let parsed = serde_json::from_str::<Value>(&response_text);

            if let Ok(body) = &parsed {
                if let Some(api_error) = body.get("error") {
                    let message = api_error
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| api_error.to_string());
                    error!(%status, error = %message, "api reported an error");
                    return Err(ModelClientError::Api(format!(
                        "Ollama API error from {endpoint}: {message}"
                    )));
                }
            }

            if !status.is_success() {
                error!(%status, body = %response_text, "request failed");
                return Err(ModelClientError::Api(format!(
                    "Ollama request to {endpoint} failed: {status} - {response_text}"
                )));
            }

            match parsed {
                Ok(body) => {
                    debug!(%status, "response received");
                    Ok(body)
                }
                Err(e) => {
                    error!(%e, raw = %response_text, "deserialization error");
                    Err(ModelClientError::Serialization(format!(
                        "Invalid JSON response from {url}: {e}. Raw body was: '{response_text}'"
                    )))
                }
            }
        }
        .instrument(span)
        .await
    }
}

impl Transport for OllamaClient {
    fn post<'a>(&'a self, endpoint: &'a str, payload: Value) -> TransportFuture<'a> {
        Box::pin(async move { self.post_json(endpoint, &payload).await })
    }
}
