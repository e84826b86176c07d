//! Reply-generation service client.

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use replykit_config::ServiceConfig;

use crate::error::ReplyError;
use crate::tone::Tone;

/// Sent in place of empty extracted content.
pub const EMPTY_CONTENT_SENTINEL: &str = "No email content found";

const GENERATE_PATH: &str = "/api/generate-reply";
const HEALTH_PATH: &str = "/api";
const MAX_DETAIL_CHARS: usize = 200;

/// Body of `POST /api/generate-reply`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest {
    pub email_content: String,
    pub tone: Tone,
}

impl ReplyRequest {
    /// Empty content is replaced by [`EMPTY_CONTENT_SENTINEL`].
    pub fn new(content: impl Into<String>, tone: Tone) -> Self {
        let content = content.into();
        let email_content = if content.trim().is_empty() {
            EMPTY_CONTENT_SENTINEL.to_string()
        } else {
            content
        };
        Self { email_content, tone }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReplyResponse {
    generated_reply: String,
}

/// The remote reply-generation service.
#[async_trait]
pub trait ReplyClient: Send + Sync {
    /// Request one generated reply. Returns the reply text as-is.
    async fn generate(&self, api_base: &str, request: &ReplyRequest) -> Result<String, ReplyError>;

    /// Liveness probe; returns the service's status text.
    async fn health_check(&self, api_base: &str) -> Result<String, ReplyError>;
}

/// `reqwest`-backed client with a bounded request timeout.
#[derive(Debug, Clone)]
pub struct HttpReplyClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpReplyClient {
    pub fn new(timeout: Duration) -> Result<Self, ReplyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReplyError::Transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, timeout })
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self, ReplyError> {
        Self::new(Duration::from_secs(config.timeout_seconds))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn transport_error(&self, e: reqwest::Error) -> ReplyError {
        if e.is_timeout() {
            ReplyError::Transport(format!("Request timed out after {:?}", self.timeout))
        } else {
            ReplyError::Transport(e.to_string())
        }
    }

    async fn rejected(&self, response: reqwest::Response) -> ReplyError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        ReplyError::Rejected {
            status,
            detail: extract_detail(&body),
        }
    }
}

#[async_trait]
impl ReplyClient for HttpReplyClient {
    async fn generate(&self, api_base: &str, request: &ReplyRequest) -> Result<String, ReplyError> {
        let url = endpoint(api_base, GENERATE_PATH);
        debug!("Requesting {} reply from {}", request.tone, url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(self.rejected(response).await);
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        let parsed: ReplyResponse =
            serde_json::from_str(&body).map_err(|e| ReplyError::Malformed(e.to_string()))?;
        Ok(parsed.generated_reply)
    }

    async fn health_check(&self, api_base: &str) -> Result<String, ReplyError> {
        let url = endpoint(api_base, HEALTH_PATH);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(self.rejected(response).await);
        }
        response.text().await.map_err(|e| self.transport_error(e))
    }
}

fn endpoint(api_base: &str, path: &str) -> String {
    format!("{}{}", api_base.trim_end_matches('/'), path)
}

/// Best-effort message from an error body: a JSON `message` or `error`
/// string, else the trimmed body, capped at 200 characters.
fn extract_detail(body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "error"].into_iter().find_map(|key| match value.get(key) {
                Some(serde_json::Value::String(s)) => Some(s.clone()),
                Some(serde_json::Value::Object(inner)) => inner
                    .get("message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string),
                _ => None,
            })
        });
    let detail = from_json.unwrap_or_else(|| body.trim().to_string());
    detail.chars().take(MAX_DETAIL_CHARS).collect()
}
