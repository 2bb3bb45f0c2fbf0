//! Single-shot requests against the chat completion endpoint.
//!
//! A call either yields the assistant content or a [`RequestError`]; there is
//! no retry here. Retrying across credentials belongs to
//! [`crate::core::failover`].

use std::error::Error;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::api::{ChatMessage, ChatRequest, ChatResponse};
use crate::core::credentials::Credential;
use crate::core::message::Turn;
use crate::utils::url::construct_api_url;

/// Failure of one request with one credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// The request never produced an HTTP response.
    TransportFailure(String),
    /// The server answered with a non-success status.
    RejectedByServer { status: u16, summary: String },
    /// Success status, but the body lacked `choices[0].message.content`.
    MalformedResponse(String),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::TransportFailure(detail) => write!(f, "transport failure: {detail}"),
            RequestError::RejectedByServer { status, summary } => {
                write!(f, "rejected by server ({status}): {summary}")
            }
            RequestError::MalformedResponse(detail) => write!(f, "malformed response: {detail}"),
        }
    }
}

impl Error for RequestError {}

#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(
        &self,
        turns: &[Turn],
        credential: &Credential,
        temperature: f32,
    ) -> Result<String, RequestError>;
}

#[derive(Clone)]
pub struct HttpCompletionClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl HttpCompletionClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url, model))
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, turns: &[Turn], temperature: f32) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: turns.iter().map(ChatMessage::from).collect(),
            temperature,
        }
    }
}

#[async_trait]
impl CompletionBackend for HttpCompletionClient {
    async fn complete(
        &self,
        turns: &[Turn],
        credential: &Credential,
        temperature: f32,
    ) -> Result<String, RequestError> {
        let url = construct_api_url(&self.base_url, "chat/completions");
        let request = self.build_request(turns, temperature);
        debug!(%url, turns = turns.len(), "sending completion request");

        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .bearer_auth(credential.secret())
            .json(&request)
            .send()
            .await
            .map_err(|err| RequestError::TransportFailure(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| RequestError::TransportFailure(err.to_string()))?;

        if !status.is_success() {
            return Err(RequestError::RejectedByServer {
                status: status.as_u16(),
                summary: summarize_error_body(&body),
            });
        }

        parse_completion_body(&body)
    }
}

/// Extracts `choices[0].message.content` from a success body.
pub fn parse_completion_body(body: &str) -> Result<String, RequestError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|err| RequestError::MalformedResponse(format!("invalid JSON: {err}")))?;
    parsed.into_first_content().ok_or_else(|| {
        RequestError::MalformedResponse("missing choices[0].message.content".to_string())
    })
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value
                .get("error")
                .and_then(|v| v.as_str().map(str::to_owned))
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Reduces an error body to one line suitable for a log record.
pub fn summarize_error_body(body: &str) -> String {
    const MAX_CHARS: usize = 200;

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(summary) = extract_error_summary(&json).filter(|s| !s.is_empty()) {
            return summary;
        }
    }

    let collapsed = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > MAX_CHARS {
        let mut cut: String = collapsed.chars().take(MAX_CHARS).collect();
        cut.push('…');
        cut
    } else {
        collapsed
    }
}
