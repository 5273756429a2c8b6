pub mod records;
pub mod reports;
pub mod token;
pub mod upload;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::config::CreatorConfig;
use crate::mapping::FormVariant;

use token::{Clock, SystemClock, TokenCache};

/// Longest slice of a non-JSON response body kept for diagnostics.
const MAX_ECHOED_BODY: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
pub enum ForwardError {
    /// Token exchange failed; nothing was sent.
    Auth(String),
    /// Creator rejected the record (code 3002).
    Validation(String),
    /// Creator rejected individual field values (code 3001).
    FieldValue(String),
    /// Response did not match any known shape.
    Protocol(String),
    Upload(String),
    /// The request never produced a response.
    Transport(String),
}

impl std::fmt::Display for ForwardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForwardError::Auth(msg) => write!(f, "Creator authentication failed: {msg}"),
            ForwardError::Validation(msg) => write!(f, "Creator validation failed: {msg}"),
            ForwardError::FieldValue(msg) => write!(f, "Creator invalid field values: {msg}"),
            ForwardError::Protocol(msg) => write!(f, "Unexpected response from Creator: {msg}"),
            ForwardError::Upload(msg) => write!(f, "Upload failed: {msg}"),
            ForwardError::Transport(msg) => write!(f, "Creator request failed: {msg}"),
        }
    }
}

impl std::error::Error for ForwardError {}

/// Uniform outcome of a record create or file upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionResult {
    pub success: bool,
    pub record_id: Option<String>,
    pub message: String,
    pub error: Option<serde_json::Value>,
}

impl SubmissionResult {
    pub fn succeeded(record_id: Option<String>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            record_id,
            message: message.into(),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>, error: Option<serde_json::Value>) -> Self {
        Self {
            success: false,
            record_id: None,
            message: message.into(),
            error,
        }
    }
}

pub struct CreatorClient {
    http: reqwest::Client,
    config: CreatorConfig,
    tokens: TokenCache,
}

impl CreatorClient {
    pub fn new(config: CreatorConfig) -> Result<Self, String> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: CreatorConfig, clock: Arc<dyn Clock>) -> Result<Self, String> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {e}"))?;

        let tokens = TokenCache::new(http.clone(), &config, clock);

        Ok(Self {
            http,
            config,
            tokens,
        })
    }

    pub fn form_name(&self, variant: FormVariant) -> &str {
        match variant {
            FormVariant::Concept => &self.config.concept_form,
            FormVariant::Proposal => &self.config.proposal_form,
            FormVariant::CommunityProposal => &self.config.community_form,
        }
    }

    fn authorization(token: &str) -> String {
        format!("Zoho-oauthtoken {token}")
    }
}

/// Parse a response body as JSON, keeping a truncated copy of anything else.
async fn read_json(resp: reqwest::Response) -> Result<serde_json::Value, ForwardError> {
    let status = resp.status();
    let text = resp
        .text()
        .await
        .map_err(|e| ForwardError::Transport(format!("Failed to read response: {e}")))?;

    serde_json::from_str(&text).map_err(|_| {
        let snippet: String = text.chars().take(MAX_ECHOED_BODY).collect();
        ForwardError::Protocol(format!("non-JSON response (HTTP {status}): {snippet}"))
    })
}

/// Render a JSON error payload as readable text.
fn describe(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
