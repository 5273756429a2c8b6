use serde_json::{Value, json};

use super::{CreatorClient, ForwardError, SubmissionResult, describe, read_json};
use crate::mapping::{ExternalRecord, FormVariant};

const CODE_VALIDATION: i64 = 3002;
const CODE_FIELD_VALUE: i64 = 3001;

impl CreatorClient {
    /// Create one record in the form that belongs to `variant`.
    ///
    /// Token and transport failures are returned as `Err`; anything Creator
    /// answered with is folded into a [`SubmissionResult`].
    pub async fn submit(
        &self,
        record: &ExternalRecord,
        variant: FormVariant,
    ) -> Result<SubmissionResult, ForwardError> {
        let credential = self.tokens.get_valid_token().await?;

        let url = format!(
            "{}/{}/{}/form/{}",
            self.config.api_base,
            self.config.org_id,
            self.config.app_id,
            self.form_name(variant)
        );

        tracing::info!(%variant, fields = record.len(), "Creating Creator record");

        let resp = self
            .http
            .post(&url)
            .header("Authorization", Self::authorization(&credential.token))
            .json(&json!({ "data": record }))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(%variant, "Creator record request failed: {e}");
                ForwardError::Transport(e.to_string())
            })?;

        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            // Revoked before its advertised expiry.
            self.tokens.invalidate().await;
        }

        let body = match read_json(resp).await {
            Ok(body) => body,
            Err(ForwardError::Protocol(msg)) => {
                tracing::warn!(%variant, "{msg}");
                return Ok(SubmissionResult::failed(
                    ForwardError::Protocol(msg).to_string(),
                    None,
                ));
            }
            Err(e) => return Err(e),
        };

        match classify_create_response(&body) {
            Ok(record_id) => {
                tracing::info!(%variant, record_id = %record_id, "Creator record created");
                Ok(SubmissionResult::succeeded(
                    Some(record_id),
                    format!("{} submitted successfully", variant.label()),
                ))
            }
            Err(e) => {
                tracing::warn!(%variant, "Creator rejected record: {e}");
                Ok(SubmissionResult::failed(e.to_string(), Some(body)))
            }
        }
    }
}

/// Turn a record-create response into the new record's ID or a typed error.
pub fn classify_create_response(body: &Value) -> Result<String, ForwardError> {
    match body.get("code").and_then(Value::as_i64) {
        Some(CODE_VALIDATION) => {
            let detail = match body.get("error") {
                Some(Value::Object(fields)) => fields
                    .values()
                    .map(describe)
                    .collect::<Vec<_>>()
                    .join(", "),
                Some(other) => describe(other),
                None => message_or_code(body),
            };
            return Err(ForwardError::Validation(detail));
        }
        Some(CODE_FIELD_VALUE) => {
            let detail = match body.get("error") {
                Some(Value::Array(items)) => {
                    items.iter().map(describe).collect::<Vec<_>>().join(", ")
                }
                Some(other) => describe(other),
                None => message_or_code(body),
            };
            return Err(ForwardError::FieldValue(detail));
        }
        _ => {}
    }

    let id = body.get("data").and_then(|data| data.get("ID"));
    match id {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => {
            let snippet: String = body.to_string().chars().take(super::MAX_ECHOED_BODY).collect();
            Err(ForwardError::Protocol(snippet))
        }
    }
}

fn message_or_code(body: &Value) -> String {
    body.get("message")
        .map(describe)
        .unwrap_or_else(|| "no details provided".to_string())
}
