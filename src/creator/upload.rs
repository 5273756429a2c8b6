use std::sync::LazyLock;

use regex::Regex;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use super::{CreatorClient, ForwardError, SubmissionResult, read_json};

static SEGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("valid regex"));

const SKIP_WORKFLOW: &str = r#"["schedules","form_workflow"]"#;
const CODE_SUCCESS: i64 = 3000;

/// Record IDs and field names are spliced into the URL path.
pub fn is_valid_segment(segment: &str) -> bool {
    SEGMENT_RE.is_match(segment)
}

impl CreatorClient {
    /// Upload a PDF into a file field of an existing record.
    ///
    /// Only token failures come back as `Err`.
    pub async fn attach(
        &self,
        record_id: &str,
        field_name: &str,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<SubmissionResult, ForwardError> {
        if !is_valid_segment(record_id) || !is_valid_segment(field_name) {
            return Ok(SubmissionResult::failed(
                format!("Failed to upload file to {field_name}: invalid record or field name"),
                None,
            ));
        }

        let credential = self.tokens.get_valid_token().await?;

        let url = format!(
            "{}/{}/{}/report/{}/{}/{}/upload",
            self.config.data_base,
            self.config.org_id,
            self.config.app_id,
            self.config.report_name,
            record_id,
            field_name
        );

        let part = match Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/pdf")
        {
            Ok(part) => part,
            Err(e) => {
                return Ok(SubmissionResult::failed(
                    format!("Failed to upload file to {field_name}: {e}"),
                    None,
                ));
            }
        };

        tracing::info!(record_id, field_name, file_name, "Uploading file to Creator");

        let resp = self
            .http
            .post(&url)
            .header("Authorization", Self::authorization(&credential.token))
            .query(&[("skip_workflow", SKIP_WORKFLOW)])
            .multipart(Form::new().part("file", part))
            .send()
            .await;

        let body = match resp {
            Ok(resp) => read_json(resp).await,
            Err(e) => Err(ForwardError::Transport(e.to_string())),
        };

        let body = match body {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(record_id, field_name, "File upload failed: {e}");
                return Ok(SubmissionResult::failed(
                    format!("Failed to upload file to {field_name}: {e}"),
                    None,
                ));
            }
        };

        if body.get("code").and_then(Value::as_i64) == Some(CODE_SUCCESS) {
            tracing::info!(record_id, field_name, "File uploaded");
            return Ok(SubmissionResult::succeeded(
                Some(record_id.to_string()),
                format!("File uploaded to {field_name}"),
            ));
        }

        let message = body
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or("Unknown error");
        tracing::warn!(record_id, field_name, "Creator refused upload: {message}");
        Ok(SubmissionResult::failed(
            ForwardError::Upload(message.to_string()).to_string(),
            Some(body),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creator::test_support::{ManualClock, TOKEN_BODY, config};
    use mockito::{Matcher, Mock, Server, ServerGuard};
    use serde_json::json;

    const UPLOAD_PATH: &str = "/creator/v2.1/data/fund/grants/report/All_Gap_Concept_Paper/4400/Concept_Paper_PDF/upload";

    async fn client(server: &mut ServerGuard) -> (CreatorClient, Mock) {
        let token = server
            .mock("POST", "/oauth/v2/token")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(TOKEN_BODY)
            .create_async()
            .await;
        let client = CreatorClient::with_clock(config(&server.url()), ManualClock::new()).unwrap();
        (client, token)
    }

    #[test]
    fn segments_reject_path_characters() {
        assert!(is_valid_segment("4400"));
        assert!(is_valid_segment("Concept_Paper_PDF"));
        assert!(!is_valid_segment("../admin"));
        assert!(!is_valid_segment("a/b"));
        assert!(!is_valid_segment(""));
    }

    #[tokio::test]
    async fn code_3000_is_success() {
        let mut server = Server::new_async().await;
        let (client, _token) = client(&mut server).await;
        let mock = server
            .mock("POST", UPLOAD_PATH)
            .match_query(Matcher::UrlEncoded(
                "skip_workflow".into(),
                SKIP_WORKFLOW.into(),
            ))
            .match_header("authorization", "Zoho-oauthtoken tok-1")
            .match_body(Matcher::Regex("%PDF-1.4".into()))
            .with_status(200)
            .with_body(json!({ "code": 3000 }).to_string())
            .create_async()
            .await;

        let result = client
            .attach("4400", "Concept_Paper_PDF", b"%PDF-1.4 body".to_vec(), "paper.pdf")
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.record_id.as_deref(), Some("4400"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn refusal_carries_message_and_body() {
        let mut server = Server::new_async().await;
        let (client, _token) = client(&mut server).await;
        let _mock = server
            .mock("POST", UPLOAD_PATH)
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(json!({ "code": 3100, "message": "File too large" }).to_string())
            .create_async()
            .await;

        let result = client
            .attach("4400", "Concept_Paper_PDF", b"%PDF".to_vec(), "paper.pdf")
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.message, "Upload failed: File too large");
        assert_eq!(result.error.unwrap()["code"], 3100);
    }

    #[tokio::test]
    async fn missing_message_reads_unknown_error() {
        let mut server = Server::new_async().await;
        let (client, _token) = client(&mut server).await;
        let _mock = server
            .mock("POST", UPLOAD_PATH)
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("{}")
            .create_async()
            .await;

        let result = client
            .attach("4400", "Concept_Paper_PDF", b"%PDF".to_vec(), "paper.pdf")
            .await
            .unwrap();
        assert_eq!(result.message, "Upload failed: Unknown error");
    }

    #[tokio::test]
    async fn invalid_segments_never_reach_creator() {
        let mut server = Server::new_async().await;
        let token = server
            .mock("POST", "/oauth/v2/token")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let client = CreatorClient::with_clock(config(&server.url()), ManualClock::new()).unwrap();

        let result = client
            .attach("../x", "Concept_Paper_PDF", vec![], "paper.pdf")
            .await
            .unwrap();
        assert!(!result.success);
        token.assert_async().await;
    }
}
