use serde_json::Value;

use super::{CreatorClient, ForwardError, describe, read_json};

const MAX_RECORDS: &str = "200";

/// Columns requested from the concept paper report.
pub const REPORT_FIELDS: &[&str] = &[
    "Project_Title",
    "Organization",
    "Organization_Name",
    "Contact_Name",
    "Email",
    "Project_Summary",
    "Goal",
    "Thematic_Area",
    "Primary_Belize_Fund_Thematic_Area",
    "Secondary_Thematic_Area_if_applicable",
    "Proposed_Start_Date",
    "Expected_End_Date",
    "Duration_Months",
    "Total2",
    "Total_Co_Financing",
    "Total_Project_Estimated_Cost",
    "Organization_Address",
    "Type_of_Organization",
    "Detailed_Location_Description",
    "Latitude",
    "Longitude",
    "Date_of_incorporation_of_Organization",
    "Position",
    "Telephone",
    "Project_Theme",
    "Award_Category1",
];

impl CreatorClient {
    /// Read up to 200 concept paper records.
    pub async fn fetch_report(&self) -> Result<Vec<Value>, ForwardError> {
        let credential = self.tokens.get_valid_token().await?;

        let url = format!(
            "{}/{}/{}/report/{}",
            self.config.data_base, self.config.org_id, self.config.app_id, self.config.report_name
        );
        let fields = REPORT_FIELDS.join(",");

        let resp = self
            .http
            .get(&url)
            .header("Authorization", Self::authorization(&credential.token))
            .query(&[
                ("max_records", MAX_RECORDS),
                ("field_config", "custom"),
                ("fields", fields.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ForwardError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = read_json(resp).await?;

        match body.get("data") {
            Some(Value::Array(rows)) => {
                tracing::debug!(rows = rows.len(), "Fetched concept paper report");
                Ok(rows.clone())
            }
            _ if status.is_success() && body.get("code").and_then(Value::as_i64) == Some(3100) => {
                // "No records found" comes back as a coded response rather than an empty list.
                Ok(Vec::new())
            }
            _ => {
                let detail = body.get("message").map(describe).unwrap_or_else(|| body.to_string());
                tracing::warn!(%status, "Concept paper report failed: {detail}");
                Err(ForwardError::Protocol(detail))
            }
        }
    }
}
