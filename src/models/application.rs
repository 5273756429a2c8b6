use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const STATUS_DRAFT: &str = "draft";
pub const STATUS_SUBMITTED: &str = "submitted";

const REFERENCE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub reference: String,
    pub form_variant: Option<String>,
    pub status: String,
    pub data: serde_json::Value,
    pub metadata: serde_json::Value,
    pub current_step: i32,
    pub completed_steps: Vec<i32>,
    pub organization_age_score: i32,
    pub organization_type_score: i32,
    pub operational_status_score: i32,
    pub auto_score: i32,
    pub eligible: Option<bool>,
    pub eligibility_reason: Option<String>,
    pub external_record_id: Option<String>,
    pub forwarding_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// List projection.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ApplicationSummary {
    pub id: Uuid,
    pub reference: String,
    pub organization_name: Option<String>,
    pub contact_name: Option<String>,
    pub status: String,
    pub auto_score: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `APP-<unix millis>-<5 uppercase alphanumerics>`.
pub fn generate_reference(now: DateTime<Utc>) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..5)
        .map(|_| REFERENCE_CHARSET[rng.random_range(0..REFERENCE_CHARSET.len())] as char)
        .collect();
    format!("APP-{}-{suffix}", now.timestamp_millis())
}
