use std::net::IpAddr;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::creator::SubmissionResult;
use crate::db;
use crate::eligibility::{self, EligibilityOutcome};
use crate::email::templates;
use crate::error::AppError;
use crate::mapping::{self, FormVariant};
use crate::state::SharedState;

use super::payload::Payload;

/// One finalized submission entering the pipeline.
pub struct Intake {
    pub variant: FormVariant,
    pub payload: Payload,
    pub client_ip: IpAddr,
    pub metadata: Value,
    /// Draft to finalize instead of creating a new row.
    pub existing: Option<Uuid>,
}

#[derive(Debug)]
pub struct Outcome {
    pub application_id: Uuid,
    pub reference: String,
    pub eligibility: EligibilityOutcome,
    /// `None` when the submission never reached Creator.
    pub forwarding: Option<SubmissionResult>,
}

pub async fn run(state: &SharedState, intake: Intake) -> Result<Outcome, AppError> {
    let Intake {
        variant,
        payload,
        client_ip,
        metadata,
        existing,
    } = intake;

    if let Err(retry_after) = state.submission_limiter.check(
        variant,
        client_ip,
        state.config.submission_rate_limit,
        state.config.submission_rate_window_secs,
    ) {
        tracing::warn!(%variant, %client_ip, "Submission rate limited");
        return Err(AppError::RateLimited(format!(
            "Rate limited. Retry after {retry_after}s"
        )));
    }

    let application = match existing {
        Some(id) => db::applications::mark_submitted(
            &state.pool,
            id,
            &payload.clone().into_value(),
            variant,
            &metadata,
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Application not found".to_string()))?,
        None => {
            db::applications::create_submitted(
                &state.pool,
                variant,
                &payload.clone().into_value(),
                &metadata,
            )
            .await?
        }
    };

    // Drafts accumulate data over several requests; judge the merged whole.
    let payload = Payload::from_value(application.data.clone());

    let outcome = eligibility::evaluate_payload(&payload, Utc::now().date_naive());
    db::applications::record_eligibility(&state.pool, application.id, &outcome).await?;

    if !outcome.eligible {
        tracing::info!(
            application = %application.reference,
            %variant,
            reason = %outcome.reason,
            "Submission ineligible"
        );
        let html = templates::render_ineligible(
            &applicant_name(&payload),
            variant,
            &outcome.reason,
            &state.config.organization_name,
        );
        notify(state, &payload, &templates::ineligible_subject(variant), html).await;

        return Ok(Outcome {
            application_id: application.id,
            reference: application.reference,
            eligibility: outcome,
            forwarding: None,
        });
    }

    let record = mapping::map_submission(&payload, variant);
    let result = match state.creator.submit(&record, variant).await {
        Ok(result) => result,
        Err(e) => SubmissionResult::failed(e.to_string(), None),
    };

    if result.success {
        tracing::info!(
            application = %application.reference,
            record_id = ?result.record_id,
            "Submission forwarded to Creator"
        );
    } else {
        tracing::error!(
            application = %application.reference,
            %variant,
            "Forwarding to Creator failed: {}",
            result.message
        );
    }

    let forwarding_error = (!result.success).then_some(result.message.as_str());
    if let Err(e) = db::applications::record_forwarding(
        &state.pool,
        application.id,
        result.record_id.as_deref(),
        forwarding_error,
    )
    .await
    {
        tracing::error!(application = %application.reference, "Failed to record forwarding outcome: {e}");
    }

    let html = templates::render_success(
        &applicant_name(&payload),
        variant,
        &state.config.organization_name,
    );
    notify(state, &payload, &templates::success_subject(variant), html).await;

    Ok(Outcome {
        application_id: application.id,
        reference: application.reference,
        eligibility: outcome,
        forwarding: Some(result),
    })
}

fn applicant_name(payload: &Payload) -> String {
    payload
        .text("contactName")
        .unwrap_or_else(|| "Applicant".to_string())
}

fn recipient(payload: &Payload) -> Option<String> {
    payload.text("contactEmail").or_else(|| payload.text("email"))
}

/// Send without affecting the outcome; failures are only logged.
async fn notify(
    state: &SharedState,
    payload: &Payload,
    subject: &str,
    html: Result<String, String>,
) {
    let Some(notifier) = state.notifier.as_ref() else {
        tracing::warn!(subject, "SMTP not configured, skipping notification");
        return;
    };
    let Some(to) = recipient(payload) else {
        tracing::warn!(subject, "No recipient address on submission, skipping notification");
        return;
    };
    let html = match html {
        Ok(html) => html,
        Err(e) => {
            tracing::error!(subject, "{e}");
            return;
        }
    };

    if let Err(e) = notifier.send_templated_email(&to, subject, &html).await {
        tracing::warn!(subject, "Failed to send notification: {e}");
    }
}
