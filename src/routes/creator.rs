use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::config::MAX_UPLOAD_BYTES;
use crate::creator::{ForwardError, upload};
use crate::error::AppError;
use crate::mapping::FormVariant;
use crate::state::SharedState;
use crate::submission::payload::Payload;
use crate::submission::pipeline::{self, Intake, Outcome};
use crate::submission::{metadata, parser, validation};

pub async fn submit_concept(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    intake(&state, FormVariant::Concept, addr, &headers, body).await
}

pub async fn submit_proposal(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    intake(&state, FormVariant::Proposal, addr, &headers, body).await
}

pub async fn submit_community_proposal(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    intake(&state, FormVariant::CommunityProposal, addr, &headers, body).await
}

async fn intake(
    state: &SharedState,
    variant: FormVariant,
    addr: SocketAddr,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let raw = parser::parse_request(headers, body)
        .await
        .map_err(AppError::BadRequest)?;
    let payload = Payload::from_value(raw);

    validation::validate(&payload, variant).map_err(AppError::Validation)?;

    let client_ip =
        metadata::client_ip(headers, Some(addr.ip()), &state.config.trusted_proxies);

    tracing::info!(%variant, fields = payload.as_map().len(), "Received submission");

    let outcome = pipeline::run(
        state,
        Intake {
            variant,
            payload,
            client_ip,
            metadata: metadata::extract(headers, client_ip),
            existing: None,
        },
    )
    .await?;

    Ok(outcome_response(variant, outcome))
}

/// 403 for ineligible applicants, otherwise 200 whether or not forwarding worked.
pub(crate) fn outcome_response(variant: FormVariant, outcome: Outcome) -> Response {
    if !outcome.eligibility.eligible {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "success": false,
                "eligibility": false,
                "message": outcome.eligibility.reason,
                "application_id": outcome.application_id,
                "reference": outcome.reference,
            })),
        )
            .into_response();
    }

    let forwarded = outcome.forwarding.as_ref().is_some_and(|r| r.success);
    let record_id = outcome.forwarding.as_ref().and_then(|r| r.record_id.clone());
    let forwarding_error = outcome
        .forwarding
        .as_ref()
        .filter(|r| !r.success)
        .map(|r| r.message.clone());

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "eligibility": true,
            "message": format!("{} submitted successfully", variant.label()),
            "application_id": outcome.application_id,
            "reference": outcome.reference,
            "forwarded": forwarded,
            "record_id": record_id,
            "forwarding_error": forwarding_error,
        })),
    )
        .into_response()
}

pub async fn upload_file(
    State(state): State<SharedState>,
    Path((record_id, field_name)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    if !upload::is_valid_segment(&record_id) || !upload::is_valid_segment(&field_name) {
        return Err(AppError::BadRequest(
            "Invalid record ID or field name".to_string(),
        ));
    }

    let is_multipart = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("multipart/form-data"));
    if !is_multipart {
        return Err(AppError::BadRequest("No file uploaded.".to_string()));
    }

    let parsed = parser::parse_multipart(&headers, body)
        .await
        .map_err(AppError::BadRequest)?;

    let file = parsed
        .files
        .into_iter()
        .find(|f| f.field_name == "file")
        .ok_or_else(|| AppError::BadRequest("No file uploaded.".to_string()))?;

    if !file.is_pdf() {
        return Err(AppError::BadRequest("Only PDF files are allowed".to_string()));
    }
    if file.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::BadRequest(
            "File exceeds the 10 MB limit".to_string(),
        ));
    }

    tracing::info!(
        record_id,
        field_name,
        file_name = %file.file_name,
        size = file.bytes.len(),
        "Received file upload"
    );

    let result = state
        .creator
        .attach(&record_id, &field_name, file.bytes.to_vec(), &file.file_name)
        .await
        .map_err(|e| AppError::BadGateway(e.to_string(), None))?;

    if !result.success {
        return Err(AppError::BadGateway(result.message, result.error));
    }

    Ok(Json(json!({
        "success": true,
        "message": result.message,
        "record_id": result.record_id,
    })))
}

pub async fn concept_paper_report(
    State(state): State<SharedState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let rows = state.creator.fetch_report().await.map_err(|e| {
        tracing::error!("Concept paper report failed: {e}");
        let detail = match &e {
            ForwardError::Auth(_) => None,
            _ => Some(json!({ "message": e.to_string() })),
        };
        AppError::BadGateway("Failed to fetch concept papers".to_string(), detail)
    })?;

    Ok(Json(json!({ "success": true, "data": rows })))
}
