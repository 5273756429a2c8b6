use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::db;
use crate::error::AppError;
use crate::mapping::FormVariant;
use crate::models::{Application, ApplicationSummary};
use crate::state::SharedState;
use crate::submission::payload::Payload;
use crate::submission::pipeline::{self, Intake};
use crate::submission::{metadata, parser};

use super::creator::outcome_response;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRequest {
    pub current_step: Option<i32>,
    #[serde(default)]
    pub step_data: Value,
    pub completed_steps: Option<Vec<i32>>,
}

fn require_object(body: Value) -> Result<Value, AppError> {
    if body.is_object() {
        Ok(body)
    } else {
        Err(AppError::BadRequest("Request body must be an object".to_string()))
    }
}

pub async fn list(
    State(state): State<SharedState>,
) -> Result<Json<Vec<ApplicationSummary>>, AppError> {
    Ok(Json(db::applications::list(&state.pool).await?))
}

pub async fn list_by_status(
    State(state): State<SharedState>,
    Path(status): Path<String>,
) -> Result<Json<Vec<ApplicationSummary>>, AppError> {
    Ok(Json(
        db::applications::list_by_status(&state.pool, &status).await?,
    ))
}

pub async fn create(
    State(state): State<SharedState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Application>), AppError> {
    let body = require_object(body)?;
    let app = db::applications::create(&state.pool, &body).await?;
    tracing::info!(application = %app.reference, "Draft application created");
    Ok((StatusCode::CREATED, Json(app)))
}

pub async fn get(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Application>, AppError> {
    let app = db::applications::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Application not found".to_string()))?;
    Ok(Json(app))
}

pub async fn update(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> Result<Json<Application>, AppError> {
    let body = require_object(body)?;
    let app = db::applications::update(&state.pool, id, &body)
        .await?
        .ok_or_else(|| AppError::NotFound("Application not found".to_string()))?;
    Ok(Json(app))
}

pub async fn save_progress(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ProgressRequest>,
) -> Result<Json<Application>, AppError> {
    let step_data = match req.step_data {
        Value::Null => json!({}),
        other => require_object(other)?,
    };

    let app = db::applications::save_progress(
        &state.pool,
        id,
        &step_data,
        req.current_step,
        req.completed_steps.as_deref(),
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Application not found".to_string()))?;

    tracing::debug!(application = %app.reference, step = app.current_step, "Progress saved");
    Ok(Json(app))
}

/// Finalize a draft as a GAP proposal and run it through intake.
pub async fn submit(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let patch = if body.is_empty() {
        json!({})
    } else {
        parser::parse_request(&headers, body)
            .await
            .map_err(AppError::BadRequest)?
    };

    let client_ip =
        metadata::client_ip(&headers, Some(addr.ip()), &state.config.trusted_proxies);

    let outcome = pipeline::run(
        &state,
        Intake {
            variant: FormVariant::Proposal,
            payload: Payload::from_value(patch),
            client_ip,
            metadata: metadata::extract(&headers, client_ip),
            existing: Some(id),
        },
    )
    .await?;

    Ok(outcome_response(FormVariant::Proposal, outcome))
}

pub async fn delete(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    if !db::applications::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("Application not found".to_string()));
    }
    tracing::info!(%id, "Application deleted");
    Ok(Json(json!({ "message": "Application deleted successfully" })))
}
