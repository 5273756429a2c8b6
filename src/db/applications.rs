use chrono::Utc;
use serde_json::Value;
use sqlx::{PgExecutor, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::eligibility::EligibilityOutcome;
use crate::mapping::FormVariant;
use crate::models::application::{STATUS_DRAFT, STATUS_SUBMITTED, generate_reference};
use crate::models::{Application, ApplicationSummary};
use crate::scoring::{self, AutoScore};
use crate::submission::payload::Payload;

const SUMMARY_COLUMNS: &str = "id, reference, data->>'organizationName' AS organization_name,
     data->>'contactName' AS contact_name, status, auto_score, created_at, updated_at";

fn score_of(data: &Value) -> AutoScore {
    scoring::score(&Payload::from_value(data.clone()), Utc::now().date_naive())
}

/// Insert a new draft.
pub async fn create(pool: &PgPool, data: &Value) -> Result<Application, sqlx::Error> {
    insert(pool, data, &Value::Object(Default::default()), STATUS_DRAFT, None).await
}

/// Insert an application that is submitted on arrival.
pub async fn create_submitted(
    pool: &PgPool,
    variant: FormVariant,
    data: &Value,
    metadata: &Value,
) -> Result<Application, sqlx::Error> {
    insert(pool, data, metadata, STATUS_SUBMITTED, Some(variant)).await
}

async fn insert(
    pool: &PgPool,
    data: &Value,
    metadata: &Value,
    status: &str,
    variant: Option<FormVariant>,
) -> Result<Application, sqlx::Error> {
    let now = Utc::now();
    let score = score_of(data);
    let submitted_at = (status == STATUS_SUBMITTED).then_some(now);

    sqlx::query_as::<_, Application>(
        "INSERT INTO applications (id, reference, form_variant, status, data, metadata,
             organization_age_score, organization_type_score, operational_status_score,
             auto_score, created_at, updated_at, submitted_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11, $12) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(generate_reference(now))
    .bind(variant.map(|v| v.as_str()))
    .bind(status)
    .bind(data)
    .bind(metadata)
    .bind(score.organization_age)
    .bind(score.organization_type)
    .bind(score.operational_status)
    .bind(score.total)
    .bind(now)
    .bind(submitted_at)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Application>, sqlx::Error> {
    sqlx::query_as::<_, Application>("SELECT * FROM applications WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Newest first.
pub async fn list(pool: &PgPool) -> Result<Vec<ApplicationSummary>, sqlx::Error> {
    sqlx::query_as::<_, ApplicationSummary>(&format!(
        "SELECT {SUMMARY_COLUMNS} FROM applications ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

pub async fn list_by_status(
    pool: &PgPool,
    status: &str,
) -> Result<Vec<ApplicationSummary>, sqlx::Error> {
    sqlx::query_as::<_, ApplicationSummary>(&format!(
        "SELECT {SUMMARY_COLUMNS} FROM applications WHERE status = $1 ORDER BY created_at DESC"
    ))
    .bind(status)
    .fetch_all(pool)
    .await
}

/// Lock the row, shallow-merge `patch` into its data and store the result
/// with a fresh score. `None` when the row does not exist.
async fn merge_data(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    patch: &Value,
) -> Result<Option<Value>, sqlx::Error> {
    let current: Option<(Value,)> =
        sqlx::query_as("SELECT data FROM applications WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;

    let Some((current,)) = current else {
        return Ok(None);
    };

    let mut merged = Payload::from_value(current);
    merged.merge(&Payload::from_value(patch.clone()));
    let merged = merged.into_value();

    sqlx::query("UPDATE applications SET data = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(&merged)
        .execute(&mut **tx)
        .await?;

    set_auto_score(&mut **tx, id, &score_of(&merged)).await?;

    Ok(Some(merged))
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    patch: &Value,
) -> Result<Option<Application>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    if merge_data(&mut tx, id, patch).await?.is_none() {
        return Ok(None);
    }
    let app = fetch(&mut tx, id).await?;
    tx.commit().await?;
    Ok(Some(app))
}

/// Merge one step's data and record wizard position.
pub async fn save_progress(
    pool: &PgPool,
    id: Uuid,
    step_data: &Value,
    current_step: Option<i32>,
    completed_steps: Option<&[i32]>,
) -> Result<Option<Application>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    if merge_data(&mut tx, id, step_data).await?.is_none() {
        return Ok(None);
    }

    sqlx::query(
        "UPDATE applications
         SET current_step = COALESCE($2, current_step),
             completed_steps = COALESCE($3, completed_steps)
         WHERE id = $1",
    )
    .bind(id)
    .bind(current_step)
    .bind(completed_steps)
    .execute(&mut *tx)
    .await?;

    let app = fetch(&mut tx, id).await?;
    tx.commit().await?;
    Ok(Some(app))
}

/// Merge final data and flip the row to submitted.
pub async fn mark_submitted(
    pool: &PgPool,
    id: Uuid,
    patch: &Value,
    variant: FormVariant,
    metadata: &Value,
) -> Result<Option<Application>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    if merge_data(&mut tx, id, patch).await?.is_none() {
        return Ok(None);
    }

    sqlx::query(
        "UPDATE applications
         SET status = $2, form_variant = $3, metadata = metadata || $4, submitted_at = now()
         WHERE id = $1",
    )
    .bind(id)
    .bind(STATUS_SUBMITTED)
    .bind(variant.as_str())
    .bind(metadata)
    .execute(&mut *tx)
    .await?;

    let app = fetch(&mut tx, id).await?;
    tx.commit().await?;
    Ok(Some(app))
}

pub async fn record_eligibility(
    pool: &PgPool,
    id: Uuid,
    outcome: &EligibilityOutcome,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE applications SET eligible = $2, eligibility_reason = $3, updated_at = now()
         WHERE id = $1",
    )
    .bind(id)
    .bind(outcome.eligible)
    .bind(&outcome.reason)
    .execute(pool)
    .await?;
    Ok(())
}

/// Store the outcome of forwarding to Creator.
pub async fn record_forwarding(
    pool: &PgPool,
    id: Uuid,
    external_record_id: Option<&str>,
    forwarding_error: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE applications SET external_record_id = $2, forwarding_error = $3, updated_at = now()
         WHERE id = $1",
    )
    .bind(id)
    .bind(external_record_id)
    .bind(forwarding_error)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn set_auto_score<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    score: &AutoScore,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE applications
         SET organization_age_score = $2, organization_type_score = $3,
             operational_status_score = $4, auto_score = $5
         WHERE id = $1",
    )
    .bind(id)
    .bind(score.organization_age)
    .bind(score.organization_type)
    .bind(score.operational_status)
    .bind(score.total)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM applications WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

async fn fetch(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> Result<Application, sqlx::Error> {
    sqlx::query_as::<_, Application>("SELECT * FROM applications WHERE id = $1")
        .bind(id)
        .fetch_one(&mut **tx)
        .await
}
