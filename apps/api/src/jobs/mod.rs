//! Job endpoints. Job descriptions are embedded on creation so vector
//! shortlisting becomes available once the embedding step completes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::TenantContext;
use crate::embedding::embed_and_store_job;
use crate::errors::AppError;
use crate::models::api::{JobCreate, JobResponse};
use crate::models::rows::JobRow;
use crate::state::AppState;

fn to_response(job: JobRow) -> JobResponse {
    let requirements: Vec<String> = serde_json::from_value(job.requirements).unwrap_or_default();
    JobResponse {
        id: job.id,
        title: job.title,
        description: job.description,
        requirements,
        status: job.status,
        created_at: job.created_at,
    }
}

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(req): Json<JobCreate>,
) -> Result<(StatusCode, Json<JobResponse>), AppError> {
    if req.title.trim().is_empty() {
        return Err(AppError::Validation("title must not be empty".to_string()));
    }
    if req.description.len() < 10 {
        return Err(AppError::Validation(
            "description must be at least 10 characters".to_string(),
        ));
    }

    let requirements = serde_json::to_value(&req.requirements)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("serialize requirements: {e}")))?;

    let job: JobRow = sqlx::query_as(
        r#"
        INSERT INTO jobs (tenant_id, title, description, requirements)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(tenant.tenant_id)
    .bind(&req.title)
    .bind(&req.description)
    .bind(requirements)
    .fetch_one(&state.db)
    .await?;

    // Embed the description, then attach the reference. Until this lands the
    // job screens via the capped-scan fallback.
    let embedding_id = embed_and_store_job(
        &state.embeddings,
        &state.vectors,
        job.id,
        tenant.tenant_id,
        &req.description,
    )
    .await
    .map_err(|e| AppError::Llm(format!("job embedding failed: {e}")))?;

    let job: JobRow = sqlx::query_as(
        "UPDATE jobs SET embedding_id = $1 WHERE id = $2 AND tenant_id = $3 RETURNING *",
    )
    .bind(&embedding_id)
    .bind(job.id)
    .bind(tenant.tenant_id)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(to_response(job))))
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    tenant: TenantContext,
) -> Result<Json<Vec<JobResponse>>, AppError> {
    let jobs: Vec<JobRow> =
        sqlx::query_as("SELECT * FROM jobs WHERE tenant_id = $1 ORDER BY created_at DESC")
            .bind(tenant.tenant_id)
            .fetch_all(&state.db)
            .await?;

    Ok(Json(jobs.into_iter().map(to_response).collect()))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobResponse>, AppError> {
    let job: Option<JobRow> =
        sqlx::query_as("SELECT * FROM jobs WHERE id = $1 AND tenant_id = $2")
            .bind(job_id)
            .bind(tenant.tenant_id)
            .fetch_optional(&state.db)
            .await?;

    job.map(|j| Json(to_response(j)))
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))
}
