use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sqlx::FromRow;
use uuid::Uuid;

use crate::auth::TenantContext;
use crate::errors::AppError;
use crate::models::api::{
    FeedbackCreate, FeedbackResponse, ScreenRequest, ScreeningSummary,
};
use crate::models::rows::{FeedbackRow, ScreeningResultRow};
use crate::screening::orchestrator::{row_to_response, screen_candidates};
use crate::state::AppState;

/// POST /api/v1/screen
pub async fn handle_screen(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(req): Json<ScreenRequest>,
) -> Result<Json<ScreeningSummary>, AppError> {
    let summary = screen_candidates(&state, &tenant, req.job_id, req.resume_ids).await?;
    Ok(Json(summary))
}

#[derive(FromRow)]
struct ResultWithName {
    #[sqlx(flatten)]
    result: ScreeningResultRow,
    candidate_name: String,
}

/// GET /api/v1/results/:job_id — persisted results ranked by score.
pub async fn handle_get_results(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(job_id): Path<Uuid>,
) -> Result<Json<ScreeningSummary>, AppError> {
    let job_title: String =
        sqlx::query_scalar("SELECT title FROM jobs WHERE id = $1 AND tenant_id = $2")
            .bind(job_id)
            .bind(tenant.tenant_id)
            .fetch_optional(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;

    let rows: Vec<ResultWithName> = sqlx::query_as(
        r#"
        SELECT sr.*, r.candidate_name
        FROM screening_results sr
        JOIN resumes r ON sr.resume_id = r.id
        WHERE sr.job_id = $1 AND sr.tenant_id = $2
        ORDER BY sr.score DESC
        "#,
    )
    .bind(job_id)
    .bind(tenant.tenant_id)
    .fetch_all(&state.db)
    .await?;

    let results: Vec<_> = rows
        .into_iter()
        .map(|r| row_to_response(r.result, r.candidate_name))
        .collect();

    Ok(Json(ScreeningSummary {
        job_id,
        job_title,
        total_candidates: results.len(),
        results,
    }))
}

/// POST /api/v1/results/:result_id/feedback — append-only human rating.
pub async fn handle_submit_feedback(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(result_id): Path<Uuid>,
    Json(req): Json<FeedbackCreate>,
) -> Result<(StatusCode, Json<FeedbackResponse>), AppError> {
    if !(1..=5).contains(&req.rating) {
        return Err(AppError::Validation(
            "rating must be between 1 and 5".to_string(),
        ));
    }

    // Verify the result exists and belongs to this tenant.
    let exists: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM screening_results WHERE id = $1 AND tenant_id = $2")
            .bind(result_id)
            .bind(tenant.tenant_id)
            .fetch_optional(&state.db)
            .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Screening result not found".to_string()));
    }

    let feedback: FeedbackRow = sqlx::query_as(
        r#"
        INSERT INTO screening_feedback (tenant_id, result_id, rating, notes)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(tenant.tenant_id)
    .bind(result_id)
    .bind(req.rating)
    .bind(&req.notes)
    .fetch_one(&state.db)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(FeedbackResponse {
            id: feedback.id,
            result_id: feedback.result_id,
            rating: feedback.rating,
            notes: feedback.notes,
            created_at: feedback.created_at,
        }),
    ))
}
