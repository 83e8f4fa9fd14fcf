//! Resume endpoints: JSON text upload, PDF upload with auto-screen, listing.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::TenantContext;
use crate::embedding::embed_and_store_resume;
use crate::errors::AppError;
use crate::models::api::{ResumeCreate, ResumeResponse, ScreeningSummary};
use crate::models::rows::ResumeRow;
use crate::screening::orchestrator::screen_candidates;
use crate::state::AppState;

fn to_response(resume: ResumeRow) -> ResumeResponse {
    ResumeResponse {
        id: resume.id,
        candidate_name: resume.candidate_name,
        email: resume.email,
        uploaded_at: resume.uploaded_at,
    }
}

/// Creates the resume row, then chunks/embeds its text and attaches the
/// embedding reference.
async fn create_and_embed(
    state: &AppState,
    tenant: &TenantContext,
    candidate_name: &str,
    email: Option<&str>,
    raw_text: &str,
) -> Result<ResumeRow, AppError> {
    let resume: ResumeRow = sqlx::query_as(
        r#"
        INSERT INTO resumes (tenant_id, candidate_name, email, raw_text)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(tenant.tenant_id)
    .bind(candidate_name)
    .bind(email)
    .bind(raw_text)
    .fetch_one(&state.db)
    .await?;

    let embedding_id = embed_and_store_resume(
        &state.embeddings,
        &state.vectors,
        resume.id,
        tenant.tenant_id,
        raw_text,
    )
    .await
    .map_err(|e| AppError::Llm(format!("resume embedding failed: {e}")))?;

    let resume: ResumeRow = sqlx::query_as(
        "UPDATE resumes SET embedding_id = $1 WHERE id = $2 AND tenant_id = $3 RETURNING *",
    )
    .bind(&embedding_id)
    .bind(resume.id)
    .bind(tenant.tenant_id)
    .fetch_one(&state.db)
    .await?;

    Ok(resume)
}

/// POST /api/v1/resumes — plain-text upload.
pub async fn handle_create_resume(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(req): Json<ResumeCreate>,
) -> Result<(StatusCode, Json<ResumeResponse>), AppError> {
    if req.candidate_name.trim().is_empty() {
        return Err(AppError::Validation(
            "candidate_name must not be empty".to_string(),
        ));
    }
    if req.raw_text.len() < 10 {
        return Err(AppError::Validation(
            "raw_text must be at least 10 characters".to_string(),
        ));
    }

    let resume = create_and_embed(
        &state,
        &tenant,
        &req.candidate_name,
        req.email.as_deref(),
        &req.raw_text,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(to_response(resume))))
}

/// POST /api/v1/resumes/upload-pdf — multipart PDF upload, then an immediate
/// screen of the new resume against the given job.
pub async fn handle_upload_pdf(
    State(state): State<AppState>,
    tenant: TenantContext,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ScreeningSummary>), AppError> {
    let mut pdf_bytes: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;
    let mut candidate_name: Option<String> = None;
    let mut job_id: Option<Uuid> = None;
    let mut email: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                filename = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("failed to read file: {e}")))?;
                pdf_bytes = Some(bytes.to_vec());
            }
            "candidate_name" => {
                candidate_name = Some(field.text().await.map_err(|e| {
                    AppError::Validation(format!("invalid candidate_name: {e}"))
                })?);
            }
            "job_id" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("invalid job_id: {e}")))?;
                job_id = Some(
                    Uuid::parse_str(&raw)
                        .map_err(|_| AppError::Validation("job_id must be a UUID".to_string()))?,
                );
            }
            "email" => {
                email = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(format!("invalid email: {e}")))?,
                );
            }
            _ => {}
        }
    }

    let pdf_bytes =
        pdf_bytes.ok_or_else(|| AppError::Validation("missing 'file' field".to_string()))?;
    let candidate_name = candidate_name
        .ok_or_else(|| AppError::Validation("missing 'candidate_name' field".to_string()))?;
    let job_id = job_id.ok_or_else(|| AppError::Validation("missing 'job_id' field".to_string()))?;

    if !filename
        .as_deref()
        .is_some_and(|f| f.to_lowercase().ends_with(".pdf"))
    {
        return Err(AppError::Validation(
            "Only PDF files are accepted".to_string(),
        ));
    }

    // Verify the job exists before paying for extraction and embedding.
    let job_exists: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM jobs WHERE id = $1 AND tenant_id = $2")
            .bind(job_id)
            .bind(tenant.tenant_id)
            .fetch_optional(&state.db)
            .await?;
    if job_exists.is_none() {
        return Err(AppError::NotFound("Job not found".to_string()));
    }

    let raw_text = pdf_extract::extract_text_from_mem(&pdf_bytes)
        .map_err(|e| AppError::Validation(format!("Could not extract text from PDF: {e}")))?;
    let raw_text = raw_text.trim().to_string();
    if raw_text.len() < 10 {
        return Err(AppError::Validation(
            "Could not extract text from PDF".to_string(),
        ));
    }

    let resume = create_and_embed(&state, &tenant, &candidate_name, email.as_deref(), &raw_text)
        .await?;

    let summary = screen_candidates(&state, &tenant, job_id, Some(vec![resume.id])).await?;

    Ok((StatusCode::CREATED, Json(summary)))
}

/// GET /api/v1/resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    tenant: TenantContext,
) -> Result<Json<Vec<ResumeResponse>>, AppError> {
    let resumes: Vec<ResumeRow> =
        sqlx::query_as("SELECT * FROM resumes WHERE tenant_id = $1 ORDER BY uploaded_at DESC")
            .bind(tenant.tenant_id)
            .fetch_all(&state.db)
            .await?;

    Ok(Json(resumes.into_iter().map(to_response).collect()))
}
