//! Screening orchestrator: candidate selection, cache-or-score decision,
//! idempotent persistence, ranking.
//!
//! Flow per request: LoadJob → SelectCandidates → per resume {cache check →
//! [RAG retrieval → LLM score] → persist upsert} → Rank → Return. The whole
//! batch runs inside one transaction; a failure on any resume aborts the
//! request and leaves nothing behind.

use std::collections::HashMap;

use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::TenantContext;
use crate::errors::AppError;
use crate::models::api::{
    MatchLevel, ScreeningResultResponse, ScreeningScore, ScreeningSummary, StrengthWeakness,
};
use crate::models::rows::{JobRow, ResumeRow, ScreeningResultRow};
use crate::screening::cache::hash_description;
use crate::screening::scoring::{score_resume, ScoredOutcome};
use crate::state::AppState;
use crate::vector::VectorIndex;

/// How many chunks the RAG step retrieves per resume.
const RAG_TOP_K: usize = 5;

/// Screens candidates for a job and returns results ranked by score.
///
/// The tenant context is passed explicitly; every query below filters on it.
pub async fn screen_candidates(
    state: &AppState,
    tenant: &TenantContext,
    job_id: Uuid,
    resume_ids: Option<Vec<Uuid>>,
) -> Result<ScreeningSummary, AppError> {
    let mut tx = state.db.begin().await?;

    // LoadJob: tenant-scoped; a job belonging to another tenant is absent.
    let job: JobRow = sqlx::query_as(
        "SELECT * FROM jobs WHERE id = $1 AND tenant_id = $2",
    )
    .bind(job_id)
    .bind(tenant.tenant_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found for this tenant")))?;

    let jd_hash = hash_description(&job.description);
    let monthly_quota = tenant_quota(&state.db, tenant.tenant_id, state.config.default_monthly_llm_budget).await?;

    // SelectCandidates: explicit list, else vector shortlist, else capped scan.
    let candidate_ids = match resume_ids {
        Some(ids) => ids,
        None => {
            select_candidates(
                &mut tx,
                &state.vectors,
                &job,
                tenant.tenant_id,
                state.config.max_resumes_per_screen,
            )
            .await?
        }
    };

    // Load resumes tenant-scoped; ids belonging to other tenants drop out here.
    let resumes: Vec<ResumeRow> = sqlx::query_as(
        "SELECT * FROM resumes WHERE id = ANY($1) AND tenant_id = $2",
    )
    .bind(&candidate_ids)
    .bind(tenant.tenant_id)
    .fetch_all(&mut *tx)
    .await?;

    // ANY($1) returns rows in storage order. Restore the shortlist order so
    // equal scores rank deterministically by selection order.
    let resumes = order_by_shortlist(resumes, &candidate_ids);

    let mut results: Vec<ScreeningResultResponse> = Vec::with_capacity(resumes.len());

    for resume in resumes {
        let outcome = match state
            .cache
            .get(tenant.tenant_id, job_id, resume.id, &jd_hash)
            .await?
        {
            // Cache hits are free: no budget check, no usage accounting.
            Some(cached) => {
                info!("Cache hit for resume {}", resume.id);
                ScoredOutcome {
                    score: cached,
                    model_used: "cached".to_string(),
                    prompt_version: "cached".to_string(),
                    tokens_used: 0,
                }
            }
            None => {
                let resume_text = resume_text_for_scoring(&state.vectors, &job, &resume).await;

                let outcome = score_resume(
                    &state.llm,
                    &state.budget,
                    tenant.tenant_id,
                    monthly_quota,
                    &job.title,
                    &job.description,
                    &resume_text,
                )
                .await?;

                state
                    .cache
                    .set(tenant.tenant_id, job_id, resume.id, &jd_hash, &outcome.score)
                    .await?;
                outcome
            }
        };

        let row = upsert_result(&mut tx, tenant.tenant_id, job_id, resume.id, &outcome).await?;

        results.push(ScreeningResultResponse {
            id: row.id,
            job_id,
            resume_id: resume.id,
            candidate_name: resume.candidate_name,
            score: outcome.score.score,
            strengths: outcome.score.strengths,
            weaknesses: outcome.score.weaknesses,
            reasoning: outcome.score.reasoning,
            experience_match: outcome.score.experience_match,
            skills_match: outcome.score.skills_match,
            model_used: outcome.model_used,
            created_at: row.created_at,
        });
    }

    tx.commit().await?;

    rank_results(&mut results);

    Ok(ScreeningSummary {
        job_id,
        job_title: job.title,
        total_candidates: results.len(),
        results,
    })
}

/// Resolves the tenant's monthly quota, falling back to the configured
/// default when the tenant row is absent.
async fn tenant_quota(pool: &PgPool, tenant_id: Uuid, default: i64) -> Result<i64, AppError> {
    let quota: Option<i32> = sqlx::query_scalar("SELECT llm_budget FROM tenants WHERE id = $1")
        .bind(tenant_id)
        .fetch_optional(pool)
        .await?;
    Ok(quota.map(i64::from).unwrap_or(default))
}

/// Builds the candidate shortlist when the caller gave no explicit list.
/// With a completed job embedding, vector search pre-filters for cost
/// control; otherwise an arbitrary tenant-scoped scan, capped either way.
async fn select_candidates(
    tx: &mut Transaction<'_, Postgres>,
    vectors: &VectorIndex,
    job: &JobRow,
    tenant_id: Uuid,
    cap: usize,
) -> Result<Vec<Uuid>, AppError> {
    if let Some(embedding_id) = &job.embedding_id {
        let job_embedding = vectors
            .get_vector(embedding_id)
            .await
            .map_err(|e| AppError::Vector(e.to_string()))?;
        return vectors
            .find_similar_resumes(tenant_id, &job_embedding, cap)
            .await
            .map_err(|e| AppError::Vector(e.to_string()));
    }

    let ids: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM resumes WHERE tenant_id = $1 LIMIT $2")
        .bind(tenant_id)
        .bind(cap as i64)
        .fetch_all(&mut **tx)
        .await?;
    Ok(ids)
}

/// Picks the text to score: the RAG excerpt when retrieval works, the full
/// raw text otherwise. Retrieval is best-effort — any failure or an empty
/// result degrades silently to full text.
async fn resume_text_for_scoring(vectors: &VectorIndex, job: &JobRow, resume: &ResumeRow) -> String {
    let Some(embedding_id) = &job.embedding_id else {
        return resume.raw_text.clone();
    };

    let excerpt = async {
        let job_embedding = vectors.get_vector(embedding_id).await?;
        let chunks = vectors
            .find_resume_chunks(resume.id, &job_embedding, RAG_TOP_K)
            .await?;
        anyhow::Ok(chunks)
    }
    .await;

    match excerpt {
        Ok(chunks) if !chunks.is_empty() => chunks.join("\n\n"),
        Ok(_) => resume.raw_text.clone(),
        Err(e) => {
            warn!(
                "RAG retrieval failed for resume {}, using full text: {e}",
                resume.id
            );
            resume.raw_text.clone()
        }
    }
}

/// Insert-or-update keyed on (job_id, resume_id): re-screening overwrites
/// the existing row's score and rationale instead of duplicating it.
async fn upsert_result(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: Uuid,
    job_id: Uuid,
    resume_id: Uuid,
    outcome: &ScoredOutcome,
) -> Result<ScreeningResultRow, AppError> {
    let strengths = serde_json::to_value(&outcome.score.strengths)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("serialize strengths: {e}")))?;
    let weaknesses = serde_json::to_value(&outcome.score.weaknesses)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("serialize weaknesses: {e}")))?;

    let row: ScreeningResultRow = sqlx::query_as(
        r#"
        INSERT INTO screening_results
            (tenant_id, job_id, resume_id, score, strengths, weaknesses, reasoning,
             experience_match, skills_match, model_used, prompt_version, tokens_used)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (job_id, resume_id) DO UPDATE SET
            score = EXCLUDED.score,
            strengths = EXCLUDED.strengths,
            weaknesses = EXCLUDED.weaknesses,
            reasoning = EXCLUDED.reasoning,
            experience_match = EXCLUDED.experience_match,
            skills_match = EXCLUDED.skills_match,
            model_used = EXCLUDED.model_used,
            prompt_version = EXCLUDED.prompt_version,
            tokens_used = EXCLUDED.tokens_used
        RETURNING *
        "#,
    )
    .bind(tenant_id)
    .bind(job_id)
    .bind(resume_id)
    .bind(outcome.score.score)
    .bind(strengths)
    .bind(weaknesses)
    .bind(&outcome.score.reasoning)
    .bind(outcome.score.experience_match.as_str())
    .bind(outcome.score.skills_match.as_str())
    .bind(&outcome.model_used)
    .bind(&outcome.prompt_version)
    .bind(outcome.tokens_used)
    .fetch_one(&mut **tx)
    .await?;

    Ok(row)
}

/// Reorders fetched rows to match the shortlist. Ids the fetch dropped
/// (other tenants) are simply absent; ids the shortlist never named sort last.
fn order_by_shortlist(mut resumes: Vec<ResumeRow>, candidate_ids: &[Uuid]) -> Vec<ResumeRow> {
    let position: HashMap<Uuid, usize> = candidate_ids
        .iter()
        .enumerate()
        .map(|(i, id)| (*id, i))
        .collect();
    resumes.sort_by_key(|r| position.get(&r.id).copied().unwrap_or(usize::MAX));
    resumes
}

/// Stable descending sort by score; equal scores keep their input order.
pub fn rank_results(results: &mut [ScreeningResultResponse]) {
    results.sort_by(|a, b| b.score.cmp(&a.score));
}

/// Rehydrates a persisted row into the response shape, joining the
/// candidate name supplied by the caller's query.
pub fn row_to_response(row: ScreeningResultRow, candidate_name: String) -> ScreeningResultResponse {
    let strengths: Vec<StrengthWeakness> =
        serde_json::from_value(row.strengths).unwrap_or_default();
    let weaknesses: Vec<StrengthWeakness> =
        serde_json::from_value(row.weaknesses).unwrap_or_default();

    ScreeningResultResponse {
        id: row.id,
        job_id: row.job_id,
        resume_id: row.resume_id,
        candidate_name,
        score: row.score,
        strengths,
        weaknesses,
        reasoning: row.reasoning,
        experience_match: MatchLevel::from_db(&row.experience_match),
        skills_match: MatchLevel::from_db(&row.skills_match),
        model_used: row.model_used,
        created_at: row.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn resume_with(id: Uuid, name: &str) -> ResumeRow {
        ResumeRow {
            id,
            tenant_id: Uuid::new_v4(),
            candidate_name: name.to_string(),
            email: None,
            raw_text: "text".to_string(),
            parsed_data: None,
            embedding_id: None,
            uploaded_at: Utc::now(),
        }
    }

    fn result_with(score: i32, name: &str) -> ScreeningResultResponse {
        ScreeningResultResponse {
            id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            resume_id: Uuid::new_v4(),
            candidate_name: name.to_string(),
            score,
            strengths: vec![],
            weaknesses: vec![],
            reasoning: String::new(),
            experience_match: MatchLevel::None,
            skills_match: MatchLevel::None,
            model_used: "test".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_rows_follow_shortlist_order() {
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        // Simulate storage-order rows coming back shuffled relative to the list.
        let fetched = vec![
            resume_with(ids[2], "c"),
            resume_with(ids[0], "a"),
            resume_with(ids[1], "b"),
        ];
        let ordered = order_by_shortlist(fetched, &ids);
        let names: Vec<&str> = ordered.iter().map(|r| r.candidate_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unlisted_rows_sort_last() {
        let listed = Uuid::new_v4();
        let fetched = vec![
            resume_with(Uuid::new_v4(), "stray"),
            resume_with(listed, "listed"),
        ];
        let ordered = order_by_shortlist(fetched, &[listed]);
        assert_eq!(ordered[0].candidate_name, "listed");
        assert_eq!(ordered[1].candidate_name, "stray");
    }

    #[test]
    fn test_rank_sorts_descending() {
        let mut results = vec![
            result_with(40, "a"),
            result_with(90, "b"),
            result_with(65, "c"),
        ];
        rank_results(&mut results);
        let scores: Vec<i32> = results.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![90, 65, 40]);
    }

    #[test]
    fn test_rank_ties_keep_input_order() {
        let mut results = vec![
            result_with(70, "first"),
            result_with(70, "second"),
            result_with(90, "top"),
            result_with(70, "third"),
        ];
        rank_results(&mut results);
        let names: Vec<&str> = results.iter().map(|r| r.candidate_name.as_str()).collect();
        assert_eq!(names, vec!["top", "first", "second", "third"]);
    }

    #[test]
    fn test_row_to_response_rehydrates_pairs() {
        let row = ScreeningResultRow {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            resume_id: Uuid::new_v4(),
            score: 77,
            strengths: serde_json::json!([
                {"point": "Go experience", "evidence": "4 years at Acme"}
            ]),
            weaknesses: serde_json::json!([]),
            reasoning: "Good fit.".to_string(),
            experience_match: "strong".to_string(),
            skills_match: "partial".to_string(),
            model_used: "gpt-4o".to_string(),
            prompt_version: "v1.0".to_string(),
            tokens_used: Some(900),
            created_at: Utc::now(),
        };
        let response = row_to_response(row, "Jane".to_string());
        assert_eq!(response.candidate_name, "Jane");
        assert_eq!(response.strengths.len(), 1);
        assert_eq!(response.strengths[0].point, "Go experience");
        assert_eq!(response.experience_match, MatchLevel::Strong);
        assert_eq!(response.skills_match, MatchLevel::Partial);
    }
}
