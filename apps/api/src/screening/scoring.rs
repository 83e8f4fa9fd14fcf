//! Scoring engine: one resume against one job, through the LLM, with budget
//! gating and structured-output validation.

use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::{strip_json_fences, LlmClient};
use crate::models::api::ScreeningScore;
use crate::screening::budget::BudgetLedger;
use crate::screening::prompts::{build_screening_prompt, PROMPT_VERSION};

/// A validated score plus the provenance fields persisted alongside it.
#[derive(Debug, Clone)]
pub struct ScoredOutcome {
    pub score: ScreeningScore,
    pub model_used: String,
    pub prompt_version: String,
    pub tokens_used: i32,
}

/// Scores a single resume against a job description.
///
/// Budget is checked up front; an exhausted quota makes no model call.
/// Token usage is recorded as soon as the call returns, before parsing —
/// the cost is incurred even when the output turns out to be malformed.
pub async fn score_resume(
    llm: &LlmClient,
    budget: &BudgetLedger,
    tenant_id: Uuid,
    monthly_quota: i64,
    job_title: &str,
    job_description: &str,
    resume_text: &str,
) -> Result<ScoredOutcome, AppError> {
    ensure_within_budget(budget.has_remaining_budget(tenant_id, monthly_quota).await?)?;

    let (system_prompt, user_prompt) =
        build_screening_prompt(job_title, job_description, resume_text);

    let completion = llm
        .complete(system_prompt, &user_prompt)
        .await
        .map_err(|e| AppError::Llm(e.to_string()))?;

    budget
        .record_usage(tenant_id, i64::from(completion.total_tokens))
        .await?;

    let score = parse_score_response(&completion.text)?;

    Ok(ScoredOutcome {
        score,
        model_used: llm.model().to_string(),
        prompt_version: PROMPT_VERSION.to_string(),
        tokens_used: completion.total_tokens as i32,
    })
}

/// Gate in front of every model call: an exhausted quota is the one error
/// that must fire before any tokens are spent.
fn ensure_within_budget(remaining: bool) -> Result<(), AppError> {
    if remaining {
        Ok(())
    } else {
        Err(AppError::BudgetExceeded)
    }
}

/// Parses raw model output into a validated `ScreeningScore`.
/// No partial object is ever returned: invalid JSON, an out-of-range score,
/// or an unrecognized match level all fail the whole call.
pub fn parse_score_response(raw: &str) -> Result<ScreeningScore, AppError> {
    let text = strip_json_fences(raw);
    let score: ScreeningScore = serde_json::from_str(text)
        .map_err(|e| AppError::LlmInvalid(format!("invalid JSON: {e}")))?;
    score.validate().map_err(AppError::LlmInvalid)?;
    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::api::MatchLevel;

    fn raw_score(score: i32) -> String {
        format!(
            r#"{{
                "score": {score},
                "strengths": [{{"point": "Rust depth", "evidence": "8 years of systems work"}}],
                "weaknesses": [],
                "reasoning": "Strong systems background.",
                "experience_match": "strong",
                "skills_match": "partial"
            }}"#
        )
    }

    #[test]
    fn test_exhausted_budget_rejected_before_model_call() {
        assert!(matches!(
            ensure_within_budget(false),
            Err(AppError::BudgetExceeded)
        ));
        assert!(ensure_within_budget(true).is_ok());
    }

    #[test]
    fn test_quota_boundary_gates_scoring() {
        use crate::screening::budget::budget_remains;

        // At the quota the next attempt must fail; one below, it proceeds.
        assert!(matches!(
            ensure_within_budget(budget_remains(Some(1000), 1000)),
            Err(AppError::BudgetExceeded)
        ));
        assert!(ensure_within_budget(budget_remains(Some(999), 1000)).is_ok());
        assert!(ensure_within_budget(budget_remains(None, 1000)).is_ok());
    }

    #[test]
    fn test_parse_plain_json() {
        let score = parse_score_response(&raw_score(82)).unwrap();
        assert_eq!(score.score, 82);
        assert_eq!(score.experience_match, MatchLevel::Strong);
        assert_eq!(score.skills_match, MatchLevel::Partial);
    }

    #[test]
    fn test_parse_fenced_json() {
        let fenced = format!("```json\n{}\n```", raw_score(55));
        let score = parse_score_response(&fenced).unwrap();
        assert_eq!(score.score, 55);
    }

    #[test]
    fn test_score_above_range_rejected() {
        assert!(matches!(
            parse_score_response(&raw_score(101)),
            Err(AppError::LlmInvalid(_))
        ));
    }

    #[test]
    fn test_score_below_range_rejected() {
        assert!(matches!(
            parse_score_response(&raw_score(-1)),
            Err(AppError::LlmInvalid(_))
        ));
    }

    #[test]
    fn test_boundary_scores_accepted() {
        assert_eq!(parse_score_response(&raw_score(0)).unwrap().score, 0);
        assert_eq!(parse_score_response(&raw_score(100)).unwrap().score, 100);
    }

    #[test]
    fn test_non_json_rejected() {
        assert!(matches!(
            parse_score_response("The candidate looks great, I'd say 85/100."),
            Err(AppError::LlmInvalid(_))
        ));
    }

    #[test]
    fn test_unknown_match_level_rejected() {
        let raw = r#"{
            "score": 50,
            "strengths": [],
            "weaknesses": [],
            "reasoning": "ok",
            "experience_match": "excellent",
            "skills_match": "none"
        }"#;
        assert!(matches!(
            parse_score_response(raw),
            Err(AppError::LlmInvalid(_))
        ));
    }
}
