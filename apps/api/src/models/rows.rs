#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TenantRow {
    pub id: Uuid,
    pub name: String,
    pub plan: String,
    pub llm_budget: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub title: String,
    pub description: String,
    pub requirements: Value,
    /// Set once the async embedding step completes; vector shortlisting is
    /// unavailable before that and candidate selection falls back to a scan.
    pub embedding_id: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub candidate_name: String,
    pub email: Option<String>,
    pub raw_text: String,
    pub parsed_data: Option<Value>,
    pub embedding_id: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// One row per (job, resume) pair; re-screening updates the row in place.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScreeningResultRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub job_id: Uuid,
    pub resume_id: Uuid,
    pub score: i32,
    pub strengths: Value,
    pub weaknesses: Value,
    pub reasoning: String,
    pub experience_match: String,
    pub skills_match: String,
    pub model_used: String,
    pub prompt_version: String,
    pub tokens_used: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FeedbackRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub result_id: Uuid,
    pub rating: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}
