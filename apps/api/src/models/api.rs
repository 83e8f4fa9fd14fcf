//! Request/response DTOs plus the structured score contract expected from the LLM.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ────────────────────────────────────────────────────────────────────────────
// Enums
// ────────────────────────────────────────────────────────────────────────────

/// How well the candidate matches on a given axis. Closed set — any other
/// value in model output fails the parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchLevel {
    None,
    Partial,
    Strong,
}

impl MatchLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchLevel::None => "none",
            MatchLevel::Partial => "partial",
            MatchLevel::Strong => "strong",
        }
    }

    /// Lenient conversion for values read back from the database, which the
    /// write path has already validated.
    pub fn from_db(s: &str) -> MatchLevel {
        match s {
            "partial" => MatchLevel::Partial,
            "strong" => MatchLevel::Strong,
            _ => MatchLevel::None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Job schemas
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct JobCreate {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// Resume schemas
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ResumeCreate {
    pub candidate_name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub raw_text: String,
}

#[derive(Debug, Serialize)]
pub struct ResumeResponse {
    pub id: Uuid,
    pub candidate_name: String,
    pub email: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// Screening schemas
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ScreenRequest {
    pub job_id: Uuid,
    /// Specific resumes to screen. When absent the orchestrator builds a
    /// shortlist itself.
    #[serde(default)]
    pub resume_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrengthWeakness {
    pub point: String,
    pub evidence: String,
}

/// Structured output expected from the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningScore {
    pub score: i32,
    pub strengths: Vec<StrengthWeakness>,
    pub weaknesses: Vec<StrengthWeakness>,
    pub reasoning: String,
    pub experience_match: MatchLevel,
    pub skills_match: MatchLevel,
}

impl ScreeningScore {
    /// Range check serde cannot express. Match levels are already enforced
    /// by the `MatchLevel` enum during deserialization.
    pub fn validate(&self) -> Result<(), String> {
        if !(0..=100).contains(&self.score) {
            return Err(format!("score {} outside [0, 100]", self.score));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct ScreeningResultResponse {
    pub id: Uuid,
    pub job_id: Uuid,
    pub resume_id: Uuid,
    pub candidate_name: String,
    pub score: i32,
    pub strengths: Vec<StrengthWeakness>,
    pub weaknesses: Vec<StrengthWeakness>,
    pub reasoning: String,
    pub experience_match: MatchLevel,
    pub skills_match: MatchLevel,
    pub model_used: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ScreeningSummary {
    pub job_id: Uuid,
    pub job_title: String,
    pub total_candidates: usize,
    pub results: Vec<ScreeningResultResponse>,
}

// ────────────────────────────────────────────────────────────────────────────
// Feedback schemas
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct FeedbackCreate {
    /// 1 = bad, 5 = excellent.
    pub rating: i32,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub id: Uuid,
    pub result_id: Uuid,
    pub rating: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_score_parses() {
        let raw = json!({
            "score": 78,
            "strengths": [
                {"point": "Strong Python", "evidence": "5 years FastAPI experience"}
            ],
            "weaknesses": [
                {"point": "No K8s", "evidence": "Only mentions Docker"}
            ],
            "reasoning": "Solid backend engineer with gaps in cloud-native.",
            "experience_match": "strong",
            "skills_match": "partial"
        });
        let score: ScreeningScore = serde_json::from_value(raw).unwrap();
        assert!(score.validate().is_ok());
        assert_eq!(score.score, 78);
        assert_eq!(score.strengths.len(), 1);
        assert_eq!(score.experience_match, MatchLevel::Strong);
        assert_eq!(score.skills_match, MatchLevel::Partial);
    }

    #[test]
    fn test_score_out_of_range_rejected() {
        let raw = json!({
            "score": 150,
            "strengths": [],
            "weaknesses": [],
            "reasoning": "test",
            "experience_match": "strong",
            "skills_match": "strong"
        });
        let score: ScreeningScore = serde_json::from_value(raw).unwrap();
        assert!(score.validate().is_err());
    }

    #[test]
    fn test_negative_score_rejected() {
        let raw = json!({
            "score": -5,
            "strengths": [],
            "weaknesses": [],
            "reasoning": "test",
            "experience_match": "none",
            "skills_match": "none"
        });
        let score: ScreeningScore = serde_json::from_value(raw).unwrap();
        assert!(score.validate().is_err());
    }

    #[test]
    fn test_invalid_match_level_rejected() {
        let raw = json!({
            "score": 50,
            "strengths": [],
            "weaknesses": [],
            "reasoning": "test",
            "experience_match": "excellent",
            "skills_match": "none"
        });
        assert!(serde_json::from_value::<ScreeningScore>(raw).is_err());
    }

    #[test]
    fn test_match_level_db_round_trip() {
        for level in [MatchLevel::None, MatchLevel::Partial, MatchLevel::Strong] {
            assert_eq!(MatchLevel::from_db(level.as_str()), level);
        }
        // Unknown values from old rows degrade to None rather than erroring
        assert_eq!(MatchLevel::from_db("garbage"), MatchLevel::None);
    }
}
