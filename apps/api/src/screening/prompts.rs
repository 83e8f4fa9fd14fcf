//! Prompt templates for resume screening.
//! Versioned so we can track which prompt produced which scores.

pub const PROMPT_VERSION: &str = "v1.0";

pub const SYSTEM_PROMPT: &str = "\
You are an expert HR screening assistant. Your job is to evaluate a candidate's \
resume against a specific job description and provide a structured assessment.

Rules:
- Score from 0-100 based on fit to the job requirements
- Be specific: cite exact resume lines when noting strengths or weaknesses
- Do not penalize for formatting -- focus on substance
- If the resume is unclear or incomplete, note it but do not assume the worst
- Never include protected characteristics (age, gender, race, religion, etc.) in your reasoning
- Output ONLY valid JSON matching the specified structure. No markdown, no extra text.";

const USER_PROMPT_TEMPLATE: &str = "\
## Job Description
Title: {job_title}

Requirements:
{job_description}

## Candidate Resume
{resume_text}

## Instructions
Evaluate this candidate against the job description above. Return your assessment \
as JSON with this exact structure:

{
  \"score\": <integer 0-100>,
  \"strengths\": [
    {\"point\": \"<specific strength>\", \"evidence\": \"<quote or reference from resume>\"}
  ],
  \"weaknesses\": [
    {\"point\": \"<specific gap>\", \"evidence\": \"<what's missing or mismatched>\"}
  ],
  \"reasoning\": \"<2-3 sentence overall assessment explaining the score>\",
  \"experience_match\": \"<none|partial|strong>\",
  \"skills_match\": \"<none|partial|strong>\"
}";

/// Builds the (system, user) prompt pair for one screening call.
pub fn build_screening_prompt(
    job_title: &str,
    job_description: &str,
    resume_text: &str,
) -> (&'static str, String) {
    let user_prompt = USER_PROMPT_TEMPLATE
        .replace("{job_title}", job_title)
        .replace("{job_description}", job_description)
        .replace("{resume_text}", resume_text);
    (SYSTEM_PROMPT, user_prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_prompt_embeds_all_inputs() {
        let (_, user) = build_screening_prompt(
            "Senior Backend Engineer",
            "5+ years of Rust and PostgreSQL",
            "Jane Smith, backend engineer since 2017",
        );
        assert!(user.contains("Senior Backend Engineer"));
        assert!(user.contains("5+ years of Rust and PostgreSQL"));
        assert!(user.contains("Jane Smith, backend engineer since 2017"));
    }

    #[test]
    fn test_user_prompt_requests_contract_fields() {
        let (_, user) = build_screening_prompt("t", "d", "r");
        for field in [
            "\"score\"",
            "\"strengths\"",
            "\"weaknesses\"",
            "\"reasoning\"",
            "\"experience_match\"",
            "\"skills_match\"",
        ] {
            assert!(user.contains(field), "prompt missing {field}");
        }
        assert!(user.contains("none|partial|strong"));
    }

    #[test]
    fn test_system_prompt_forbids_markdown() {
        assert!(SYSTEM_PROMPT.contains("ONLY valid JSON"));
    }

    #[test]
    fn test_prompt_version_label() {
        assert_eq!(PROMPT_VERSION, "v1.0");
    }
}
