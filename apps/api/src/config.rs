use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub qdrant_url: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub embedding_model: String,
    pub jwt_secret: String,
    /// Development fallback: requests without a bearer token resolve to the
    /// demo tenant. Must stay off in hardened deployments.
    pub allow_anonymous_demo: bool,
    /// Monthly LLM call quota applied when a tenant row carries no budget.
    pub default_monthly_llm_budget: i64,
    /// Cap on candidates per screening request (vector shortlist and scan fallback).
    pub max_resumes_per_screen: usize,
    /// TTL in seconds for cached screening scores.
    pub result_cache_ttl: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            qdrant_url: require_env("QDRANT_URL")?,
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_model: env_or("OPENAI_MODEL", "gpt-4o"),
            embedding_model: env_or("EMBEDDING_MODEL", "text-embedding-3-small"),
            jwt_secret: require_env("JWT_SECRET")?,
            allow_anonymous_demo: env_or("ALLOW_ANONYMOUS_DEMO", "false")
                .parse::<bool>()
                .context("ALLOW_ANONYMOUS_DEMO must be 'true' or 'false'")?,
            default_monthly_llm_budget: env_or("DEFAULT_MONTHLY_LLM_BUDGET", "1000")
                .parse::<i64>()
                .context("DEFAULT_MONTHLY_LLM_BUDGET must be an integer")?,
            max_resumes_per_screen: env_or("MAX_RESUMES_PER_SCREEN", "50")
                .parse::<usize>()
                .context("MAX_RESUMES_PER_SCREEN must be an integer")?,
            result_cache_ttl: env_or("RESULT_CACHE_TTL", "86400")
                .parse::<u64>()
                .context("RESULT_CACHE_TTL must be a number of seconds")?,
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
