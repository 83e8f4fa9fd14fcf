//! Result cache: avoids re-paying for an LLM call when a resume has already
//! been scored against byte-identical job-description content.
//!
//! Invalidation is purely a function of the key: the key embeds a hash of
//! the description text, so editing the description changes the key and the
//! old entry simply ages out via TTL.

use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::api::ScreeningScore;

/// Redis-backed cache of screening scores with a fixed TTL.
#[derive(Clone)]
pub struct ScoreCache {
    conn: MultiplexedConnection,
    ttl_secs: u64,
}

impl ScoreCache {
    pub fn new(conn: MultiplexedConnection, ttl_secs: u64) -> Self {
        Self { conn, ttl_secs }
    }

    pub async fn get(
        &self,
        tenant_id: Uuid,
        job_id: Uuid,
        resume_id: Uuid,
        jd_hash: &str,
    ) -> Result<Option<ScreeningScore>, AppError> {
        let key = cache_key(tenant_id, job_id, resume_id, jd_hash);
        let mut conn = self.conn.clone();
        let data: Option<String> = conn.get(&key).await?;
        match data {
            Some(json) => {
                let score = serde_json::from_str(&json)
                    .map_err(|e| AppError::Internal(anyhow::anyhow!("corrupt cache entry: {e}")))?;
                Ok(Some(score))
            }
            None => Ok(None),
        }
    }

    pub async fn set(
        &self,
        tenant_id: Uuid,
        job_id: Uuid,
        resume_id: Uuid,
        jd_hash: &str,
        score: &ScreeningScore,
    ) -> Result<(), AppError> {
        let key = cache_key(tenant_id, job_id, resume_id, jd_hash);
        let json = serde_json::to_string(score)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("serialize score: {e}")))?;
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(&key, json, self.ttl_secs).await?;
        Ok(())
    }
}

/// Short content hash of the job description. Any edit to the text yields a
/// different hash and therefore a cache miss.
pub fn hash_description(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    format!("{digest:x}")[..16].to_string()
}

fn cache_key(tenant_id: Uuid, job_id: Uuid, resume_id: Uuid, jd_hash: &str) -> String {
    format!("tenant:{tenant_id}:screen:{job_id}:{resume_id}:{jd_hash}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_keys_namespaced_by_tenant() {
        // Two tenants scoring the same job/resume must not share cache.
        let tenant_a = Uuid::new_v4();
        let tenant_b = Uuid::new_v4();
        let job_id = Uuid::new_v4();
        let resume_id = Uuid::new_v4();
        let jd_hash = hash_description("some job description");

        let key_a = cache_key(tenant_a, job_id, resume_id, &jd_hash);
        let key_b = cache_key(tenant_b, job_id, resume_id, &jd_hash);

        assert_ne!(key_a, key_b);
        assert!(key_a.contains(&tenant_a.to_string()));
        assert!(key_b.contains(&tenant_b.to_string()));
    }

    #[test]
    fn test_description_edit_changes_key() {
        let tenant_id = Uuid::new_v4();
        let job_id = Uuid::new_v4();
        let resume_id = Uuid::new_v4();

        let hash_v1 = hash_description("Looking for a Python developer");
        let hash_v2 = hash_description("Looking for a Python developer with K8s experience");

        let key_v1 = cache_key(tenant_id, job_id, resume_id, &hash_v1);
        let key_v2 = cache_key(tenant_id, job_id, resume_id, &hash_v2);

        assert_ne!(key_v1, key_v2);
    }

    #[test]
    fn test_hash_is_stable_and_short() {
        let h1 = hash_description("description");
        let h2 = hash_description("description");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 16);
        assert!(h1.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
