//! Embedding pipeline: chunk text, embed via OpenAI, store vectors in the
//! index. Jobs get one whole-description vector; resumes get one vector per
//! chunk.

pub mod chunk;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::vector::VectorIndex;
use chunk::chunk_text;

const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

/// OpenAI embeddings client. One fixed-dimension vector per input text.
#[derive(Clone)]
pub struct EmbeddingClient {
    client: Client,
    api_key: String,
    model: String,
}

impl EmbeddingClient {
    pub fn new(api_key: String, model: String) -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()?,
            api_key,
            model,
        })
    }

    pub async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let response = self
            .client
            .post(OPENAI_EMBEDDINGS_URL)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .context("embedding request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("embedding API returned {status}: {body}");
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .context("embedding response was not valid JSON")?;
        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_texts(&[text.to_string()]).await?;
        vectors
            .pop()
            .context("embedding API returned no vector for query")
    }
}

/// Chunks resume text, embeds each chunk, and stores the chunk vectors.
/// Returns the embedding reference recorded on the resume row.
pub async fn embed_and_store_resume(
    embeddings: &EmbeddingClient,
    vectors: &VectorIndex,
    resume_id: Uuid,
    tenant_id: Uuid,
    text: &str,
) -> Result<String> {
    let chunks = chunk_text(text);
    let chunk_vectors = embeddings.embed_texts(&chunks).await?;

    vectors.ensure_collection().await?;
    vectors
        .upsert_resume_chunks(resume_id, tenant_id, &chunks, chunk_vectors)
        .await?;

    info!(
        "Stored {} chunk embeddings for resume {} (tenant {})",
        chunks.len(),
        resume_id,
        tenant_id
    );
    Ok(resume_id.to_string())
}

/// Embeds a job description as a single vector and stores it.
pub async fn embed_and_store_job(
    embeddings: &EmbeddingClient,
    vectors: &VectorIndex,
    job_id: Uuid,
    tenant_id: Uuid,
    text: &str,
) -> Result<String> {
    let embedding = embeddings.embed_query(text).await?;

    vectors.ensure_collection().await?;
    vectors
        .upsert_job_embedding(job_id, tenant_id, embedding)
        .await?;

    info!("Stored embedding for job {} (tenant {})", job_id, tenant_id);
    Ok(job_id.to_string())
}
