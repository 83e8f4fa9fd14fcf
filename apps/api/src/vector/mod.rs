//! Qdrant-backed vector index for semantic resume matching.
//!
//! One shared collection holds two point kinds: whole-description job vectors
//! and per-chunk resume vectors. Every point carries a `tenant_id` payload
//! field and a `type` discriminator, and every search filters on tenant.

use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use qdrant_client::qdrant::{
    point_id::PointIdOptions, value::Kind, vectors_output::VectorsOptions, Condition,
    CreateCollectionBuilder, Distance, Filter, GetPointsBuilder, PointStruct, Query,
    QueryPointsBuilder, ScoredPoint, UpsertPointsBuilder, Value, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use tracing::info;
use uuid::Uuid;

pub const COLLECTION_NAME: &str = "resumes";
/// text-embedding-3-small dimension.
pub const VECTOR_DIM: u64 = 1536;
/// Chunk points outnumber resumes, so shortlist searches over-fetch by this
/// factor before deduplicating by resume id.
const SHORTLIST_OVERFETCH: usize = 5;

pub struct VectorIndex {
    client: Qdrant,
}

impl VectorIndex {
    pub fn connect(url: &str) -> Result<Self> {
        let client = Qdrant::from_url(url)
            .build()
            .context("failed to build Qdrant client")?;
        Ok(Self { client })
    }

    /// Idempotent collection creation. Safe to call on every write path.
    pub async fn ensure_collection(&self) -> Result<()> {
        if self.client.collection_exists(COLLECTION_NAME).await? {
            return Ok(());
        }
        self.client
            .create_collection(
                CreateCollectionBuilder::new(COLLECTION_NAME)
                    .vectors_config(VectorParamsBuilder::new(VECTOR_DIM, Distance::Cosine)),
            )
            .await?;
        info!("Created Qdrant collection: {COLLECTION_NAME}");
        Ok(())
    }

    /// Stores one point per chunk. Point ids are derived from
    /// `(resume_id, chunk_index)` so re-embedding overwrites instead of
    /// duplicating.
    pub async fn upsert_resume_chunks(
        &self,
        resume_id: Uuid,
        tenant_id: Uuid,
        chunks: &[String],
        embeddings: Vec<Vec<f32>>,
    ) -> Result<()> {
        let points: Vec<PointStruct> = chunks
            .iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (chunk, embedding))| {
                let mut payload = Payload::new();
                payload.insert("tenant_id", tenant_id.to_string());
                payload.insert("resume_id", resume_id.to_string());
                payload.insert("chunk_index", i as i64);
                payload.insert("chunk_text", chunk.as_str());
                payload.insert("type", "resume_chunk");
                PointStruct::new(
                    chunk_point_id(resume_id, i).to_string(),
                    embedding,
                    payload,
                )
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(COLLECTION_NAME, points))
            .await?;
        Ok(())
    }

    /// Stores a single whole-description vector keyed by the job id.
    pub async fn upsert_job_embedding(
        &self,
        job_id: Uuid,
        tenant_id: Uuid,
        embedding: Vec<f32>,
    ) -> Result<()> {
        let mut payload = Payload::new();
        payload.insert("tenant_id", tenant_id.to_string());
        payload.insert("type", "job");

        self.client
            .upsert_points(UpsertPointsBuilder::new(
                COLLECTION_NAME,
                vec![PointStruct::new(job_id.to_string(), embedding, payload)],
            ))
            .await?;
        Ok(())
    }

    /// Finds the top-K most similar resume ids for a job embedding.
    /// Searches chunk vectors tenant-scoped, then deduplicates by resume id
    /// preserving best-match order.
    pub async fn find_similar_resumes(
        &self,
        tenant_id: Uuid,
        job_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<Uuid>> {
        let response = self
            .client
            .query(
                QueryPointsBuilder::new(COLLECTION_NAME)
                    .query(Query::new_nearest(job_embedding.to_vec()))
                    .filter(Filter::must([Condition::matches(
                        "tenant_id",
                        tenant_id.to_string(),
                    )]))
                    .limit((top_k * SHORTLIST_OVERFETCH) as u64)
                    .with_payload(true),
            )
            .await?;

        Ok(dedup_by_resume(&response.result, top_k))
    }

    /// Finds the most relevant chunks of one resume for a job embedding,
    /// returned in original document order rather than similarity order.
    pub async fn find_resume_chunks(
        &self,
        resume_id: Uuid,
        job_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<String>> {
        let response = self
            .client
            .query(
                QueryPointsBuilder::new(COLLECTION_NAME)
                    .query(Query::new_nearest(job_embedding.to_vec()))
                    .filter(Filter::must([
                        Condition::matches("resume_id", resume_id.to_string()),
                        Condition::matches("type", "resume_chunk".to_string()),
                    ]))
                    .limit(top_k as u64)
                    .with_payload(true),
            )
            .await?;

        let indexed: Vec<(i64, String)> = response
            .result
            .iter()
            .filter_map(|point| {
                let text = payload_str(&point.payload, "chunk_text")?;
                let index = payload_int(&point.payload, "chunk_index").unwrap_or(0);
                Some((index, text))
            })
            .collect();

        Ok(chunks_in_document_order(indexed))
    }

    /// Retrieves a stored embedding vector by point id.
    pub async fn get_vector(&self, point_id: &str) -> Result<Vec<f32>> {
        let response = self
            .client
            .get_points(
                GetPointsBuilder::new(COLLECTION_NAME, vec![point_id.to_string().into()])
                    .with_vectors(true),
            )
            .await?;

        let point = response
            .result
            .into_iter()
            .next()
            .with_context(|| format!("embedding not found for point {point_id}"))?;

        match point.vectors.and_then(|v| v.vectors_options) {
            Some(VectorsOptions::Vector(vector)) => Ok(vector.data),
            _ => anyhow::bail!("point {point_id} has no dense vector"),
        }
    }
}

/// Deterministic chunk point id so re-embedding the same resume upserts in
/// place (content addressing over `(resume_id, chunk_index)`).
pub fn chunk_point_id(resume_id: Uuid, chunk_index: usize) -> Uuid {
    Uuid::new_v5(
        &Uuid::NAMESPACE_DNS,
        format!("{resume_id}:chunk:{chunk_index}").as_bytes(),
    )
}

/// Deduplicates scored chunk points by resume id, preserving best-match
/// order, stopping at `top_k` unique resumes. Points without a `resume_id`
/// payload fall back to their own point id (whole-document points).
fn dedup_by_resume(points: &[ScoredPoint], top_k: usize) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    let mut resume_ids = Vec::new();

    for point in points {
        let raw = payload_str(&point.payload, "resume_id").or_else(|| point_id_string(point));
        let Some(raw) = raw else { continue };
        let Ok(resume_id) = Uuid::parse_str(&raw) else {
            continue;
        };
        if seen.insert(resume_id) {
            resume_ids.push(resume_id);
        }
        if resume_ids.len() >= top_k {
            break;
        }
    }

    resume_ids
}

/// Sorts retrieved chunks back into ascending chunk-index order so the
/// assembled excerpt reads like the document, not like a relevance ranking.
fn chunks_in_document_order(mut indexed: Vec<(i64, String)>) -> Vec<String> {
    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, text)| text).collect()
}

fn payload_str(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
    match payload.get(key)?.kind.as_ref()? {
        Kind::StringValue(s) => Some(s.clone()),
        _ => None,
    }
}

fn payload_int(payload: &HashMap<String, Value>, key: &str) -> Option<i64> {
    match payload.get(key)?.kind.as_ref()? {
        Kind::IntegerValue(i) => Some(*i),
        _ => None,
    }
}

fn point_id_string(point: &ScoredPoint) -> Option<String> {
    match point.id.as_ref()?.point_id_options.as_ref()? {
        PointIdOptions::Uuid(s) => Some(s.clone()),
        PointIdOptions::Num(n) => Some(n.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdrant_client::qdrant::PointId;

    fn string_value(s: &str) -> Value {
        Value {
            kind: Some(Kind::StringValue(s.to_string())),
        }
    }

    fn chunk_point(resume_id: Uuid, score: f32) -> ScoredPoint {
        let mut payload = HashMap::new();
        payload.insert("resume_id".to_string(), string_value(&resume_id.to_string()));
        ScoredPoint {
            payload,
            score,
            ..Default::default()
        }
    }

    #[test]
    fn test_chunk_point_id_is_deterministic() {
        let resume_id = Uuid::new_v4();
        assert_eq!(chunk_point_id(resume_id, 0), chunk_point_id(resume_id, 0));
        assert_ne!(chunk_point_id(resume_id, 0), chunk_point_id(resume_id, 1));
        assert_ne!(
            chunk_point_id(resume_id, 0),
            chunk_point_id(Uuid::new_v4(), 0)
        );
    }

    #[test]
    fn test_dedup_preserves_best_match_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let points = vec![
            chunk_point(a, 0.9),
            chunk_point(b, 0.8),
            chunk_point(a, 0.7),
            chunk_point(b, 0.6),
        ];
        assert_eq!(dedup_by_resume(&points, 10), vec![a, b]);
    }

    #[test]
    fn test_dedup_stops_at_top_k() {
        let ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        let points: Vec<ScoredPoint> = ids.iter().map(|id| chunk_point(*id, 0.5)).collect();
        let deduped = dedup_by_resume(&points, 3);
        assert_eq!(deduped, ids[..3].to_vec());
    }

    #[test]
    fn test_dedup_falls_back_to_point_id() {
        let resume_id = Uuid::new_v4();
        let point = ScoredPoint {
            id: Some(PointId::from(resume_id.to_string())),
            ..Default::default()
        };
        assert_eq!(dedup_by_resume(&[point], 1), vec![resume_id]);
    }

    #[test]
    fn test_chunks_reassemble_in_document_order() {
        let retrieved = vec![
            (3, "third".to_string()),
            (0, "first".to_string()),
            (7, "fourth".to_string()),
            (1, "second".to_string()),
        ];
        assert_eq!(
            chunks_in_document_order(retrieved),
            vec!["first", "second", "third", "fourth"]
        );
    }
}
