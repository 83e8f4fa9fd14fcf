use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::embedding::EmbeddingClient;
use crate::llm_client::LlmClient;
use crate::screening::budget::BudgetLedger;
use crate::screening::cache::ScoreCache;
use crate::vector::VectorIndex;

/// Shared application state injected into all route handlers via Axum
/// extractors. All clients are constructed once at startup and passed in —
/// never lazily initialized behind globals.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub cache: ScoreCache,
    pub budget: BudgetLedger,
    pub vectors: Arc<VectorIndex>,
    pub embeddings: EmbeddingClient,
    pub llm: LlmClient,
    pub config: Config,
}
