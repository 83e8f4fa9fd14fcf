mod auth;
mod config;
mod db;
mod embedding;
mod errors;
mod jobs;
mod llm_client;
mod models;
mod resumes;
mod routes;
mod screening;
mod state;
mod vector;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::embedding::EmbeddingClient;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::screening::budget::BudgetLedger;
use crate::screening::cache::ScoreCache;
use crate::state::AppState;
use crate::vector::VectorIndex;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Aura API v{}", env!("CARGO_PKG_VERSION"));
    if config.allow_anonymous_demo {
        warn!("Anonymous demo tenant fallback is ENABLED — do not run this in production");
    }

    // Initialize PostgreSQL (runs migrations)
    let db = create_pool(&config.database_url).await?;

    // Initialize Redis-backed cache and budget ledger
    let redis_client = redis::Client::open(config.redis_url.clone())?;
    let redis_conn = redis_client.get_multiplexed_async_connection().await?;
    let cache = ScoreCache::new(redis_conn.clone(), config.result_cache_ttl);
    let budget = BudgetLedger::new(redis_conn);
    info!("Redis connection established");

    // Initialize Qdrant vector index
    let vectors = Arc::new(VectorIndex::connect(&config.qdrant_url)?);
    vectors.ensure_collection().await?;
    info!("Qdrant vector index ready");

    // Initialize OpenAI clients
    let embeddings = EmbeddingClient::new(
        config.openai_api_key.clone(),
        config.embedding_model.clone(),
    )?;
    let llm = LlmClient::new(config.openai_api_key.clone(), config.openai_model.clone())?;
    info!("LLM client initialized (model: {})", llm.model());

    // Build app state
    let state = AppState {
        db,
        cache,
        budget,
        vectors,
        embeddings,
        llm,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
