//! Screening core: result cache, budget ledger, scoring engine, and the
//! orchestrator that ties them together.

pub mod budget;
pub mod cache;
pub mod handlers;
pub mod orchestrator;
pub mod prompts;
pub mod scoring;
