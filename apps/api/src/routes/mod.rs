pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::jobs;
use crate::resumes;
use crate::screening::handlers as screening;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Jobs
        .route(
            "/api/v1/jobs",
            post(jobs::handle_create_job).get(jobs::handle_list_jobs),
        )
        .route("/api/v1/jobs/:id", get(jobs::handle_get_job))
        // Resumes
        .route(
            "/api/v1/resumes",
            post(resumes::handle_create_resume).get(resumes::handle_list_resumes),
        )
        .route("/api/v1/resumes/upload-pdf", post(resumes::handle_upload_pdf))
        // Screening
        .route("/api/v1/screen", post(screening::handle_screen))
        .route("/api/v1/results/:job_id", get(screening::handle_get_results))
        .route(
            "/api/v1/results/:result_id/feedback",
            post(screening::handle_submit_feedback),
        )
        .with_state(state)
}
