pub mod health;

use axum::{routing::get, routing::post, Router};

use crate::coaching::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/gemini", post(handlers::handle_gemini))
        .route("/api/process-voice", post(handlers::handle_process_voice))
        .route(
            "/api/text-to-speech",
            post(handlers::handle_text_to_speech),
        )
        .route("/api/upload-cv", post(handlers::handle_upload_cv))
        .route("/api/analyze-cv", post(handlers::handle_analyze_cv))
        .route("/api/generate-cv", post(handlers::handle_generate_cv))
        .route(
            "/api/generate-questions",
            post(handlers::handle_generate_questions),
        )
        .with_state(state)
}
