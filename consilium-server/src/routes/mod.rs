pub mod ai;
pub mod analyses;
pub mod case_library;
pub mod cme;

use axum::{
    Router,
    middleware::from_fn,
    response::Json,
    routing::{delete, get, post},
};
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{AppState, telemetry::correlation_id_middleware};

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        // AI pipeline
        .route("/api/ai/clarifying-questions", post(ai::clarifying_questions))
        .route("/api/ai/recommend-specialists", post(ai::recommend_specialists))
        .route("/api/ai/initial-diagnoses", post(ai::initial_diagnoses))
        .route("/api/ai/final-report", post(ai::final_report))
        .route("/api/ai/drug-interactions", post(ai::drug_interactions))
        .route("/api/ai/cme-topics", post(ai::cme_topics))
        // Analyses
        .route(
            "/api/analyses",
            get(analyses::list_analyses).post(analyses::create_analysis),
        )
        .route("/api/analyses/recent", get(analyses::recent))
        .route("/api/analyses/dashboard-stats", get(analyses::dashboard_stats))
        .route(
            "/api/analyses/{id}",
            get(analyses::get_analysis)
                .patch(analyses::update_analysis)
                .delete(analyses::delete_analysis),
        )
        .route("/api/analyses/{id}/complete", post(analyses::complete_analysis))
        .route("/api/analyses/{id}/longitudinal", get(analyses::longitudinal))
        // Case library
        .route(
            "/api/case-library",
            get(case_library::list_cases).post(case_library::create_case),
        )
        .route("/api/case-library/search", get(case_library::search_cases))
        .route("/api/case-library/{id}", get(case_library::get_case))
        .route("/api/case-library/{id}/view", post(case_library::record_view))
        // CME topics
        .route("/api/cme-topics", get(cme::list_topics).post(cme::create_topic))
        .route("/api/cme-topics/{id}", delete(cme::delete_topic))
        .route("/api/cme-topics/{id}/complete", post(cme::complete_topic))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(correlation_id_middleware))
        .with_state(app_state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Consilium Consultation Service",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "AI-assisted differential diagnosis with a council of specialist models",
        "endpoints": {
            "POST /api/ai/clarifying-questions": "Questions that would sharpen the diagnosis",
            "POST /api/ai/recommend-specialists": "Specialists to consult, each with its model",
            "POST /api/ai/initial-diagnoses": "Ranked differential diagnoses",
            "POST /api/ai/final-report": "Consensus report after the council debate",
            "POST /api/ai/drug-interactions": "Interactions between medications",
            "POST /api/ai/cme-topics": "Continuing education topics from past cases",
            "GET|POST /api/analyses": "List or store analyses",
            "GET|PATCH|DELETE /api/analyses/{id}": "Read, update or delete an analysis",
            "POST /api/analyses/{id}/complete": "Mark an analysis completed",
            "GET /api/analyses/{id}/longitudinal": "Patient history, oldest first",
            "GET /api/analyses/recent": "Five newest analyses",
            "GET /api/analyses/dashboard-stats": "Dashboard statistics",
            "GET|POST /api/case-library": "List or share cases",
            "GET /api/case-library/search?q=": "Search shared cases",
            "GET|POST /api/cme-topics": "List or save CME topics",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
