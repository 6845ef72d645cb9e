//! HTTP chat server.
//!
//! Exposes the [`Assistant`] over a small JSON API so a chat front end
//! (or `curl`) can ask questions about the loaded models.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/chat` | Answer `{ "query": "..." }` |
//! | `GET`  | `/counts` | Strict element counts and actor partition sizes |
//! | `GET`  | `/models` | Loaded models with their sizes |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! All origins, methods, and headers are permitted by the CORS layer.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};

use ainstein_core::intent::QueryIntent;
use ainstein_core::repository::ElementCounts;

use crate::assistant::Assistant;
use crate::validate::ValidationReport;

/// Build the router. Exposed separately from [`run_server`] so tests can
/// serve it on an ephemeral port.
pub fn router(assistant: Assistant) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/chat", post(handle_chat))
        .route("/counts", get(handle_counts))
        .route("/models", get(handle_models))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(assistant)
}

/// Serve on `bind` until the process is terminated.
pub async fn run_server(assistant: Assistant, bind: &str) -> anyhow::Result<()> {
    let app = router(assistant);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(bind = %bind, "chat server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn unavailable(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::SERVICE_UNAVAILABLE,
        code: "no_models".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    models: usize,
}

async fn handle_health(State(assistant): State<Assistant>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        models: assistant.repository().models().len(),
    })
}

// ============ POST /chat ============

#[derive(Deserialize)]
struct ChatRequest {
    query: String,
}

#[derive(Serialize)]
struct ChatResponse {
    answer: String,
    intent: QueryIntent,
    validation: ValidationReport,
    corrected: bool,
}

/// Returns `400` for an empty query. Everything else is answered, including
/// "no models loaded", which is an honest answer rather than an error.
async fn handle_chat(
    State(assistant): State<Assistant>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err(bad_request("query must not be empty"));
    }

    let response = assistant.answer(query);
    Ok(Json(ChatResponse {
        answer: response.text,
        intent: response.intent,
        validation: response.validation,
        corrected: response.corrected,
    }))
}

// ============ GET /counts ============

#[derive(Serialize)]
struct CountsResponse {
    #[serde(flatten)]
    counts: ElementCounts,
    internal_actors: usize,
    external_actors: usize,
    departments: usize,
}

/// Returns `503` when no models are loaded.
async fn handle_counts(State(assistant): State<Assistant>) -> Result<Json<CountsResponse>, AppError> {
    let repo = assistant.repository();
    if repo.is_empty() {
        return Err(unavailable("no models are loaded"));
    }
    let analysis = repo.business_actor_analysis();
    Ok(Json(CountsResponse {
        counts: repo.element_counts(),
        internal_actors: analysis.internal_actors.len(),
        external_actors: analysis.external_actors.len(),
        departments: analysis.departments.len(),
    }))
}

// ============ GET /models ============

#[derive(Serialize)]
struct ModelSummary {
    name: String,
    id: String,
    version: Option<String>,
    path: PathBuf,
    elements: usize,
    relationships: usize,
    views: usize,
}

#[derive(Serialize)]
struct ModelsResponse {
    models: Vec<ModelSummary>,
}

async fn handle_models(State(assistant): State<Assistant>) -> Json<ModelsResponse> {
    let models = assistant
        .repository()
        .models()
        .iter()
        .map(|m| ModelSummary {
            name: m.name.clone(),
            id: m.id.clone(),
            version: m.version.clone(),
            path: m.source_path.clone(),
            elements: m.elements().len(),
            relationships: m.relationships().len(),
            views: m.views().len(),
        })
        .collect();
    Json(ModelsResponse { models })
}
