//! HTTP prompt variation server.
//!
//! Serves the generation request over JSON: `POST /api/v1/generate` with
//! `{"prompt": "...", "count": 5}` returns the variations with the technique
//! and entropy source behind each one.

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use qprompt_core::{
    CancelToken, EntropySourceManager, Error, Generation, MAX_VARIATIONS, MIN_VARIATIONS,
    ProviderHealth, TechniqueCatalog, VariationGenerator,
};

/// Default variation count when a request omits `count`.
const DEFAULT_COUNT: usize = 5;

/// Shared server state. Both members are immutable after start-up.
struct AppState {
    manager: Arc<EntropySourceManager>,
    catalog: Arc<TechniqueCatalog>,
    parallel_draws: bool,
}

#[derive(Deserialize)]
struct GenerateRequest {
    prompt: String,
    count: Option<usize>,
}

#[derive(Serialize)]
struct GenerateResponse {
    success: bool,
    #[serde(flatten)]
    generation: Option<Generation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sources_used: Vec<String>,
    /// Error message if the request failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    /// Machine-readable error kind.
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
}

impl GenerateResponse {
    fn failure(err: &Error) -> Self {
        Self {
            success: false,
            generation: None,
            sources_used: Vec::new(),
            error: Some(err.to_string()),
            kind: Some(err.kind()),
        }
    }
}

#[derive(Serialize)]
struct TechniqueEntry {
    index: usize,
    key: String,
    name: String,
    description: String,
}

#[derive(Serialize)]
struct TechniquesResponse {
    techniques: Vec<TechniqueEntry>,
    total: usize,
}

#[derive(Serialize)]
struct ProvidersResponse {
    providers: Vec<ProviderHealth>,
    total: usize,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    providers_total: usize,
    providers_failing: usize,
    api_calls: u64,
}

/// Cancels the token when dropped. If the client disconnects, axum drops the
/// handler future mid-await and the blocking generation stops at its next
/// provider attempt.
struct CancelOnDrop(CancelToken);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// HTTP status for a generation error.
fn status_for(err: &Error) -> StatusCode {
    match err {
        e if e.is_caller_error() => StatusCode::BAD_REQUEST,
        Error::AllProvidersExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
        Error::Cancelled => StatusCode::REQUEST_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn handle_generate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> (StatusCode, Json<GenerateResponse>) {
    let count = req.count.unwrap_or(DEFAULT_COUNT);
    let cancel = CancelToken::new();
    let guard = CancelOnDrop(cancel.clone());

    let manager = Arc::clone(&state.manager);
    let catalog = Arc::clone(&state.catalog);
    let parallel = state.parallel_draws;
    let joined = tokio::task::spawn_blocking(move || {
        VariationGenerator::new(&manager, &catalog)
            .with_parallel_draws(parallel)
            .generate_report(&req.prompt, count, &cancel)
    })
    .await;
    drop(guard);

    let outcome = match joined {
        Ok(outcome) => outcome,
        Err(e) => {
            log::error!("generation task failed: {e}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(GenerateResponse {
                    success: false,
                    generation: None,
                    sources_used: Vec::new(),
                    error: Some("generation task failed".to_string()),
                    kind: Some("internal"),
                }),
            );
        }
    };

    match outcome {
        Ok(generation) => {
            let sources_used = generation
                .sources_used()
                .into_iter()
                .map(str::to_string)
                .collect();
            (
                StatusCode::OK,
                Json(GenerateResponse {
                    success: true,
                    generation: Some(generation),
                    sources_used,
                    error: None,
                    kind: None,
                }),
            )
        }
        Err(err) => {
            log::warn!("generation failed: {err}");
            (status_for(&err), Json(GenerateResponse::failure(&err)))
        }
    }
}

async fn handle_techniques(State(state): State<Arc<AppState>>) -> Json<TechniquesResponse> {
    let techniques: Vec<TechniqueEntry> = state
        .catalog
        .iter()
        .enumerate()
        .map(|(index, t)| TechniqueEntry {
            index,
            key: t.key.clone(),
            name: t.name.clone(),
            description: t.description.clone(),
        })
        .collect();
    let total = techniques.len();
    Json(TechniquesResponse { techniques, total })
}

async fn handle_providers(State(state): State<Arc<AppState>>) -> Json<ProvidersResponse> {
    let providers = state.manager.health_report();
    let total = providers.len();
    Json(ProvidersResponse { providers, total })
}

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let report = state.manager.health_report();
    let failing = report.iter().filter(|p| p.last_error.is_some()).count();
    Json(HealthResponse {
        status: if report.is_empty() || failing == report.len() {
            "degraded".to_string()
        } else {
            "healthy".to_string()
        },
        providers_total: report.len(),
        providers_failing: failing,
        api_calls: state.manager.total_calls(),
    })
}

async fn handle_index(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let provider_names = state.manager.provider_names();

    Json(serde_json::json!({
        "name": "qprompt server",
        "version": qprompt_core::VERSION,
        "providers": provider_names,
        "techniques": state.catalog.size(),
        "endpoints": {
            "/": "This API index",
            "/api/v1/generate": {
                "method": "POST",
                "description": "Generate prompt variations with quantum-selected techniques",
                "body": {
                    "prompt": "Prompt to optimize (non-empty)",
                    "count": format!("Number of variations ({MIN_VARIATIONS}-{MAX_VARIATIONS}, default: {DEFAULT_COUNT})"),
                }
            },
            "/techniques": "List the technique catalog in selection order",
            "/providers": "Entropy providers in fallback order with call statistics",
            "/health": "Health check",
        },
    }))
}

/// Build the axum router.
pub fn build_router(
    manager: Arc<EntropySourceManager>,
    catalog: Arc<TechniqueCatalog>,
    parallel_draws: bool,
) -> Router {
    let state = Arc::new(AppState {
        manager,
        catalog,
        parallel_draws,
    });

    Router::new()
        .route("/", get(handle_index))
        .route("/api/v1/generate", post(handle_generate))
        .route("/techniques", get(handle_techniques))
        .route("/providers", get(handle_providers))
        .route("/health", get(handle_health))
        .with_state(state)
}

/// Run the HTTP generation server until the listener fails.
///
/// The caller keeps its own handle on `manager`: the providers' blocking
/// HTTP clients must not be dropped from inside the async runtime.
pub async fn run_server(
    manager: Arc<EntropySourceManager>,
    catalog: Arc<TechniqueCatalog>,
    parallel_draws: bool,
    host: &str,
    port: u16,
) -> std::io::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("listening on {addr}");
    axum::serve(listener, build_router(manager, catalog, parallel_draws)).await
}
