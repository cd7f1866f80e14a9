//! Career match gateway: HTTP shell around the scoring core.
//! Mapping and corpus are loaded once at startup; requests only read the shared snapshot.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request, StatusCode},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use career_match_core::{AnswerSet, CareerMatcher, MatchConfig, MatcherSummary, ScoreResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone)]
struct AppState {
    config: Arc<MatchConfig>,
    /// Swapped whole on reload; in-flight requests keep the `Arc` they cloned.
    matcher: Arc<RwLock<Arc<CareerMatcher>>>,
}

impl AppState {
    fn new(config: MatchConfig, matcher: CareerMatcher) -> Self {
        Self {
            config: Arc::new(config),
            matcher: Arc::new(RwLock::new(Arc::new(matcher))),
        }
    }

    async fn snapshot(&self) -> Arc<CareerMatcher> {
        Arc::clone(&*self.matcher.read().await)
    }
}

#[derive(Deserialize)]
struct PredictPayload {
    answers: AnswerSet,
    #[serde(default)]
    top_k: Option<i64>,
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    #[serde(flatten)]
    summary: MatcherSummary,
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[career-match] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match MatchConfig::load() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Settings load failed: {}", e);
            std::process::exit(1);
        }
    };

    let matcher = match CareerMatcher::load(&config) {
        Ok(m) => m,
        Err(e) => {
            tracing::error!("Matcher not ready, refusing to serve: {}", e);
            std::process::exit(1);
        }
    };
    let summary = matcher.summary();
    tracing::info!(
        experts = summary.experts,
        categories = summary.categories,
        labeled = summary.labeled,
        shape = ?summary.shape,
        "[career-match] matcher ready"
    );

    let addr = config.bind_addr();
    let app = build_app(AppState::new(config, matcher));

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("[career-match] listening on http://{}", addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", e);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Ctrl-C handler failed: {}", e);
    }
    tracing::info!("[career-match] shutting down");
}

fn build_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/predict", post(predict))
        .route("/api/reload", post(reload))
        .with_state(state)
        .layer(cors)
        .layer(axum::middleware::from_fn(log_requests))
}

/// Configured origins only; credentials allowed, so methods and headers mirror the request.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o.trim()) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

async fn log_requests(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    tracing::info!(
        %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
        "request"
    );
    response
}

async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    let matcher = state.snapshot().await;
    Json(HealthResponse {
        ok: true,
        summary: matcher.summary(),
    })
}

/// POST /api/predict: answers -> trait vector -> ranked roles with centroid and support.
async fn predict(State(state): State<AppState>, Json(payload): Json<PredictPayload>) -> Json<ScoreResult> {
    let matcher = state.snapshot().await;
    let result = matcher.score(&payload.answers, payload.top_k);
    if result.debug.answers.ignored() > 0 {
        tracing::debug!(
            ignored_unknown = result.debug.answers.ignored_unknown,
            ignored_malformed = result.debug.answers.ignored_malformed,
            "predict: some answers ignored"
        );
    }
    Json(result)
}

/// POST /api/reload: rebuild from the configured files and swap the snapshot.
/// On failure the current matcher keeps serving.
async fn reload(
    State(state): State<AppState>,
) -> Result<Json<MatcherSummary>, (StatusCode, String)> {
    let config = Arc::clone(&state.config);
    let rebuilt = tokio::task::spawn_blocking(move || CareerMatcher::load(&config))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let matcher = match rebuilt {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!("Reload rejected, keeping current corpus: {}", e);
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    let summary = matcher.summary();
    *state.matcher.write().await = Arc::new(matcher);
    tracing::info!(
        experts = summary.experts,
        categories = summary.categories,
        "[career-match] corpus reloaded"
    );
    Ok(Json(summary))
}
