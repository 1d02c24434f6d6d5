//! HTTP API server for frontends and other systems.
//!
//! Provides REST endpoints for blog generation and transcript extraction.

use crate::blog::{BlogGenerator, BlogState, Usecase};
use crate::cli::Output;
use crate::config::{ServerSettings, Settings};
use crate::error::BlogError;
use crate::transcript::StrategyKind;
use crate::video::VideoReference;
use axum::{
    extract::{Path, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{error, warn, Level};

const ROUTES: &[&str] = &["/blogs/topic", "/blogs/youtube", "/transcript"];

/// Shared application state.
pub struct AppState {
    pub generator: BlogGenerator,
}

/// Run the HTTP API server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    api_key: &str,
    settings: Settings,
) -> anyhow::Result<()> {
    let generator = BlogGenerator::from_settings(&settings, api_key)?;
    let state = Arc::new(AppState { generator });
    let app = router(state.clone(), &settings.server);

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("blogsmith API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Blog from topic", "POST /blogs/topic");
    Output::kv("Blog from YouTube", "POST /blogs/youtube");
    Output::kv("Transcript", "POST /transcript");
    println!();
    let strategies = state
        .generator
        .extractor()
        .strategy_kinds()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    Output::kv("Transcript strategies", &strategies.join(" -> "));
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the application router.
pub fn router(state: Arc<AppState>, server: &ServerSettings) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/blogs/{usecase}", post(create_blog))
        .route("/transcript", post(transcript))
        .layer(trace_layer)
        .layer(cors_layer(server))
        .with_state(state)
}

fn cors_layer(server: &ServerSettings) -> CorsLayer {
    let origins = server.allowed_origins();
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    cors.allow_origin(AllowOrigin::list(allowed))
}

// === Request/Response Types ===

/// Body of `POST /blogs/{usecase}`; the use case decides which input is read.
#[derive(Deserialize)]
struct BlogRequest {
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    youtube_url: Option<String>,
    #[serde(default)]
    language: Option<String>,
}

impl BlogRequest {
    fn input(&self, usecase: Usecase) -> &str {
        let input = match usecase {
            Usecase::Topic => &self.topic,
            Usecase::Youtube => &self.youtube_url,
        };
        input.as_deref().unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct TranscriptRequest {
    youtube_url: String,
}

#[derive(Serialize)]
struct BlogResponse {
    data: BlogState,
    #[serde(skip_serializing_if = "Option::is_none")]
    video_id: Option<String>,
}

#[derive(Serialize)]
struct TranscriptResponse {
    transcript: String,
    video_id: String,
    source: StrategyKind,
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

/// Client mistakes are reported as-is; everything else is a 500.
fn error_response(route: &str, e: BlogError) -> Response {
    if e.is_client_error() {
        warn!("Rejected request to {}: {}", route, e);
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                detail: e.to_string(),
            }),
        )
            .into_response();
    }

    error!("Error in {}: {}", route, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            detail: format!("Internal server error: {}", e),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "message": "Blog Generator API is running",
    }))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "routes": ROUTES,
    }))
}

async fn create_blog(
    State(state): State<Arc<AppState>>,
    Path(usecase): Path<String>,
    Json(req): Json<BlogRequest>,
) -> Response {
    let route = format!("/blogs/{}", usecase);
    let usecase = match usecase.parse::<Usecase>() {
        Ok(usecase) => usecase,
        Err(e) => return error_response(&route, e),
    };

    match state
        .generator
        .generate(usecase, req.input(usecase), req.language.as_deref())
        .await
    {
        Ok(data) => Json(BlogResponse {
            video_id: data.video_id.clone(),
            data,
        })
        .into_response(),
        Err(e) => error_response(&route, e),
    }
}

async fn transcript(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TranscriptRequest>,
) -> Response {
    let video = match VideoReference::parse(&req.youtube_url) {
        Ok(video) => video,
        Err(e) => return error_response("/transcript", e),
    };

    match state.generator.transcript(&video).await {
        Ok(result) => Json(TranscriptResponse {
            transcript: result.text,
            video_id: result.video_id.to_string(),
            source: result.source_strategy,
        })
        .into_response(),
        Err(e) => error_response("/transcript", e),
    }
}
