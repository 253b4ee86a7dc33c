//! HTTP Endpoints
//!
//! REST API for the call QA service.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use crate::metrics::{metrics_handler, record_error, record_request, record_stage_latency};
use crate::state::AppState;
use crate::ServerError;
use call_qa_core::{AnalysisError, ErrorResponse, SpeakerHints};

/// Upload size ceiling: long calls at 16-bit/16kHz stay well below this
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors_layer =
        build_cors_layer(&state.config.server.cors_origins, state.config.server.cors_enabled);

    Router::new()
        // Analysis endpoint
        .route("/api/analyze", post(analyze))

        // Health check
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))

        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))

        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - If cors_enabled is false, returns permissive layer (for dev)
/// - If cors_origins is empty, defaults to localhost:3000 for safety
/// - Otherwise, uses the configured origins
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    if origins.is_empty() {
        tracing::info!("No CORS origins configured, defaulting to localhost:3000");
        return CorsLayer::new()
            .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any);
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::error!("All configured CORS origins are invalid, falling back to localhost");
        return CorsLayer::new()
            .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any);
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_credentials(true)
}

/// The decoded multipart upload
struct AnalyzeRequest {
    audio: Vec<u8>,
    hints: SpeakerHints,
}

/// Pull the file part and optional speaker hints out of the form
async fn read_multipart(mut multipart: Multipart) -> Result<AnalyzeRequest, String> {
    let mut audio: Option<Vec<u8>> = None;
    let mut min_speakers: Option<u8> = None;
    let mut max_speakers: Option<u8> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("malformed multipart body: {}", e))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| format!("failed to read file part: {}", e))?;
                audio = Some(bytes.to_vec());
            }
            "min_speakers" => {
                let text = field.text().await.map_err(|e| e.to_string())?;
                min_speakers =
                    Some(text.trim().parse().map_err(|_| {
                        format!("min_speakers must be an integer, got '{}'", text)
                    })?);
            }
            "max_speakers" => {
                let text = field.text().await.map_err(|e| e.to_string())?;
                max_speakers =
                    Some(text.trim().parse().map_err(|_| {
                        format!("max_speakers must be an integer, got '{}'", text)
                    })?);
            }
            other => {
                tracing::debug!(field = %other, "Ignoring unknown multipart field");
            }
        }
    }

    let audio = audio.ok_or_else(|| "missing required 'file' part".to_string())?;
    if audio.is_empty() {
        return Err("'file' part is empty".to_string());
    }

    let defaults = SpeakerHints::default();
    let hints = SpeakerHints::new(
        min_speakers.unwrap_or(defaults.min_speakers),
        max_speakers.unwrap_or(defaults.max_speakers),
    )
    .map_err(|e| e.to_string())?;

    Ok(AnalyzeRequest { audio, hints })
}

/// Analyze one uploaded recording
async fn analyze(State(state): State<AppState>, multipart: Multipart) -> Response {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("analyze", %request_id);

    async move {
        // Admission limit: protects external API quotas across requests
        let _permit = match state.admission.try_acquire() {
            Ok(permit) => permit,
            Err(_) => return server_error_response(ServerError::Saturated),
        };

        let request = match read_multipart(multipart).await {
            Ok(request) => request,
            Err(details) => return server_error_response(ServerError::InvalidRequest(details)),
        };

        let started = Instant::now();
        match state.analyzer.analyze(&request.audio, request.hints).await {
            Ok(response) => {
                record_stage_latency("analyze", started.elapsed().as_secs_f64());
                record_request(200);
                (StatusCode::OK, Json(response)).into_response()
            }
            Err(e) => {
                record_error(error_kind(&e));
                let status = StatusCode::from_u16(e.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                record_request(status.as_u16());

                // Server-side faults are logged distinctly from client errors
                if e.is_client_error() {
                    tracing::info!(error = %e, "Analysis rejected");
                } else {
                    tracing::error!(error = %e, "Analysis failed");
                }

                error_response(status, error_kind(&e), Some(e.to_string()))
            }
        }
    }
    .instrument(span)
    .await
}

/// Stable taxonomy name for logs and metrics labels
fn error_kind(err: &AnalysisError) -> &'static str {
    match err {
        AnalysisError::CorruptAudio(_) => "CorruptAudio",
        AnalysisError::UnsupportedFormat(_) => "UnsupportedFormat",
        AnalysisError::AmbiguousSpeakers(_) => "AmbiguousSpeakers",
        AnalysisError::ExternalServiceUnavailable { .. } => "ExternalServiceUnavailable",
        AnalysisError::ExternalServiceTimeout { .. } => "ExternalServiceTimeout",
        AnalysisError::InvariantViolation { .. } => "InvariantViolation",
        AnalysisError::Io(_) => "Io",
        AnalysisError::Config(_) => "Config",
    }
}

fn error_response(status: StatusCode, error: &str, details: Option<String>) -> Response {
    (
        status,
        Json(ErrorResponse::new(error, details, status.as_u16())),
    )
        .into_response()
}

fn server_error_response(err: ServerError) -> Response {
    let details = match &err {
        ServerError::InvalidRequest(details) => Some(details.clone()),
        _ => None,
    };
    let message = match &err {
        ServerError::InvalidRequest(_) => "Invalid request",
        ServerError::Saturated => "Too many concurrent analyses",
        ServerError::Internal(_) => "Internal error",
    };
    let status: StatusCode = err.into();
    record_request(status.as_u16());
    error_response(status, message, details)
}

/// Health check
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness check
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ready",
        "available_slots": state.admission.available_permits(),
    }))
}
