pub mod page;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::catalog::scan_examples;
use crate::core::model::ExamplePair;
use crate::pipeline::{PipelineConfig, RecognitionPipeline};

/// Settings for the demo web server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub examples_dir: PathBuf,
    pub pipeline: PipelineConfig,
}

/// Application state shared across handlers. The catalog is scanned once at
/// startup and immutable afterwards.
struct AppState {
    catalog: Vec<ExamplePair>,
    pipeline: RecognitionPipeline,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Serialize)]
struct ExampleEntry {
    index: usize,
    name: String,
    reference: String,
}

#[derive(Serialize)]
struct RecognizeResponse {
    success: bool,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cer: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cer_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl RecognizeResponse {
    fn error(message: String) -> Self {
        Self {
            success: false,
            text: String::new(),
            cer: None,
            cer_status: None,
            error: Some(message),
        }
    }
}

/// Run the demo web server until interrupted.
pub async fn run_server(config: ServerConfig) -> Result<()> {
    let catalog = match scan_examples(&config.examples_dir) {
        Ok(catalog) => catalog,
        Err(err) => {
            warn!(error = %err, "examples directory unavailable, serving an empty gallery");
            Vec::new()
        }
    };
    info!(examples = catalog.len(), "example catalog loaded");

    let pipeline = RecognitionPipeline::new(config.pipeline.clone());
    let state = Arc::new(AppState { catalog, pipeline });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(page_handler))
        .route("/health", get(health_handler))
        .route("/api/examples", get(examples_handler))
        .route("/api/examples/{index}/image", get(example_image_handler))
        .route("/api/recognize", post(recognize_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;

    info!("demo listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server shutdown complete");
    Ok(())
}

async fn page_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(page::render_page(&state.catalog))
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn examples_handler(State(state): State<Arc<AppState>>) -> Json<Vec<ExampleEntry>> {
    let entries = state
        .catalog
        .iter()
        .enumerate()
        .map(|(index, pair)| ExampleEntry {
            index,
            name: pair.name(),
            reference: pair.reference.clone(),
        })
        .collect();
    Json(entries)
}

async fn example_image_handler(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> impl IntoResponse {
    let Some(pair) = state.catalog.get(index) else {
        return (StatusCode::NOT_FOUND, "no such example").into_response();
    };

    match tokio::fs::read(&pair.image_path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "image/jpeg")], bytes).into_response(),
        Err(err) => {
            error!(image = %pair.image_path.display(), error = %err, "failed to read example image");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to read example image").into_response()
        }
    }
}

fn bad_request(message: String) -> (StatusCode, Json<RecognizeResponse>) {
    (StatusCode::BAD_REQUEST, Json(RecognizeResponse::error(message)))
}

async fn recognize_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> (StatusCode, Json<RecognizeResponse>) {
    let request_id = uuid::Uuid::new_v4().to_string();

    let mut image_bytes: Option<Vec<u8>> = None;
    let mut example_index: Option<usize> = None;
    let mut ground_truth = String::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => return bad_request(format!("malformed upload: {err}")),
        };

        let name = field.name().map(|name| name.to_string());
        match name.as_deref() {
            Some("image") => match field.bytes().await {
                Ok(bytes) if !bytes.is_empty() => image_bytes = Some(bytes.to_vec()),
                Ok(_) => {}
                Err(err) => return bad_request(format!("failed to read image upload: {err}")),
            },
            Some("example") => match field.text().await {
                Ok(text) => match text.trim().parse::<usize>() {
                    Ok(index) => example_index = Some(index),
                    Err(_) => return bad_request(format!("invalid example index: {text}")),
                },
                Err(err) => return bad_request(format!("failed to read example field: {err}")),
            },
            Some("ground_truth") => match field.text().await {
                Ok(text) => ground_truth = text,
                Err(err) => return bad_request(format!("failed to read ground truth: {err}")),
            },
            _ => {}
        }
    }

    let bytes = if let Some(bytes) = image_bytes {
        bytes
    } else if let Some(index) = example_index {
        let Some(pair) = state.catalog.get(index) else {
            return bad_request(format!("no such example: {index}"));
        };
        match tokio::fs::read(&pair.image_path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                error!(request_id = %request_id, error = %err, "failed to read example image");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(RecognizeResponse::error("failed to read example image".to_string())),
                );
            }
        }
    } else {
        return bad_request("no image supplied".to_string());
    };

    info!(request_id = %request_id, bytes = bytes.len(), "processing recognition request");
    let started = Instant::now();

    let worker_state = state.clone();
    let result = tokio::task::spawn_blocking(move || {
        let image =
            image::load_from_memory(&bytes).context("failed to decode uploaded image")?;
        worker_state
            .pipeline
            .recognize(image, Some(ground_truth.as_str()))
    })
    .await;

    let report = match result {
        Ok(Ok(report)) => report,
        Ok(Err(err)) => {
            error!(request_id = %request_id, error = %err, "recognition failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RecognizeResponse::error(format!("{err:#}"))),
            );
        }
        Err(err) => {
            error!(request_id = %request_id, error = %err, "recognition task panicked");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RecognizeResponse::error("internal error".to_string())),
            );
        }
    };

    info!(
        request_id = %request_id,
        total_ms = started.elapsed().as_secs_f64() * 1000.0,
        "recognition complete"
    );

    let cer = report.cer.value();
    let cer_status = cer.is_none().then(|| report.cer.label());
    (
        StatusCode::OK,
        Json(RecognizeResponse {
            success: true,
            text: report.transcription,
            cer,
            cer_status,
            error: None,
        }),
    )
}

/// Graceful shutdown on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
