use axum::extract::Json;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{routing::post, Router};
use log::{error, info};
use serde::Deserialize;
use std::net::SocketAddr;
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use inkform_core::{
    generate_docx, generate_html, generate_pdf, resolve_stylesheet, FormSchema, GenerateError,
    ResolvedStylesheet, StylesheetSource,
};

const DEFAULT_ADDR: &str = "127.0.0.1:3001";

#[derive(Debug, Deserialize)]
struct GeneratePayload {
    schema: FormSchema,
    /// Sparse stylesheet merged over the default.
    #[serde(default)]
    stylesheet: Option<serde_json::Value>,
}

impl GeneratePayload {
    fn into_parts(self) -> (FormSchema, ResolvedStylesheet) {
        let source = match self.stylesheet {
            Some(value) => StylesheetSource::Inline(value),
            None => StylesheetSource::Default,
        };
        (self.schema, resolve_stylesheet(&source))
    }
}

#[derive(Debug, Error)]
enum ApiError {
    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error("generation task failed: {0}")]
    Task(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("Request failed: {}", self);
        let body = serde_json::json!({ "error": self.to_string() });
        (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response()
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/render/pdf", post(render_pdf))
        .route("/render/html", post(render_html))
        .route("/render/docx", post(render_docx))
        .layer(ServiceBuilder::new().layer(cors));

    let addr: SocketAddr = match std::env::var("INKFORM_ADDR") {
        Ok(raw) => raw.parse().unwrap_or_else(|e| {
            error!("Ignoring INKFORM_ADDR '{}': {}", raw, e);
            DEFAULT_ADDR.parse().expect("default address is valid")
        }),
        Err(_) => DEFAULT_ADDR.parse().expect("default address is valid"),
    };
    info!("inkform listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind");

    axum::serve(listener, app)
        .await
        .expect("Server failed");
}

/// Run a generation off the async runtime; asset loading may block.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, GenerateError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Task(e.to_string()))?
        .map_err(ApiError::from)
}

async fn render_pdf(Json(payload): Json<GeneratePayload>) -> Result<impl IntoResponse, ApiError> {
    let (schema, style) = payload.into_parts();
    let output = blocking(move || generate_pdf(&schema, &style)).await?;
    info!(
        "Rendered PDF: {} page(s), {} field(s), {} bytes",
        output.page_count,
        output.field_count,
        output.bytes.len()
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"form.pdf\""),
        ],
        output.bytes,
    ))
}

async fn render_html(Json(payload): Json<GeneratePayload>) -> Result<impl IntoResponse, ApiError> {
    let (schema, style) = payload.into_parts();
    let title = schema.form.title.clone();
    let output = blocking(move || generate_html(&schema, &style)).await?;
    info!("Rendered HTML: {} page(s), {} field(s)", output.page_count, output.field_count);

    Ok(([(header::CONTENT_TYPE, "text/html; charset=utf-8")], output.to_document(&title)))
}

async fn render_docx(Json(payload): Json<GeneratePayload>) -> Result<impl IntoResponse, ApiError> {
    let (schema, style) = payload.into_parts();
    let document = blocking(move || generate_docx(&schema, &style)).await?;
    info!("Built flow document: {} block(s)", document.blocks.len());

    Ok(Json(document))
}
