//! HTTP server for the roamcost API.
//!
//! Provides REST endpoints for extract upload and processing.
//!
//! # API Endpoints
//!
//! | Method | Path           | Description                               |
//! |--------|----------------|-------------------------------------------|
//! | GET    | `/health`      | Health check                              |
//! | POST   | `/api/upload`  | Upload an extract, get a JSON run report  |
//! | POST   | `/api/process` | Upload an extract, download the workbook  |
//! | GET    | `/api/logs`    | SSE stream for real-time logs             |

use axum::{
    extract::Multipart,
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::LOG_BROADCASTER;
use super::types::{error_response, UploadResponse};
use crate::transform::pipeline::{process_bytes, ProcessOptions};
use crate::writer::{write_workbook_bytes, DOWNLOAD_NAME};

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Start the HTTP server
pub async fn start_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    // Permissive CORS for development
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    let app = Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/upload", post(upload_extract))
        .route("/api/process", post(process_download))
        .route("/api/logs", get(sse_logs))
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Roamcost server running on http://localhost:{}", port);
    println!("   POST /api/upload  - Upload extract, JSON report");
    println!("   POST /api/process - Upload extract, download workbook");
    println!("   GET  /api/logs    - SSE log stream");
    println!("   GET  /health      - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "roamcost",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "upload": "POST /api/upload",
            "process": "POST /api/process",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// What a multipart upload carried.
struct UploadFields {
    bytes: Vec<u8>,
    file_name: Option<String>,
    options: ProcessOptions,
}

/// Pull the file and option overrides out of a multipart body.
async fn read_upload(mut multipart: Multipart) -> Result<UploadFields, (StatusCode, Json<Value>)> {
    let bad_request =
        |msg: String| (StatusCode::BAD_REQUEST, Json(error_response(&msg)));

    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut options = ProcessOptions::from_env();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());
                file_data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| bad_request(format!("Read error: {}", e)))?
                        .to_vec(),
                );
            }
            "cutoff" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| bad_request(format!("Read error: {}", e)))?;
                options.cutoff = text
                    .trim()
                    .parse()
                    .map_err(|_| bad_request(format!("Invalid cutoff: {}", text)))?;
            }
            "sheet" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| bad_request(format!("Read error: {}", e)))?;
                if !text.trim().is_empty() {
                    options.sheet = Some(text.trim().to_string());
                }
            }
            "seed" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| bad_request(format!("Read error: {}", e)))?;
                options.seed = Some(
                    text.trim()
                        .parse()
                        .map_err(|_| bad_request(format!("Invalid seed: {}", text)))?,
                );
            }
            _ => {}
        }
    }

    let bytes =
        file_data.ok_or_else(|| bad_request("No file provided".to_string()))?;

    Ok(UploadFields {
        bytes,
        file_name,
        options,
    })
}

/// Upload endpoint: run the pipeline, return a JSON report with a preview.
async fn upload_extract(
    multipart: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, Json<Value>)> {
    let upload = read_upload(multipart).await?;

    println!("\n{}", "=".repeat(70));
    println!(
        "📄 NEW UPLOAD: {} ({} bytes)",
        upload.file_name.as_deref().unwrap_or("unknown"),
        upload.bytes.len()
    );
    println!("{}\n", "=".repeat(70));

    let outcome = process_bytes(&upload.bytes, &upload.options).map_err(|e| {
        eprintln!("❌ Processing error: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(error_response(&e.to_string())),
        )
    })?;

    println!("\n{}", "=".repeat(70));
    println!("📊 SUMMARY");
    println!("{}", "=".repeat(70));
    println!("   Input rows:     {}", outcome.report.input_rows);
    println!("   Merged lines:   {}", outcome.report.merged_duplicates);
    println!("   Groups:         {}", outcome.report.group_count);
    println!("   Redistributed:  {}", outcome.report.redistributed_rows);
    println!("   Old total:      {:.2}", outcome.report.total_old);
    println!("   New total:      {:.2}", outcome.report.total_new);
    println!("{}\n", "=".repeat(70));

    let cutoff = upload.options.cutoff;
    Ok(Json(UploadResponse::from_outcome(outcome, cutoff)))
}

/// Process endpoint: run the pipeline, respond with the styled workbook.
async fn process_download(
    multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    let upload = read_upload(multipart).await?;

    let internal = |e: String| {
        eprintln!("❌ Processing error: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(error_response(&e)),
        )
    };

    let outcome =
        process_bytes(&upload.bytes, &upload.options).map_err(|e| internal(e.to_string()))?;
    let bytes = write_workbook_bytes(&outcome.rows).map_err(|e| internal(e.to_string()))?;

    let headers = [
        (header::CONTENT_TYPE, XLSX_MIME.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", DOWNLOAD_NAME),
        ),
    ];

    Ok((headers, bytes))
}
