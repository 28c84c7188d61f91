// src/server.rs
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::config::ReconcileSettings;
use crate::error::ReconcileError;
use crate::reconcile::{ProcessingLog, Reconciler, SourceFile};
use crate::store::{new_transaction_id, ResultStore};
use crate::workbook::SpreadsheetIo;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid upload: {0}")]
    BadRequest(String),
    #[error("No result for transaction {0}")]
    NotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("Processing failed: {source}")]
    Processing {
        source: ReconcileError,
        logs: Vec<String>,
    },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("Error occurred: {}", self);

        let status_code = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Processing { source, .. } => match source {
                ReconcileError::ArgumentMismatch { .. } => StatusCode::BAD_REQUEST,
                ReconcileError::StructureNotFound(_)
                | ReconcileError::ColumnNotFound { .. }
                | ReconcileError::Csv(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ReconcileError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        };
        let message = self.to_string();
        let logs = match self {
            AppError::Processing { logs, .. } => logs,
            _ => Vec::new(),
        };

        (status_code, Json(json!({ "error": message, "logs": logs }))).into_response()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<ReconcileSettings>,
    pub io: Arc<dyn SpreadsheetIo>,
    pub store: Arc<dyn ResultStore>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/process-roster", post(handle_process_roster))
        .route("/download/{transaction_id}", get(handle_download))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

// Multipart field names used by the upload form
const FIELD_ROSTER_FILES: &str = "dutyRosterFiles";
const FIELD_ATTENDANCE_FILE: &str = "attendanceFile";
const FIELD_DAYS: &str = "days";

struct Upload {
    rosters: Vec<SourceFile>,
    days: Vec<u32>,
    attendance: SourceFile,
}

async fn read_upload(multipart: &mut Multipart) -> Result<Upload, AppError> {
    let mut rosters = Vec::new();
    let mut days = Vec::new();
    let mut attendance = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        match field_name.as_str() {
            FIELD_ROSTER_FILES | FIELD_ATTENDANCE_FILE => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                let name = file_name.unwrap_or_else(|| field_name.clone());
                if bytes.is_empty() {
                    return Err(AppError::BadRequest(format!("file '{}' is empty", name)));
                }
                let file = SourceFile::new(name, bytes.to_vec());
                if field_name == FIELD_ROSTER_FILES {
                    rosters.push(file);
                } else {
                    attendance = Some(file);
                }
            }
            FIELD_DAYS => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                    let day = part
                        .parse::<u32>()
                        .ok()
                        .filter(|&d| d >= 1)
                        .ok_or_else(|| AppError::BadRequest(format!("invalid day value '{}'", part)))?;
                    days.push(day);
                }
            }
            other => debug!("Ignoring multipart field '{}'", other),
        }
    }

    let attendance = attendance
        .ok_or_else(|| AppError::BadRequest(format!("missing '{}'", FIELD_ATTENDANCE_FILE)))?;
    Ok(Upload {
        rosters,
        days,
        attendance,
    })
}

async fn handle_process_roster(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, AppError> {
    info!("Handling /process-roster request...");
    let upload = read_upload(&mut multipart).await?;

    // parsing and writing are CPU-bound; keep them off the async workers
    let (settings, io) = (state.settings.clone(), state.io.clone());
    let (outcome, log) = tokio::task::spawn_blocking(move || {
        let mut log = ProcessingLog::new();
        let reconciler = Reconciler::new(&settings, io.as_ref());
        let outcome =
            reconciler.process_files(&upload.rosters, &upload.days, &upload.attendance, &mut log);
        (outcome, log)
    })
    .await
    .map_err(|e| AppError::Internal(format!("processing task failed: {}", e)))?;

    let result = outcome.map_err(|source| AppError::Processing {
        source,
        logs: log.into_lines(),
    })?;

    let transaction_id = new_transaction_id();
    let logs = result.logs.clone();
    state.store.put(transaction_id.clone(), result);
    info!("Stored result under transaction {}", transaction_id);

    Ok(Json(json!({
        "transactionId": transaction_id,
        "logs": logs,
    })))
}

async fn handle_download(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> Result<Response, AppError> {
    info!("Handling /download/{} request...", transaction_id);
    let result = state
        .store
        .take(&transaction_id)
        .ok_or(AppError::NotFound(transaction_id))?;

    let encoded: String =
        url::form_urlencoded::byte_serialize(result.original_filename.as_bytes()).collect();
    let disposition = format!("attachment; filename*=UTF-8''{}", encoded.replace('+', "%20"));

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        result.file_content,
    )
        .into_response())
}
