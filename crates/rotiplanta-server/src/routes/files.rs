//! Upload endpoints: meal photos and medical reports.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use rotiplanta_ingest::{extract_pdf_text, StagedUpload, UploadKind};
use rotiplanta_table::{route_response, RowAddRequest, TableType};
use rotiplanta_text::{NormalizationProfile, NOT_AVAILABLE};

use crate::error::ApiError;
use crate::state::AppState;

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

const PHOTO_TABLE: &str = "Photo_Analysis";
const PHOTO_INPUT: &str = "Image";
const PHOTO_OUTPUT: &str = "Result";

const REPORT_TABLE: &str = "Report";
const REPORT_INPUT: &str = "Information";
const REPORT_OUTPUT: &str = "Analysis";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/process-photo", post(process_photo))
        .route("/process-document", post(process_document))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

struct Upload {
    file_name: String,
    bytes: Bytes,
}

/// Pull the `file` field out of the form and check its extension.
async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
    kind: UploadKind,
) -> Result<Upload, ApiError> {
    let no_file = || ApiError::BadRequest("No file part in the request".into());
    let mut multipart = multipart.map_err(|_| no_file())?;

    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?
            .ok_or_else(no_file)?;
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        if file_name.is_empty() {
            return Err(ApiError::BadRequest("No file selected".into()));
        }
        kind.check(&file_name)
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        return Ok(Upload { file_name, bytes });
    }
}

/// Run `process` on the staged copy of `upload`, then delete it.
async fn with_staged<F, Fut>(state: &AppState, upload: Upload, process: F) -> Result<String, ApiError>
where
    F: FnOnce(PathBuf) -> Fut,
    Fut: std::future::Future<Output = Result<String, ApiError>>,
{
    let staged = StagedUpload::write(state.uploads_dir(), &upload.file_name, &upload.bytes).await?;
    let outcome = process(staged.path().to_path_buf()).await;
    if let Err(e) = staged.remove().await {
        warn!("Staged upload cleanup failed: {}", e);
    }
    outcome
}

/// POST /api/process-photo: multipart `file` (.jpg/.jpeg/.png).
async fn process_photo(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ApiError> {
    let upload = read_upload(multipart, UploadKind::Photo).await?;
    info!("Processing photo {}", upload.file_name);

    let result = with_staged(&state, upload, |path| analyse_photo(&state, path)).await?;
    Ok(Json(json!({ "result": result })))
}

async fn analyse_photo(state: &AppState, path: PathBuf) -> Result<String, ApiError> {
    let uri = state.table.upload_file(&path).await?;

    let mut row = Map::new();
    row.insert(PHOTO_INPUT.to_string(), Value::String(uri));
    let response = state
        .table
        .add_table_rows(TableType::Action, RowAddRequest::single(PHOTO_TABLE, row))
        .await?;

    single_field(
        &response,
        PHOTO_OUTPUT,
        NormalizationProfile::ImageAnalysis,
        "Failed to process the photo",
    )
}

/// POST /api/process-document: multipart `file` (.pdf).
async fn process_document(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ApiError> {
    let upload = read_upload(multipart, UploadKind::Document).await?;
    info!("Processing document {}", upload.file_name);

    let result = with_staged(&state, upload, |path| analyse_document(&state, path)).await?;
    Ok(Json(json!({ "result": result })))
}

async fn analyse_document(state: &AppState, path: PathBuf) -> Result<String, ApiError> {
    let text = extract_pdf_text(&path).await?;
    if text.is_empty() {
        warn!("No text extracted from {}", display_name(&path));
        return Err(ApiError::Internal("Failed to process the document".into()));
    }

    let mut row = Map::new();
    row.insert(REPORT_INPUT.to_string(), Value::String(text));
    let response = state
        .table
        .add_table_rows(TableType::Action, RowAddRequest::single(REPORT_TABLE, row))
        .await?;

    single_field(
        &response,
        REPORT_OUTPUT,
        NormalizationProfile::PlainDocument,
        "Failed to process the document",
    )
}

fn single_field(
    response: &rotiplanta_table::TableResponse,
    column: &str,
    profile: NormalizationProfile,
    failure: &str,
) -> Result<String, ApiError> {
    let mut result = route_response(response, &[column], profile)
        .ok_or_else(|| ApiError::Internal(failure.to_string()))?;
    Ok(result
        .take(column)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string()))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
