use crate::adapters::LocalStorage;
use crate::config::AppConfig;
use crate::core::etl::ReportEngine;
use crate::core::pipeline::SheetPipeline;
use crate::core::{ConfigProvider, ReportOutcome, Storage};
use crate::utils::error::{Result, TallyError};
use crate::utils::validation::spreadsheet_extension;
use crate::web::views;
use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: LocalStorage,
    // 同一時間只處理一個上傳，輸出檔只有一份
    processing: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let storage = LocalStorage::new(&config.storage.public_dir);
        Self {
            config: Arc::new(config),
            storage,
            processing: Arc::new(Mutex::new(())),
        }
    }
}

struct UploadedFile {
    file_name: String,
    bytes: Bytes,
}

fn multipart_error(e: MultipartError) -> TallyError {
    TallyError::UploadError {
        message: format!("Malformed upload: {}", e.body_text()),
    }
}

async fn read_upload(multipart: &mut Multipart) -> Result<UploadedFile> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;

        // 瀏覽器在沒選檔案時仍會送出空的 file 欄位
        if file_name.is_empty() && bytes.is_empty() {
            break;
        }

        return Ok(UploadedFile { file_name, bytes });
    }

    Err(TallyError::UploadError {
        message: "No file was uploaded.".to_string(),
    })
}

/// Parks the upload in `upload_dir`, runs the report engine on it and removes it again.
async fn process_upload(state: &AppState, upload: &UploadedFile) -> Result<ReportOutcome> {
    let extension = spreadsheet_extension(&upload.file_name)?;

    let upload_dir = PathBuf::from(&state.config.storage.upload_dir);
    tokio::fs::create_dir_all(&upload_dir).await?;

    let bytes = upload.bytes.clone();
    let transient = tokio::task::spawn_blocking(move || -> Result<NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&format!(".{}", extension))
            .tempfile_in(&upload_dir)?;
        file.write_all(&bytes)?;
        file.flush()?;
        Ok(file)
    })
    .await??;

    tracing::debug!(
        "Stored upload '{}' ({} bytes) at {}",
        upload.file_name,
        upload.bytes.len(),
        transient.path().display()
    );

    let pipeline = SheetPipeline::new(
        state.storage.clone(),
        Arc::clone(&state.config),
        transient.path(),
    );
    let outcome = ReportEngine::new(pipeline).run().await;

    if let Err(e) = transient.close() {
        tracing::warn!("Failed to remove transient upload: {}", e);
    }

    outcome
}

pub async fn upload_form() -> Html<String> {
    Html(views::render_upload_form())
}

pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Result<Html<String>> {
    let upload = read_upload(&mut multipart).await?;
    tracing::info!("Received upload '{}'", upload.file_name);

    let outcome = {
        let _guard = state.processing.lock().await;
        process_upload(&state, &upload).await?
    };

    tracing::info!(
        "✅ Processed '{}': {} records",
        upload.file_name,
        outcome.records_read
    );
    Ok(Html(views::render_result(
        &outcome.reports,
        &outcome.output_path,
    )))
}

pub async fn download(State(state): State<AppState>) -> Result<Response> {
    let file_name = state.config.output_filename();
    let bytes = match state.storage.read_file(file_name).await {
        Ok(bytes) => bytes,
        Err(TallyError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(TallyError::NoReportError)
        }
        Err(e) => return Err(e),
    };

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    )
        .into_response())
}

fn status_for(err: &TallyError) -> StatusCode {
    match err {
        TallyError::UploadError { .. } | TallyError::UnsupportedFormatError { .. } => {
            StatusCode::BAD_REQUEST
        }
        TallyError::SpreadsheetError(_)
        | TallyError::CsvError(_)
        | TallyError::EmptyWorkbookError { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        TallyError::NoReportError => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for TallyError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            tracing::error!(
                "❌ Request failed: {} (Category: {:?}, Severity: {:?})",
                self,
                self.category(),
                self.severity()
            );
        } else {
            tracing::warn!("Request rejected: {}", self);
        }

        let body = views::render_error(&self.user_friendly_message(), self.recovery_suggestion());
        (status, Html(body)).into_response()
    }
}
