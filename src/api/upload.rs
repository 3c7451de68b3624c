//! Upload API endpoint
//!
//! - POST /api/v1/upload - Upload an image (multipart field `file`)
//!
//! Files are written to the configured upload directory as
//! `<unix-nanos>.<ext>` and served back under `/uploads`.

use axum::{
    extract::{Multipart, State},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};

/// Name collisions tolerated before giving up
const MAX_NAME_ATTEMPTS: usize = 16;

/// Response for successful upload
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub url: String,
    pub filename: String,
    pub size: u64,
}

/// POST /api/v1/upload
pub async fn upload_file(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let config = &state.upload_config;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation_error(format!("Failed to read multipart: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        let ext = file_extension(&original_name)
            .filter(|ext| config.is_extension_allowed(ext))
            .ok_or_else(|| {
                ApiError::validation_error(format!(
                    "Invalid file type. Allowed extensions: {}",
                    config.allowed_extensions.join(", ")
                ))
            })?;

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation_error(format!("Failed to read file: {}", e)))?;

        if data.is_empty() {
            return Err(ApiError::validation_error("Uploaded file is empty"));
        }
        if data.len() as u64 > config.max_file_size {
            return Err(ApiError::validation_error(format!(
                "File too large. Maximum size: {} bytes ({} MB)",
                config.max_file_size,
                config.max_file_size / 1024 / 1024
            )));
        }

        let filename = store_upload(&config.path, &ext, &data)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to save upload: {}", e)))?;

        tracing::info!(user_id = user.user_id, %filename, size = data.len(), "File uploaded");
        return Ok(Json(UploadResponse {
            message: "File uploaded successfully".to_string(),
            url: config.public_url(&filename),
            filename,
            size: data.len() as u64,
        }));
    }

    Err(ApiError::validation_error("No file provided"))
}

/// Lowercased extension of a client-supplied file name
fn file_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// Write `data` under a fresh timestamp name, never overwriting an existing
/// file. Returns the stored file name.
async fn store_upload(dir: &Path, ext: &str, data: &[u8]) -> std::io::Result<String> {
    fs::create_dir_all(dir).await?;

    for _ in 0..MAX_NAME_ATTEMPTS {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let filename = format!("{}.{}", nanos, ext);

        let path = dir.join(&filename);
        let file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        };

        write_or_remove(file, &path, data).await?;
        return Ok(filename);
    }

    Err(std::io::Error::new(
        ErrorKind::AlreadyExists,
        "could not find a free upload file name",
    ))
}

/// Write all of `data` to `out`; on failure remove the partial file at `path`
async fn write_or_remove<W>(mut out: W, path: &Path, data: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let result = async {
        out.write_all(data).await?;
        out.flush().await
    }
    .await;

    if result.is_err() {
        drop(out);
        if let Err(e) = fs::remove_file(path).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial upload");
        }
    }
    result
}

/// Directory listing helper for tests
#[cfg(test)]
pub(crate) fn stored_files(config: &crate::config::UploadConfig) -> Vec<String> {
    std::fs::read_dir(&config.path)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default()
}
