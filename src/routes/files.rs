use std::path::Path;

use axum::{
    Json,
    extract::{Multipart, State},
};
use serde::Serialize;
use uuid::Uuid;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::report::truncate_chars;

const SUPPORTED_EXTENSIONS: &[&str] = &[".txt", ".md"];
const SUMMARY_MAX_CHARS: usize = 2000;

#[derive(Debug, Serialize)]
pub struct UploadedFileInfo {
    pub file_id: String,
    pub name: String,
    pub content_type: String,
    pub text: String,
    pub summary: Option<String>,
}

/// Accept one uploaded file, persist the raw bytes under the data directory
/// and extract plain text plus a bounded summary for later prompt assembly.
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadedFileInfo>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let extension = extension_of(&file_name);
        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(unsupported_type());
        }

        let file_id = Uuid::new_v4().to_string();
        let target = state.config.uploads_dir().join(format!("{file_id}{extension}"));
        tokio::fs::write(&target, &bytes).await?;

        let text = String::from_utf8_lossy(&bytes).trim().to_string();
        let summary = truncate_chars(&text, SUMMARY_MAX_CHARS);

        tracing::info!(
            file_id = %file_id,
            name = %file_name,
            bytes = bytes.len(),
            "file uploaded and parsed"
        );

        let name = if file_name.is_empty() {
            file_id.clone()
        } else {
            file_name
        };

        return Ok(Json(UploadedFileInfo {
            file_id,
            name,
            content_type,
            text,
            summary: Some(summary),
        }));
    }

    Err(AppError::Validation(
        "multipart body must contain a \"file\" field".to_string(),
    ))
}

fn unsupported_type() -> AppError {
    AppError::Validation("Unsupported file type, only .txt/.md are supported.".to_string())
}

/// Lowercased extension including the dot; empty string when there is none.
fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("notes.txt"), ".txt");
        assert_eq!(extension_of("README.MD"), ".md");
        assert_eq!(extension_of("archive.tar.gz"), ".gz");
        assert_eq!(extension_of("noext"), "");
        assert_eq!(extension_of(""), "");
    }

    #[test]
    fn test_supported_extensions() {
        assert!(SUPPORTED_EXTENSIONS.contains(&".txt"));
        assert!(SUPPORTED_EXTENSIONS.contains(&".md"));
        assert!(!SUPPORTED_EXTENSIONS.contains(&".pdf"));
        assert!(!SUPPORTED_EXTENSIONS.contains(&".exe"));
    }

    #[test]
    fn test_unsupported_type_is_client_error() {
        let err = unsupported_type();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(err.to_string().contains("Unsupported file type"));
    }
}
