use std::path::Path;

use lettre::message::header::ContentType;
use lettre::message::{Attachment, SinglePart};

use crate::error::DispatchError;

/// Read `path` from disk and turn it into a MIME attachment part.
///
/// The attachment is named after the final path component and typed from
/// its extension.
pub(crate) async fn load(path: &Path) -> Result<SinglePart, DispatchError> {
    let attachment_error = |reason: String| DispatchError::Attachment {
        path: path.display().to_string(),
        reason,
    };

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| attachment_error("path has no file name".to_owned()))?;

    let content = tokio::fs::read(path)
        .await
        .map_err(|e| attachment_error(e.to_string()))?;

    let content_type = ContentType::parse(content_type_for(path))
        .map_err(|e| DispatchError::Build(format!("invalid content type: {e}")))?;

    Ok(Attachment::new(filename).body(content, content_type))
}

/// Guess a MIME type from the file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("txt" | "text" | "log") => "text/plain",
        Some("csv") => "text/csv",
        Some("htm" | "html") => "text/html",
        Some("xml") => "application/xml",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("gz" | "tgz") => "application/gzip",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        Some("xls") => "application/vnd.ms-excel",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        Some("ics") => "text/calendar",
        _ => "application/octet-stream",
    }
}
