//! File intake boundary. Only PDF-typed uploads become pipeline entries;
//! everything else is dropped without an error so a mixed drop is partially accepted.

use bytes::Bytes;
use tracing::debug;

use crate::models::entry::SourceFile;

pub const PDF_MIME_TYPE: &str = "application/pdf";

/// One file part as received from the upload form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

fn is_pdf(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().eq_ignore_ascii_case(PDF_MIME_TYPE))
        .unwrap_or(false)
}

/// Keeps PDF parts in their original order and drops the rest.
pub fn accept_pdfs(files: Vec<UploadedFile>) -> Vec<SourceFile> {
    files
        .into_iter()
        .filter_map(|file| {
            if !is_pdf(file.content_type.as_deref()) {
                debug!(
                    file_name = ?file.file_name,
                    content_type = ?file.content_type,
                    "Dropping non-PDF upload"
                );
                return None;
            }
            Some(SourceFile {
                file_name: file.file_name.unwrap_or_else(|| "resume.pdf".to_string()),
                mime_type: PDF_MIME_TYPE.to_string(),
                bytes: file.bytes,
            })
        })
        .collect()
}
