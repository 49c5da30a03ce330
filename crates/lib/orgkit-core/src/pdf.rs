//! PDF inspection: page-limited text extraction plus document metadata.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

pub const DEFAULT_PAGE_LIMIT: usize = 10;
pub const MAX_PAGE_LIMIT: usize = 100;

#[derive(Debug)]
pub enum PdfError {
    NotFound(PathBuf),
    NotPdf(PathBuf),
    PageLimitOutOfRange(usize),
    Encrypted,
    Io(io::Error),
    Parse(lopdf::Error),
}

impl fmt::Display for PdfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "PDF file not found: {}", path.display()),
            Self::NotPdf(path) => write!(f, "file is not a PDF: {}", path.display()),
            Self::PageLimitOutOfRange(limit) => write!(
                f,
                "max_pages must be between 1 and {MAX_PAGE_LIMIT} (got {limit})"
            ),
            Self::Encrypted => write!(f, "PDF is password protected"),
            Self::Io(err) => write!(f, "failed to read PDF: {err}"),
            Self::Parse(err) => write!(f, "failed to parse PDF: {err}"),
        }
    }
}

impl std::error::Error for PdfError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

/// Document-info metadata, populated from the trailer dictionary when present.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfSummary {
    pub text: String,
    pub page_count: usize,
    pub extracted_pages: usize,
    pub file_size: u64,
    pub file_size_formatted: String,
    pub modified_at: Option<String>,
    pub metadata: PdfMetadata,
}

/// Extracts text from the first `min(page_count, max_pages)` pages and
/// collects document metadata.
///
/// # Errors
/// Returns a [`PdfError`] for missing or non-PDF paths, an out-of-range page
/// limit, encrypted documents, or parse failures.
pub fn inspect(path: &Path, max_pages: usize) -> Result<PdfSummary, PdfError> {
    if !(1..=MAX_PAGE_LIMIT).contains(&max_pages) {
        return Err(PdfError::PageLimitOutOfRange(max_pages));
    }
    if !path.is_file() {
        return Err(PdfError::NotFound(path.to_path_buf()));
    }
    let is_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if !is_pdf {
        return Err(PdfError::NotPdf(path.to_path_buf()));
    }

    let stats = std::fs::metadata(path).map_err(PdfError::Io)?;
    let document = lopdf::Document::load(path).map_err(PdfError::Parse)?;
    if document.is_encrypted() {
        return Err(PdfError::Encrypted);
    }

    let page_count = document.get_pages().len();
    let extracted_pages = page_count.min(max_pages);
    let last_page = u32::try_from(extracted_pages).unwrap_or(u32::MAX);
    let pages: Vec<u32> = (1..=last_page).collect();
    let text = document.extract_text(&pages).map_err(PdfError::Parse)?;

    let modified_at = stats
        .modified()
        .ok()
        .map(|time| DateTime::<Utc>::from(time).to_rfc3339());

    Ok(PdfSummary {
        text,
        page_count,
        extracted_pages,
        file_size: stats.len(),
        file_size_formatted: format_file_size(stats.len()),
        modified_at,
        metadata: document_metadata(&document),
    })
}

fn document_metadata(document: &lopdf::Document) -> PdfMetadata {
    let mut metadata = PdfMetadata::default();
    let Ok(info_ref) = document.trailer.get(b"Info") else {
        return metadata;
    };
    let lopdf::Object::Reference(object_id) = info_ref else {
        return metadata;
    };
    let Ok(lopdf::Object::Dictionary(info)) = document.get_object(*object_id) else {
        return metadata;
    };
    metadata.title = info_string(info, b"Title");
    metadata.author = info_string(info, b"Author");
    metadata.subject = info_string(info, b"Subject");
    metadata.creator = info_string(info, b"Creator");
    metadata.producer = info_string(info, b"Producer");
    metadata.creation_date = info_string(info, b"CreationDate");
    metadata.modification_date = info_string(info, b"ModDate");
    metadata
}

fn info_string(dict: &lopdf::Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key) {
        Ok(lopdf::Object::String(bytes, _)) => Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    }
}

/// Human-readable file size, matching the display used in tool output.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.2} {}", UNITS[unit])
}
