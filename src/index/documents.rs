//! Lesson document readers
//!
//! The lessons folder is listed non-recursively in file-name order. Plain
//! text and markdown are read as UTF-8, CSV rows become one line each, and
//! PDF text is extracted page by page. Anything that cannot be turned into
//! non-empty text is skipped.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::errors::{Result, TutorError};

/// A lesson file turned into text
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// File name, used as the chunk source
    pub source: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentKind {
    PlainText,
    Csv,
    Pdf,
}

impl DocumentKind {
    fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" | "md" => Some(DocumentKind::PlainText),
            "csv" => Some(DocumentKind::Csv),
            "pdf" => Some(DocumentKind::Pdf),
            _ => None,
        }
    }
}

/// Read every supported lesson file in `dir`
pub fn read_lessons(dir: &Path) -> Result<Vec<Document>> {
    if !dir.is_dir() {
        return Err(TutorError::LessonsDirMissing(dir.to_path_buf()));
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();
    paths.sort();

    let mut documents = Vec::new();
    for path in paths {
        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let Some(kind) = DocumentKind::from_path(&path) else {
            info!(file = %source, "Skipping unsupported file type");
            continue;
        };

        match read_document(&path, kind) {
            Ok(text) => documents.push(Document { source, text }),
            Err(e) => warn!(file = %source, error = %e, "Skipping document"),
        }
    }

    info!(count = documents.len(), dir = %dir.display(), "Lessons read");
    Ok(documents)
}

fn read_document(path: &Path, kind: DocumentKind) -> Result<String> {
    let text = match kind {
        DocumentKind::PlainText => read_utf8(path)?.trim().to_string(),
        DocumentKind::Csv => flatten_csv(&read_utf8(path)?),
        DocumentKind::Pdf => read_pdf(path)?,
    };

    if text.is_empty() {
        return Err(TutorError::UnreadableDocument {
            path: path.to_path_buf(),
            reason: "no extractable text".to_string(),
        });
    }

    Ok(text)
}

fn read_utf8(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| TutorError::UnreadableDocument {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Page texts joined by newlines. Pages that fail to extract are skipped.
fn read_pdf(path: &Path) -> Result<String> {
    let doc = lopdf::Document::load(path).map_err(|e| TutorError::UnreadableDocument {
        path: path.to_path_buf(),
        reason: format!("failed to load PDF: {}", e),
    })?;

    let pages = doc.get_pages();
    debug!(file = %path.display(), pages = pages.len(), "Extracting PDF text");

    let mut text = String::new();
    for page in pages.keys() {
        match doc.extract_text(&[*page]) {
            Ok(page_text) => {
                text.push_str(page_text.trim());
                text.push('\n');
            }
            Err(e) => warn!(file = %path.display(), page, error = %e, "Skipping PDF page"),
        }
    }

    Ok(text.trim().to_string())
}

/// One line per data row, non-empty cells joined by a space. The header row is dropped.
pub fn flatten_csv(raw: &str) -> String {
    split_csv_records(raw)
        .into_iter()
        .filter(|record| !is_blank_line(record))
        .skip(1)
        .map(|record| {
            record
                .iter()
                .map(|cell| cell.trim())
                .filter(|cell| !cell.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|row| !row.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_blank_line(record: &[String]) -> bool {
    record.len() == 1 && record[0].trim().is_empty()
}

/// Split into records of cells. Commas and newlines inside double quotes
/// belong to the cell; `""` inside quotes is a literal quote.
fn split_csv_records(raw: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => record.push(std::mem::take(&mut current)),
            '\r' if !in_quotes => {}
            '\n' if !in_quotes => {
                record.push(std::mem::take(&mut current));
                records.push(std::mem::take(&mut record));
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() || !record.is_empty() {
        record.push(current);
        records.push(record);
    }

    records
}
