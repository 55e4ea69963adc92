//! Reads raw reference documents from disk into [`SourceDocument`]s.
//!
//! Two layouts are understood:
//! - `*.txt`: plain text with pages separated by form feeds (`\x0c`), as
//!   produced by `pdftotext`
//! - `*.json`: `{ "source": "...", "pages": [{ "page_number": 1, "text": "..." }] }`
//!   where `source` is optional and defaults to the file name
//!
//! Pages are numbered from 1 and blank pages are dropped. A file that cannot
//! be decoded is reported as a failure and the rest are still returned. The
//! source of a `.txt` file (and the default for `.json`) is its path relative
//! to the data directory, with `/` separators, so files of the same name in
//! different subdirectories stay distinct.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{Page, SourceDocument};

const PAGE_BREAK: char = '\x0c';

/// Documents that loaded cleanly plus per-file failures.
#[derive(Debug, Default)]
pub struct LoadedDocuments {
    pub documents: Vec<SourceDocument>,
    /// Always `Error::MalformedDocument`.
    pub failures: Vec<Error>,
}

#[derive(Deserialize)]
struct JsonDocument {
    source: Option<String>,
    pages: Vec<Page>,
}

#[derive(Debug, Default, Clone)]
pub struct DocumentLoader {
    limit: Option<usize>,
}

impl DocumentLoader {
    pub fn new() -> Self { Self::default() }

    /// Only load the first `limit` files (in sorted order).
    pub fn with_limit(limit: usize) -> Self { Self { limit: Some(limit) } }

    /// Load every document under `data_dir`.
    ///
    /// Fails when `data_dir` itself is missing or not a directory; problems
    /// with individual files or subdirectories are collected in `failures`.
    pub fn load_directory(&self, data_dir: &Path) -> Result<LoadedDocuments> {
        match fs::metadata(data_dir) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(Error::InvalidArgument(format!("{} is not a directory", data_dir.display())))
            }
            Err(e) => {
                return Err(Error::InvalidArgument(format!("cannot read data directory {}: {e}", data_dir.display())))
            }
        }

        let mut loaded = LoadedDocuments::default();
        let mut files = list_document_files(data_dir, &mut loaded.failures);
        if files.is_empty() {
            tracing::warn!(dir = %data_dir.display(), "no .txt or .json documents found");
            return Ok(loaded);
        }
        if let Some(limit) = self.limit {
            if files.len() > limit {
                files.truncate(limit);
                tracing::info!(limit, "limited to first files");
            }
        }

        for (file_index, file_path) in files.iter().enumerate() {
            tracing::info!(file = %file_path.display(), "loading document {}/{}", file_index + 1, files.len());
            match load_file_as(file_path, relative_source(data_dir, file_path)) {
                Ok(doc) => loaded.documents.push(doc),
                Err(e) => {
                    tracing::warn!(file = %file_path.display(), error = %e, "skipping document");
                    loaded.failures.push(e);
                }
            }
        }
        tracing::info!(
            loaded = loaded.documents.len(),
            failed = loaded.failures.len(),
            "document loading finished"
        );
        Ok(loaded)
    }
}

/// Load a single `.txt` or `.json` document.
///
/// The source defaults to the file name.
pub fn load_file(file_path: &Path) -> Result<SourceDocument> {
    load_file_as(file_path, source_name(file_path))
}

fn load_file_as(file_path: &Path, source: String) -> Result<SourceDocument> {
    let malformed = |reason: String| Error::MalformedDocument { source_id: source.clone(), reason };

    let bytes = fs::read(file_path).map_err(|e| malformed(e.to_string()))?;
    let content = String::from_utf8(bytes).map_err(|e| malformed(format!("not valid UTF-8: {e}")))?;

    match extension(file_path).as_deref() {
        Some("json") => {
            let parsed: JsonDocument =
                serde_json::from_str(&content).map_err(|e| malformed(format!("invalid JSON: {e}")))?;
            if let Some(bad) = parsed.pages.iter().find(|p| p.page_number == 0) {
                return Err(malformed(format!("page numbers are 1-based, found {}", bad.page_number)));
            }
            let pages = parsed
                .pages
                .into_iter()
                .filter_map(|p| non_blank_page(p.page_number, &p.text))
                .collect();
            Ok(SourceDocument::new(parsed.source.unwrap_or(source), pages))
        }
        _ => Ok(SourceDocument::new(source, split_pages(&content))),
    }
}

/// Split form-feed separated text into 1-based, trimmed, non-blank pages.
pub fn split_pages(content: &str) -> Vec<Page> {
    content
        .split(PAGE_BREAK)
        .enumerate()
        .filter_map(|(i, text)| {
            let number = u32::try_from(i + 1).ok()?;
            non_blank_page(number, text)
        })
        .collect()
}

fn non_blank_page(page_number: u32, text: &str) -> Option<Page> {
    let text = text.trim();
    if text.is_empty() { None } else { Some(Page { page_number, text: text.to_string() }) }
}

fn source_name(file_path: &Path) -> String {
    file_path
        .file_name()
        .map_or_else(|| file_path.to_string_lossy().to_string(), |n| n.to_string_lossy().to_string())
}

fn extension(path: &Path) -> Option<String> {
    path.extension().and_then(|s| s.to_str()).map(str::to_ascii_lowercase)
}

/// `file_path` relative to `root`, joined with `/`.
fn relative_source(root: &Path, file_path: &Path) -> String {
    match file_path.strip_prefix(root) {
        Ok(rel) => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => source_name(file_path),
    }
}

fn list_document_files(root: &Path, failures: &mut Vec<Error>) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf);
                tracing::warn!(path = %path.display(), error = %e, "cannot walk directory entry");
                failures.push(Error::MalformedDocument {
                    source_id: relative_source(root, &path),
                    reason: format!("unreadable: {e}"),
                });
                continue;
            }
        };
        let path = entry.path();
        if entry.file_type().is_file() && matches!(extension(path).as_deref(), Some("txt" | "json")) {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    files
}
