//! File operations on already-authorized canonical paths.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use termgate_core::error::{Result, TermGateError};

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// One member of a directory listing.
#[derive(Debug, Clone, Serialize)]
pub struct DirEntryInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// One line matched by a file search.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMatch {
    pub path: String,
    pub line: usize,
    pub text: String,
}

/// Read a file as UTF-8 text.
pub async fn read_file(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| TermGateError::from_io(e, &path.display().to_string()))
}

/// Create or overwrite a file.
pub async fn write_file(path: &Path, content: &str) -> Result<()> {
    tokio::fs::write(path, content)
        .await
        .map_err(|e| TermGateError::from_io(e, &path.display().to_string()))
}

/// Remove a file.
pub async fn delete_file(path: &Path) -> Result<()> {
    tokio::fs::remove_file(path)
        .await
        .map_err(|e| TermGateError::from_io(e, &path.display().to_string()))
}

/// List a directory, one entry per member, sorted by name.
pub async fn list_directory(path: &Path) -> Result<Vec<DirEntryInfo>> {
    let display = path.display().to_string();
    let mut reader = tokio::fs::read_dir(path)
        .await
        .map_err(|e| TermGateError::from_io(e, &display))?;

    let mut entries = Vec::new();
    while let Some(entry) = reader
        .next_entry()
        .await
        .map_err(|e| TermGateError::from_io(e, &display))?
    {
        let meta = match entry.metadata().await {
            Ok(m) => m,
            // Entry vanished between readdir and stat; skip it.
            Err(_) => continue,
        };
        let modified = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        entries.push(DirEntryInfo {
            name: entry.file_name().to_string_lossy().into_owned(),
            kind: if meta.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            },
            size: meta.len(),
            modified,
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Cap on individual files scanned by [`search_files`].
const SEARCH_MAX_FILE_BYTES: u64 = 1024 * 1024;
/// Cap on total matches returned.
const SEARCH_MAX_MATCHES: usize = 500;

/// Recursive substring search under `dir`.
///
/// Skips hidden entries, files larger than 1 MiB, and files that do not
/// decode as UTF-8 text. Match paths are relative to `dir`.
pub async fn search_files(dir: &Path, pattern: &str) -> Result<Vec<SearchMatch>> {
    // Shape validation happens at the dispatcher; an empty pattern here
    // would match every line, so treat it as no matches.
    if pattern.is_empty() {
        return Ok(Vec::new());
    }

    let mut matches = Vec::new();
    let mut pending: Vec<PathBuf> = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let mut reader = tokio::fs::read_dir(&current)
            .await
            .map_err(|e| TermGateError::from_io(e, &current.display().to_string()))?;

        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| TermGateError::from_io(e, &current.display().to_string()))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            let path = entry.path();
            let Ok(meta) = entry.metadata().await else {
                continue;
            };
            if meta.is_dir() {
                pending.push(path);
                continue;
            }
            if meta.len() > SEARCH_MAX_FILE_BYTES {
                continue;
            }
            let Ok(content) = tokio::fs::read_to_string(&path).await else {
                // Binary or unreadable; skip.
                continue;
            };
            let rel = path
                .strip_prefix(dir)
                .unwrap_or(&path)
                .display()
                .to_string();
            for (idx, line) in content.lines().enumerate() {
                if line.contains(pattern) {
                    matches.push(SearchMatch {
                        path: rel.clone(),
                        line: idx + 1,
                        text: line.trim_end().to_string(),
                    });
                    if matches.len() >= SEARCH_MAX_MATCHES {
                        return Ok(matches);
                    }
                }
            }
        }
    }

    matches.sort_by(|a, b| a.path.cmp(&b.path).then(a.line.cmp(&b.line)));
    Ok(matches)
}
