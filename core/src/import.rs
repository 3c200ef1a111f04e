//! Bulk category import.
//!
//! Category files are plain text, one category per line:
//!
//! ```text
//! # comments and blank lines are skipped
//! Groceries
//! Dining Out | restaurants and takeaway
//! ```
//!
//! Text after a `|` becomes the category notes. Names are de-duplicated
//! case-insensitively, keeping the first occurrence.
//!
//! The import itself calls `create_category` once per item, in order. A
//! failed item is recorded and the batch moves on.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::client::FireflyClient;
use crate::error::ClientError;
use crate::transport::Transport;
use crate::types::NewCategory;

const CATEGORY_FILE_EXTENSIONS: &[&str] = &["txt", "md"];

/// Errors reading category files.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no category files found in {0}")]
    NoFiles(PathBuf),
}

pub type ImportResult<T> = Result<T, ImportError>;

/// Parse the contents of one category file.
pub fn parse_category_list(contents: &str) -> Vec<NewCategory> {
    let mut seen = HashSet::new();
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (name, notes) = match line.split_once('|') {
                Some((name, notes)) => (name.trim(), Some(notes.trim())),
                None => (line, None),
            };
            if name.is_empty() || !seen.insert(name.to_lowercase()) {
                return None;
            }
            Some(NewCategory {
                name: name.to_string(),
                notes: notes.filter(|n| !n.is_empty()).map(str::to_string),
            })
        })
        .collect()
}

/// Category files under `path`: the file itself, or the `.txt`/`.md` files
/// directly inside a directory, sorted by name.
pub fn scan_category_files(path: &Path) -> ImportResult<Vec<PathBuf>> {
    let io_err = |source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let metadata = fs::metadata(path).map_err(io_err)?;
    if metadata.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(path).map_err(io_err)? {
        let entry_path = entry.map_err(io_err)?.path();
        let matches_ext = entry_path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| CATEGORY_FILE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
        if entry_path.is_file() && matches_ext {
            files.push(entry_path);
        }
    }
    if files.is_empty() {
        return Err(ImportError::NoFiles(path.to_path_buf()));
    }
    files.sort();
    Ok(files)
}

/// Read and merge every category file under `path`.
pub fn load_categories(path: &Path) -> ImportResult<Vec<NewCategory>> {
    let mut merged = String::new();
    for file in scan_category_files(path)? {
        let contents = fs::read_to_string(&file).map_err(|source| ImportError::Io {
            path: file.clone(),
            source,
        })?;
        merged.push_str(&contents);
        merged.push('\n');
    }
    Ok(parse_category_list(&merged))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Report what would be created without calling the server.
    pub dry_run: bool,
    /// Fetch existing categories first and skip names already present.
    pub skip_existing: bool,
}

/// One item that could not be created.
#[derive(Debug, Clone)]
pub struct ImportFailure {
    pub name: String,
    pub error: ClientError,
}

/// Per-item outcome of an import run.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub created: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<ImportFailure>,
}

impl ImportReport {
    pub fn total(&self) -> usize {
        self.created.len() + self.skipped.len() + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Create each category in order, continuing past per-item failures.
///
/// Returns `Err` only when `skip_existing` is set and the existing
/// categories cannot be listed.
pub async fn import_categories<T: Transport>(
    client: &FireflyClient<T>,
    categories: &[NewCategory],
    options: &ImportOptions,
) -> Result<ImportReport, ClientError> {
    let mut report = ImportReport::default();

    if options.dry_run {
        report.skipped = categories.iter().map(|c| c.name.clone()).collect();
        info!(count = categories.len(), "dry run, nothing imported");
        return Ok(report);
    }

    let existing: HashSet<String> = if options.skip_existing {
        client
            .all_categories()
            .await?
            .into_iter()
            .map(|c| c.attributes.name.to_lowercase())
            .collect()
    } else {
        HashSet::new()
    };

    for category in categories {
        if existing.contains(&category.name.to_lowercase()) {
            info!(name = %category.name, "category exists, skipping");
            report.skipped.push(category.name.clone());
            continue;
        }

        match client.create_category(category).await {
            Ok(created) => {
                info!(name = %category.name, id = %created.id, "category created");
                report.created.push(category.name.clone());
            }
            Err(error) => {
                warn!(name = %category.name, error = %error, "category import failed");
                report.failed.push(ImportFailure {
                    name: category.name.clone(),
                    error,
                });
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_skips_comments_and_blanks() {
        let parsed = parse_category_list("# header\n\nGroceries\n   \n  Rent  \n");
        let names: Vec<_> = parsed.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Groceries", "Rent"]);
    }

    #[test]
    fn parse_splits_notes() {
        let parsed = parse_category_list("Dining Out | restaurants and takeaway\nFuel |\n");
        assert_eq!(parsed[0].name, "Dining Out");
        assert_eq!(parsed[0].notes.as_deref(), Some("restaurants and takeaway"));
        assert_eq!(parsed[1].name, "Fuel");
        assert!(parsed[1].notes.is_none());
    }

    #[test]
    fn parse_dedupes_case_insensitively() {
        let parsed = parse_category_list("Groceries\ngroceries\nGROCERIES | x\nRent\n");
        let names: Vec<_> = parsed.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Groceries", "Rent"]);
    }

    #[test]
    fn parse_drops_nameless_lines() {
        assert!(parse_category_list("| only notes\n").is_empty());
    }

    #[test]
    fn scan_directory_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "Rent\n").unwrap();
        fs::write(dir.path().join("a.md"), "Groceries\n").unwrap();
        fs::write(dir.path().join("ignored.csv"), "Nope\n").unwrap();
        fs::create_dir(dir.path().join("nested.txt")).unwrap();

        let files = scan_category_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.md", "b.txt"]);

        let categories = load_categories(dir.path()).unwrap();
        let names: Vec<_> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Groceries", "Rent"]);
    }

    #[test]
    fn scan_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("categories.list");
        fs::write(&file, "Groceries\n").unwrap();
        assert_eq!(scan_category_files(&file).unwrap(), vec![file]);
    }

    #[test]
    fn scan_empty_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            scan_category_files(dir.path()),
            Err(ImportError::NoFiles(_))
        ));
    }

    #[test]
    fn scan_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            scan_category_files(&dir.path().join("missing")),
            Err(ImportError::Io { .. })
        ));
    }
}
