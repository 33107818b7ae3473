// file: src/ingest/scanner.rs
// description: Directory walking and source file discovery with filtering
// reference: https://docs.rs/walkdir

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::ingest::SubmittedFile;
use crate::models::Language;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

pub struct FileScanner {
    config: PipelineConfig,
}

#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub relative_path: String,
    pub language: Language,
    pub size: u64,
}

impl ScannedFile {
    pub fn read(&self) -> Result<SubmittedFile> {
        let content =
            fs::read_to_string(&self.path).map_err(|source| PipelineError::FileOperation {
                path: self.path.clone(),
                source,
            })?;

        Ok(SubmittedFile::new(self.relative_path.clone(), content)
            .with_language(self.language.as_str()))
    }
}

impl FileScanner {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Collect supported source files under `root`. A file path yields itself.
    pub fn scan(&self, root: &Path) -> Result<Vec<ScannedFile>> {
        if root.is_file() {
            let base = root.parent().unwrap_or(root);
            return Ok(self.scan_entry(root, base).into_iter().collect());
        }

        info!("Scanning directory: {}", root.display());
        let mut files = Vec::new();

        for entry in WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }

            if let Some(file) = self.scan_entry(entry.path(), root) {
                files.push(file);
            }
        }

        info!("Found {} source files", files.len());
        Ok(files)
    }

    fn scan_entry(&self, path: &Path, root: &Path) -> Option<ScannedFile> {
        if self.should_skip(path) {
            debug!("Skipping file: {}", path.display());
            return None;
        }

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        let Some(language) = Language::from_extension(ext) else {
            warn!("Unsupported file extension for {}", path.display());
            return None;
        };

        let size = fs::metadata(path).map(|m| m.len()).ok()?;
        let max_size = (self.config.max_file_size_mb * 1024 * 1024) as u64;
        if size > max_size {
            debug!(
                "Skipping large file ({} KB): {}",
                size / 1024,
                path.display()
            );
            return None;
        }

        let relative_path = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");

        Some(ScannedFile {
            path: path.to_path_buf(),
            relative_path,
            language,
            size,
        })
    }

    fn should_skip(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();

        for pattern in &self.config.skip_patterns {
            if let Some(suffix) = pattern.strip_prefix('*') {
                if path_str.ends_with(suffix) {
                    return true;
                }
            } else if path_str.contains(pattern.as_str()) {
                return true;
            }
        }

        false
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}
