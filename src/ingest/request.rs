// file: src/ingest/request.rs
// description: validation of submitted files and language resolution
// reference: input validation patterns

use crate::error::{PipelineError, Result};
use crate::models::{Language, SourceUnit};
use crate::utils::Validator;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// One file as submitted by a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedFile {
    pub path: String,
    #[serde(default)]
    pub language: Option<String>,
    pub content: String,
}

impl SubmittedFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            language: None,
            content: content.into(),
        }
    }

    pub fn with_language(mut self, tag: impl Into<String>) -> Self {
        self.language = Some(tag.into());
        self
    }

    /// An explicit tag wins over the file extension.
    pub fn resolve_language(&self) -> Result<Language> {
        match self.language.as_deref() {
            Some(tag) => Language::from_tag(tag),
            None => Language::from_path(&self.path),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRequest {
    #[serde(default)]
    pub files: Vec<SubmittedFile>,
}

/// Validates submitted files and turns them into source units.
pub struct Ingestor {
    max_file_bytes: usize,
}

impl Ingestor {
    pub fn new(max_file_size_mb: usize) -> Self {
        Self {
            max_file_bytes: max_file_size_mb.saturating_mul(1024 * 1024),
        }
    }

    pub fn ingest(&self, files: Vec<SubmittedFile>) -> Result<Vec<SourceUnit>> {
        if files.is_empty() {
            return Err(PipelineError::EmptyInput("no files submitted".to_string()));
        }

        let units = files
            .into_iter()
            .map(|file| self.ingest_file(file))
            .collect::<Result<Vec<_>>>()?;

        let mut seen = HashSet::new();
        for unit in &units {
            if !seen.insert(unit.path.as_str()) {
                return Err(PipelineError::Validation(format!(
                    "{} was submitted more than once",
                    unit.path
                )));
            }
        }

        Ok(units)
    }

    fn ingest_file(&self, file: SubmittedFile) -> Result<SourceUnit> {
        let language = file.resolve_language()?;

        if file.content.trim().is_empty() {
            return Err(PipelineError::EmptyInput(format!(
                "{} has no content",
                file.path
            )));
        }

        if file.content.len() > self.max_file_bytes {
            return Err(PipelineError::Validation(format!(
                "{} exceeds the {} byte limit",
                file.path, self.max_file_bytes
            )));
        }

        let mut path = Validator::sanitize_file_path(&file.path);
        if path.is_empty() {
            path = format!("unnamed.{}", language.as_str());
        }

        debug!("Ingested {} as {} ({} bytes)", path, language, file.content.len());
        Ok(SourceUnit::new(path, language, file.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingestor() -> Ingestor {
        Ingestor::new(1)
    }

    #[test]
    fn test_infers_language_from_extension() {
        let units = ingestor()
            .ingest(vec![
                SubmittedFile::new("a.py", "x = 1"),
                SubmittedFile::new("b.cpp", "int x;"),
            ])
            .unwrap();

        assert_eq!(units[0].language, Language::Python);
        assert_eq!(units[1].language, Language::Cpp);
    }

    #[test]
    fn test_explicit_tag_wins() {
        let units = ingestor()
            .ingest(vec![SubmittedFile::new("snippet.txt", "int x;").with_language("C")])
            .unwrap();
        assert_eq!(units[0].language, Language::C);
    }

    #[test]
    fn test_unsupported_language() {
        let err = ingestor()
            .ingest(vec![SubmittedFile::new("main.rs", "fn main() {}")])
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedLanguage(_)));

        let err = ingestor()
            .ingest(vec![SubmittedFile::new("a.py", "x = 1").with_language("ruby")])
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedLanguage(_)));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            ingestor().ingest(vec![]).unwrap_err(),
            PipelineError::EmptyInput(_)
        ));
        assert!(matches!(
            ingestor()
                .ingest(vec![SubmittedFile::new("a.js", "  \n\t")])
                .unwrap_err(),
            PipelineError::EmptyInput(_)
        ));
    }

    #[test]
    fn test_size_limit() {
        let big = "a".repeat(1024 * 1024 + 1);
        let err = ingestor()
            .ingest(vec![SubmittedFile::new("a.js", big)])
            .unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }

    #[test]
    fn test_paths_are_sanitized_and_unique() {
        let units = ingestor()
            .ingest(vec![
                SubmittedFile::new("src\\app.js", "let a = 1;"),
                SubmittedFile::new("", "x = 1").with_language("py"),
            ])
            .unwrap();
        assert_eq!(units[0].path, "src/app.js");
        assert_eq!(units[1].path, "unnamed.python");

        let err = ingestor()
            .ingest(vec![
                SubmittedFile::new("a.py", "x = 1"),
                SubmittedFile::new("./a.py", "y = 2"),
            ])
            .unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }

    #[test]
    fn test_request_deserializes_without_language() {
        let request: ProcessRequest =
            serde_json::from_str(r#"{"files":[{"path":"a.py","content":"x = 1"}]}"#).unwrap();
        assert_eq!(request.files.len(), 1);
        assert!(request.files[0].language.is_none());
    }
}
