// file: src/exporter/json.rs
// description: writes documentation results to disk as json

use crate::error::{PipelineError, Result};
use crate::models::DocumentationResult;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_FILE_NAME: &str = "documentation.json";

#[derive(Debug, Clone)]
pub struct JsonExporter {
    output_dir: PathBuf,
}

impl JsonExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir).map_err(|source| PipelineError::FileOperation {
            path: output_dir.clone(),
            source,
        })?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write `documentation.json` into the output directory.
    pub fn export(&self, result: &DocumentationResult, pretty: bool) -> Result<PathBuf> {
        self.export_as(result, DEFAULT_FILE_NAME, pretty)
    }

    pub fn export_as(
        &self,
        result: &DocumentationResult,
        file_name: &str,
        pretty: bool,
    ) -> Result<PathBuf> {
        let path = self.output_dir.join(file_name);
        let json = if pretty {
            serde_json::to_string_pretty(result)?
        } else {
            serde_json::to_string(result)?
        };

        fs::write(&path, json).map_err(|source| PipelineError::FileOperation {
            path: path.clone(),
            source,
        })?;

        info!(
            "Exported documentation for {} declarations to {}",
            result.summary.declarations,
            path.display()
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FileDocumentation, Language};
    use tempfile::tempdir;

    fn result() -> DocumentationResult {
        DocumentationResult::new(vec![FileDocumentation {
            path: "a.py".to_string(),
            language: Language::Python,
            declarations: vec![],
            entries: vec![],
        }])
    }

    #[test]
    fn test_exporter_creates_nested_dir() {
        let dir = tempdir().unwrap();
        let exporter = JsonExporter::new(dir.path().join("out/docs")).unwrap();
        assert!(exporter.output_dir().is_dir());
    }

    #[test]
    fn test_export_writes_documentation_json() {
        let dir = tempdir().unwrap();
        let exporter = JsonExporter::new(dir.path()).unwrap();
        let result = result();

        let path = exporter.export(&result, true).unwrap();
        assert_eq!(path, dir.path().join("documentation.json"));

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["request_id"], result.request_id.to_string());
        assert_eq!(value["files"][0]["path"], "a.py");
        assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_compact_export() {
        let dir = tempdir().unwrap();
        let exporter = JsonExporter::new(dir.path()).unwrap();

        let path = exporter.export_as(&result(), "compact.json", false).unwrap();
        assert!(!fs::read_to_string(path).unwrap().contains('\n'));
    }
}
