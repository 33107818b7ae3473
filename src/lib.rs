// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod error;
pub mod exporter;
pub mod index;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod server;
pub mod utils;

pub use config::{Config, GenerationConfig, IndexConfig, PipelineConfig, ServerConfig};
pub use error::{PipelineError, Result};
pub use exporter::JsonExporter;
pub use index::{ContextStore, InMemoryContextIndex, IndexStats};
pub use ingest::{FileScanner, Ingestor, ProcessRequest, ScannedFile, SubmittedFile};
pub use llm::{ChatCompletionClient, FallbackModel, GenerativeModel, PromptTemplate};
pub use models::{
    ContextMatch, DeclarationKind, DeclarationNode, DocumentationResult, FileDocumentation,
    Language, NodeDocumentation, NodeOutcome, SourceUnit,
};
pub use parser::{GrammarProvider, GrammarRegistry};
pub use pipeline::{DocumentationPipeline, PipelineStats, ProgressTracker};
pub use utils::{HealthCheck, HealthReport, HealthStatus, OperationTimer, Validator};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let config = Config::default_config();
        let pipeline = DocumentationPipeline::new(&config).unwrap();
        assert!(pipeline.store().is_empty());
        assert!(!pipeline.model().is_remote());
    }
}
