// file: src/ingest/mod.rs
// description: ingestion module exports
// reference: internal module structure

pub mod request;
pub mod scanner;

pub use request::{Ingestor, ProcessRequest, SubmittedFile};
pub use scanner::{FileScanner, ScannedFile};
