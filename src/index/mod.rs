// file: src/index/mod.rs
// description: context index module exports
// reference: internal module structure

pub mod similarity;
pub mod store;

pub use similarity::Fingerprint;
pub use store::{ContextStore, InMemoryContextIndex, IndexStats};
