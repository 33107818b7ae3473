// file: src/pipeline/orchestrator.rs
// description: coordinates ingestion, extraction, context retrieval and generation
// reference: request-scoped asynchronous documentation workflow

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::index::{ContextStore, InMemoryContextIndex};
use crate::ingest::{Ingestor, SubmittedFile};
use crate::llm::{GenerativeModel, PromptTemplate, build_model, structure_documentation};
use crate::models::{
    ContextMatch, DeclarationNode, DocumentationResult, FileDocumentation, NodeDocumentation,
    NodeOutcome, SourceUnit, flatten,
};
use crate::parser::GrammarRegistry;
use crate::pipeline::progress::{PipelineCounters, PipelineStats};
use crate::utils::{HealthCheck, HealthReport, OperationTimer};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const DEADLINE_EXCEEDED: &str = "request deadline exceeded before documentation was generated";

pub struct DocumentationPipeline {
    ingestor: Ingestor,
    grammars: GrammarRegistry,
    store: Arc<dyn ContextStore>,
    model: Arc<dyn GenerativeModel>,
    request_timeout: Duration,
    call_timeout: Duration,
    retry_delay: Duration,
    max_retries: u32,
    max_concurrent_calls: usize,
    counters: PipelineCounters,
}

/// One declaration waiting for documentation. `attempts` is shared with
/// the caller so abandoned jobs still report how often they were tried.
struct GenerationJob {
    node: DeclarationNode,
    template: PromptTemplate,
    context: Vec<ContextMatch>,
    attempts: Arc<AtomicU32>,
}

impl DocumentationPipeline {
    /// Pipeline with an empty in-memory index and the configured model.
    pub fn new(config: &Config) -> Result<Self> {
        let store: Arc<dyn ContextStore> =
            Arc::new(InMemoryContextIndex::new(config.index.clone()));
        let model = build_model(&config.generation)?;
        Ok(Self::with_components(config, store, model))
    }

    pub fn with_components(
        config: &Config,
        store: Arc<dyn ContextStore>,
        model: Arc<dyn GenerativeModel>,
    ) -> Self {
        Self {
            ingestor: Ingestor::new(config.pipeline.max_file_size_mb),
            grammars: GrammarRegistry::new(),
            store,
            model,
            request_timeout: config.server.request_timeout(),
            call_timeout: config.generation.call_timeout(),
            retry_delay: config.generation.retry_delay(),
            max_retries: config.generation.max_retries,
            max_concurrent_calls: config.generation.max_concurrent_calls.max(1),
            counters: PipelineCounters::new(),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn store(&self) -> &Arc<dyn ContextStore> {
        &self.store
    }

    pub fn model(&self) -> &Arc<dyn GenerativeModel> {
        &self.model
    }

    pub fn stats(&self) -> PipelineStats {
        self.counters.snapshot(self.store.len())
    }

    pub fn health(&self) -> HealthReport {
        let start = Instant::now();
        let index = self.store.stats();
        let index_check = if index.entries >= index.capacity {
            HealthCheck::degraded(
                "context_index",
                format!("{} entries at capacity, evicting oldest", index.entries),
                start.elapsed(),
            )
        } else {
            HealthCheck::healthy("context_index", start.elapsed())
                .with_message(format!("{}/{} entries", index.entries, index.capacity))
        };

        let model_check = if self.model.is_remote() {
            HealthCheck::healthy("generative_model", Duration::ZERO)
                .with_message(self.model.name().to_string())
        } else {
            HealthCheck::degraded(
                "generative_model",
                format!("{} in use, no API key configured", self.model.name()),
                Duration::ZERO,
            )
        };

        HealthReport::new(vec![index_check, model_check])
    }

    /// Validate submitted files and extract their declaration trees.
    pub async fn extract(
        &self,
        files: Vec<SubmittedFile>,
    ) -> Result<Vec<(SourceUnit, Vec<DeclarationNode>)>> {
        let units = self.ingestor.ingest(files)?;
        let grammars = self.grammars.clone();

        tokio::task::spawn_blocking(move || {
            units
                .into_iter()
                .map(|unit| {
                    let nodes = grammars.extract(&unit)?;
                    Ok((unit, nodes))
                })
                .collect::<Result<Vec<_>>>()
        })
        .await
        .map_err(|e| PipelineError::Server(format!("Extraction task failed: {}", e)))?
    }

    /// Run one request end to end.
    ///
    /// Fails on invalid input or a parse error in any file. Generation
    /// failures are reported per declaration; the request fails with
    /// `GenerationFailure` only when every declaration failed.
    pub async fn process(&self, files: Vec<SubmittedFile>) -> Result<DocumentationResult> {
        self.counters.record_request();
        let result = self.run(files).await;
        if result.is_err() {
            self.counters.record_request_failed();
        }
        result
    }

    async fn run(&self, files: Vec<SubmittedFile>) -> Result<DocumentationResult> {
        let timer = OperationTimer::new("process request");
        let deadline = tokio::time::Instant::now() + self.request_timeout;

        let extracted = self.extract(files).await?;
        let bytes: usize = extracted.iter().map(|(unit, _)| unit.size()).sum();
        self.counters.record_files(extracted.len() as u64, bytes as u64);

        let outcomes = {
            let nodes: Vec<(&SourceUnit, &DeclarationNode)> = extracted
                .iter()
                .flat_map(|(unit, nodes)| flatten(nodes).into_iter().map(move |node| (unit, node)))
                .collect();
            let queries: Vec<&DeclarationNode> = nodes.iter().map(|(_, node)| *node).collect();
            let contexts = self.store.search_batch(&queries);

            let jobs: Vec<GenerationJob> = nodes
                .iter()
                .zip(contexts)
                .map(|(&(unit, node), context)| GenerationJob {
                    node: node.clone(),
                    template: PromptTemplate::for_language(unit.language),
                    context,
                    attempts: Arc::new(AtomicU32::new(0)),
                })
                .collect();

            info!(
                "Documenting {} declarations from {} files",
                jobs.len(),
                extracted.len()
            );
            self.generate_all(jobs, deadline).await
        };

        for (unit, nodes) in &extracted {
            self.store.index(unit, &flatten(nodes));
        }

        let mut outcomes = outcomes.into_iter();
        let files: Vec<FileDocumentation> = extracted
            .into_iter()
            .map(|(unit, declarations)| {
                let entries = flatten(&declarations)
                    .into_iter()
                    .map(|node| {
                        let outcome = outcomes.next().unwrap_or_else(|| NodeOutcome::Failed {
                            error: DEADLINE_EXCEEDED.to_string(),
                            attempts: 0,
                        });
                        NodeDocumentation::new(node, outcome)
                    })
                    .collect();

                FileDocumentation {
                    path: unit.path,
                    language: unit.language,
                    declarations,
                    entries,
                }
            })
            .collect();

        let result = DocumentationResult::new(files);
        self.counters.record_declarations(
            result.summary.documented as u64,
            result.summary.failed as u64,
        );
        timer.warn_if_slow(self.request_timeout / 2, "documentation request");
        timer.finish_with_count(result.summary.declarations);

        if result.all_failed() {
            let reason = result
                .entries()
                .find_map(|entry| match &entry.outcome {
                    NodeOutcome::Failed { error, .. } => Some(error.clone()),
                    NodeOutcome::Success { .. } => None,
                })
                .unwrap_or_default();
            return Err(PipelineError::GenerationFailure(format!(
                "all {} declarations failed, first error: {}",
                result.summary.declarations, reason
            )));
        }

        Ok(result)
    }

    /// Concurrent generation; outcomes come back in job order. Jobs still
    /// outstanding at the deadline are dropped and reported as failed.
    async fn generate_all(
        &self,
        jobs: Vec<GenerationJob>,
        deadline: tokio::time::Instant,
    ) -> Vec<NodeOutcome> {
        let mut outcomes: Vec<Option<NodeOutcome>> = vec![None; jobs.len()];
        let started: Vec<Arc<AtomicU32>> = jobs.iter().map(|job| job.attempts.clone()).collect();

        {
            let mut pending = stream::iter(jobs.into_iter().enumerate())
                .map(|(position, job)| async move { (position, self.document(job).await) })
                .buffer_unordered(self.max_concurrent_calls);

            loop {
                match tokio::time::timeout_at(deadline, pending.next()).await {
                    Ok(Some((position, outcome))) => outcomes[position] = Some(outcome),
                    Ok(None) => break,
                    Err(_) => {
                        let outstanding = outcomes.iter().filter(|o| o.is_none()).count();
                        warn!(
                            "Request deadline reached, abandoning {} outstanding generation calls",
                            outstanding
                        );
                        break;
                    }
                }
            }
        }

        outcomes
            .into_iter()
            .zip(started)
            .map(|(outcome, started)| {
                outcome.unwrap_or_else(|| NodeOutcome::Failed {
                    error: DEADLINE_EXCEEDED.to_string(),
                    attempts: started.load(Ordering::Relaxed),
                })
            })
            .collect()
    }

    async fn document(&self, job: GenerationJob) -> NodeOutcome {
        let prompt = job.template.render(&job.node, &job.context);
        let attempts = self.max_retries.saturating_add(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            job.attempts.store(attempt, Ordering::Relaxed);
            match tokio::time::timeout(self.call_timeout, self.model.generate(&prompt)).await {
                Ok(Ok(text)) => {
                    debug!("Documented {} on attempt {}", job.node.id, attempt);
                    return NodeOutcome::Success {
                        sections: structure_documentation(&text),
                        text,
                        context: job.context,
                    };
                }
                Ok(Err(e)) => last_error = e.to_string(),
                Err(_) => {
                    last_error = format!(
                        "model call timed out after {:.1}s",
                        self.call_timeout.as_secs_f64()
                    )
                }
            }

            warn!(
                "Generation attempt {}/{} for {} failed: {}",
                attempt, attempts, job.node.id, last_error
            );
            if attempt < attempts {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        NodeOutcome::Failed {
            error: last_error,
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::FallbackModel;
    use crate::models::Language;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    const CPP_EXAMPLE: &str = r#"#include <iostream>
#include <string>

class TestClass {
public:
    TestClass(std::string name) : name_(name) {}

    std::string greet() {
        return "Hello, " + name_ + "!";
    }

private:
    std::string name_;
};
"#;

    const JS_EXAMPLE: &str = r#"class TestClass {
    constructor(name) {
        this.name = name;
    }

    greet() {
        return `Hello, ${this.name}!`;
    }
}
"#;

    /// Answers from the prompt header; fails a fixed number of times for
    /// declarations whose qualified name is listed in `failures`.
    struct ScriptedModel {
        failures: Mutex<HashMap<String, u32>>,
        hang_on: Option<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new() -> Self {
            Self {
                failures: Mutex::new(HashMap::new()),
                hang_on: None,
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing(self, qualified_name: &str, times: u32) -> Self {
            self.failures
                .lock()
                .insert(format!("`{}`.", qualified_name), times);
            self
        }

        fn hanging_on(mut self, qualified_name: &str) -> Self {
            self.hang_on = Some(format!("`{}`.", qualified_name));
            self
        }
    }

    #[async_trait]
    impl GenerativeModel for ScriptedModel {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().push(prompt.to_string());
            let header = prompt.lines().next().unwrap_or_default().to_string();

            if let Some(marker) = &self.hang_on
                && header.ends_with(marker.as_str())
            {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }

            {
                let mut failures = self.failures.lock();
                if let Some(remaining) = failures
                    .iter_mut()
                    .find(|(marker, _)| header.ends_with(marker.as_str()))
                    .map(|(_, remaining)| remaining)
                    && *remaining > 0
                {
                    *remaining -= 1;
                    return Err(PipelineError::GenerationFailure("model unavailable".to_string()));
                }
            }

            Ok(format!("Overview: {}\n\nNotes: scripted", header))
        }
    }

    fn test_config() -> Config {
        let mut config = Config::default_config();
        config.generation.retry_delay_ms = 0;
        config.generation.call_timeout_secs = 5;
        config.index.min_score = 0.0;
        config
    }

    fn pipeline(model: Arc<dyn GenerativeModel>) -> DocumentationPipeline {
        let config = test_config();
        let store: Arc<dyn ContextStore> =
            Arc::new(InMemoryContextIndex::new(config.index.clone()));
        DocumentationPipeline::with_components(&config, store, model)
    }

    fn names(result: &DocumentationResult) -> Vec<String> {
        result.entries().map(|e| e.qualified_name.clone()).collect()
    }

    #[tokio::test]
    async fn test_cpp_example_documents_class_and_members() {
        let pipeline = pipeline(Arc::new(ScriptedModel::new()));
        let result = pipeline
            .process(vec![SubmittedFile::new("test.cpp", CPP_EXAMPLE)])
            .await
            .unwrap();

        let file = &result.files[0];
        assert_eq!(file.language, Language::Cpp);
        let class = file
            .declarations
            .iter()
            .find(|d| d.name == "TestClass")
            .unwrap();
        let members: Vec<&str> = class.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(members, vec!["TestClass", "greet"]);

        let class_entries: Vec<String> = names(&result)
            .into_iter()
            .filter(|n| n.starts_with("TestClass"))
            .collect();
        assert_eq!(
            class_entries,
            vec!["TestClass", "TestClass::TestClass", "TestClass::greet"]
        );
        assert!(result.entries().all(|e| e.outcome.is_success()));
    }

    #[tokio::test]
    async fn test_js_example_entries_in_declaration_order() {
        let pipeline = pipeline(Arc::new(ScriptedModel::new()));
        let result = pipeline
            .process(vec![SubmittedFile::new("test.js", JS_EXAMPLE)])
            .await
            .unwrap();

        assert_eq!(
            names(&result),
            vec!["TestClass", "TestClass::constructor", "TestClass::greet"]
        );
        assert_eq!(result.summary.documented, 3);

        let first = result.entries().next().unwrap();
        match &first.outcome {
            NodeOutcome::Success { text, sections, .. } => {
                assert!(text.contains("JavaScript class `TestClass`"));
                assert!(sections.overview.starts_with("Overview:"));
                assert_eq!(sections.notes, vec!["Notes: scripted"]);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_partial_failure_marks_only_failing_node() {
        let model = ScriptedModel::new().failing("TestClass::greet", 5);
        let pipeline = pipeline(Arc::new(model));
        let result = pipeline
            .process(vec![SubmittedFile::new("test.js", JS_EXAMPLE)])
            .await
            .unwrap();

        assert_eq!(result.summary.documented, 2);
        assert_eq!(result.summary.failed, 1);

        let greet = result
            .entries()
            .find(|e| e.qualified_name == "TestClass::greet")
            .unwrap();
        match &greet.outcome {
            NodeOutcome::Failed { error, attempts } => {
                assert_eq!(*attempts, 2);
                assert!(error.contains("model unavailable"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_single_failure_is_retried() {
        let model = ScriptedModel::new().failing("TestClass::greet", 1);
        let pipeline = pipeline(Arc::new(model));
        let result = pipeline
            .process(vec![SubmittedFile::new("test.js", JS_EXAMPLE)])
            .await
            .unwrap();

        assert_eq!(result.summary.failed, 0);
        assert_eq!(result.summary.documented, 3);
    }

    #[tokio::test]
    async fn test_all_failed_is_generation_failure() {
        let model = ScriptedModel::new()
            .failing("TestClass", 5)
            .failing("TestClass::constructor", 5)
            .failing("TestClass::greet", 5);
        let pipeline = pipeline(Arc::new(model));

        let err = pipeline
            .process(vec![SubmittedFile::new("test.js", JS_EXAMPLE)])
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::GenerationFailure(_)));

        let stats = pipeline.stats();
        assert_eq!(stats.requests, 1);
        assert_eq!(stats.requests_failed, 1);
        assert_eq!(stats.declarations_failed, 3);
    }

    #[tokio::test]
    async fn test_no_declarations_is_success() {
        let pipeline = pipeline(Arc::new(ScriptedModel::new()));
        let result = pipeline
            .process(vec![SubmittedFile::new("vars.py", "x = 1\ny = 2\n")])
            .await
            .unwrap();

        assert_eq!(result.summary.declarations, 0);
        assert!(!result.all_failed());
    }

    #[tokio::test]
    async fn test_parse_failure_fails_request_without_indexing() {
        let pipeline = pipeline(Arc::new(ScriptedModel::new()));
        let err = pipeline
            .process(vec![
                SubmittedFile::new("ok.py", "def ok():\n    return 1\n"),
                SubmittedFile::new("broken.js", "function f() {\n  return 1;\n"),
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::ParseFailure { .. }));
        assert!(pipeline.store().is_empty());
    }

    #[tokio::test]
    async fn test_client_errors_surface_immediately() {
        let pipeline = pipeline(Arc::new(ScriptedModel::new()));

        let err = pipeline.process(vec![]).await.unwrap_err();
        assert!(matches!(err, PipelineError::EmptyInput(_)));

        let err = pipeline
            .process(vec![SubmittedFile::new("main.go", "package main")])
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedLanguage(_)));
    }

    #[tokio::test]
    async fn test_later_requests_receive_context() {
        let model = Arc::new(ScriptedModel::new());
        let pipeline = pipeline(model.clone());

        let first = pipeline
            .process(vec![SubmittedFile::new("first.js", JS_EXAMPLE)])
            .await
            .unwrap();
        assert!(first.entries().all(|e| match &e.outcome {
            NodeOutcome::Success { context, .. } => context.is_empty(),
            NodeOutcome::Failed { .. } => false,
        }));
        assert_eq!(pipeline.store().len(), 3);

        let second = pipeline
            .process(vec![SubmittedFile::new("second.js", JS_EXAMPLE)])
            .await
            .unwrap();
        let greet = second
            .entries()
            .find(|e| e.qualified_name == "TestClass::greet")
            .unwrap();
        match &greet.outcome {
            NodeOutcome::Success { context, .. } => {
                assert_eq!(context[0].unit_path, "first.js");
                assert_eq!(context[0].name, "greet");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        let prompts = model.prompts.lock();
        assert!(prompts.iter().any(|p| p.contains("Similar code patterns found:")));
    }

    #[tokio::test]
    async fn test_deadline_returns_partial_results() {
        let model = ScriptedModel::new().hanging_on("TestClass::greet");
        let pipeline = pipeline(Arc::new(model)).with_request_timeout(Duration::from_millis(300));

        let result = pipeline
            .process(vec![SubmittedFile::new("test.js", JS_EXAMPLE)])
            .await
            .unwrap();

        assert_eq!(result.summary.documented, 2);
        let greet = result
            .entries()
            .find(|e| e.qualified_name == "TestClass::greet")
            .unwrap();
        match &greet.outcome {
            NodeOutcome::Failed { error, attempts } => {
                assert_eq!(error, DEADLINE_EXCEEDED);
                assert_eq!(*attempts, 1);
            }
            other => panic!("expected deadline failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_deadline_during_retry_delay_counts_first_attempt() {
        let mut config = test_config();
        config.generation.retry_delay_ms = 30_000;
        let store: Arc<dyn ContextStore> =
            Arc::new(InMemoryContextIndex::new(config.index.clone()));
        let model = ScriptedModel::new().failing("TestClass::greet", 5);
        let pipeline = DocumentationPipeline::with_components(&config, store, Arc::new(model))
            .with_request_timeout(Duration::from_millis(300));

        let result = pipeline
            .process(vec![SubmittedFile::new("test.js", JS_EXAMPLE)])
            .await
            .unwrap();

        let greet = result
            .entries()
            .find(|e| e.qualified_name == "TestClass::greet")
            .unwrap();
        match &greet.outcome {
            NodeOutcome::Failed { error, attempts } => {
                assert_eq!(error, DEADLINE_EXCEEDED);
                assert_eq!(*attempts, 1);
            }
            other => panic!("expected deadline failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unbounded_retry_setting_does_not_overflow() {
        let mut config = test_config();
        config.generation.max_retries = u32::MAX;
        let store: Arc<dyn ContextStore> =
            Arc::new(InMemoryContextIndex::new(config.index.clone()));
        let pipeline =
            DocumentationPipeline::with_components(&config, store, Arc::new(ScriptedModel::new()));

        let result = pipeline
            .process(vec![SubmittedFile::new("test.js", JS_EXAMPLE)])
            .await
            .unwrap();
        assert_eq!(result.summary.documented, 3);
    }

    #[tokio::test]
    async fn test_fallback_model_end_to_end() {
        let pipeline = pipeline(Arc::new(FallbackModel::new()));
        let result = pipeline
            .process(vec![SubmittedFile::new(
                "test.py",
                "def add(a, b):\n    \"\"\"Add two numbers.\"\"\"\n    return a + b\n",
            )])
            .await
            .unwrap();

        let entry = result.entries().next().unwrap();
        match &entry.outcome {
            NodeOutcome::Success { sections, .. } => {
                assert!(sections.overview.contains("Add two numbers."));
                assert_eq!(sections.methods, vec!["Methods: `def add(a, b):`"]);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        let health = pipeline.health();
        assert_eq!(health.checks.len(), 2);
        assert_eq!(health.status, crate::utils::HealthStatus::Degraded);
    }
}
