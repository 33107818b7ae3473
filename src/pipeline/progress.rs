// file: src/pipeline/progress.rs
// description: pipeline counters and progress reporting for batch runs
// reference: uses indicatif for progress bars and atomics for shared counters

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Snapshot of the counters served at `GET /stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineStats {
    pub requests: u64,
    pub requests_failed: u64,
    pub files_processed: u64,
    pub bytes_processed: u64,
    pub declarations_documented: u64,
    pub declarations_failed: u64,
    pub index_entries: usize,
    pub uptime_secs: u64,
}

/// Process-wide counters shared by concurrent requests.
#[derive(Debug)]
pub struct PipelineCounters {
    requests: AtomicU64,
    requests_failed: AtomicU64,
    files_processed: AtomicU64,
    bytes_processed: AtomicU64,
    declarations_documented: AtomicU64,
    declarations_failed: AtomicU64,
    started: Instant,
}

impl Default for PipelineCounters {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineCounters {
    pub fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
            files_processed: AtomicU64::new(0),
            bytes_processed: AtomicU64::new(0),
            declarations_documented: AtomicU64::new(0),
            declarations_failed: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_request_failed(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_files(&self, files: u64, bytes: u64) {
        self.files_processed.fetch_add(files, Ordering::Relaxed);
        self.bytes_processed.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_declarations(&self, documented: u64, failed: u64) {
        self.declarations_documented
            .fetch_add(documented, Ordering::Relaxed);
        self.declarations_failed.fetch_add(failed, Ordering::Relaxed);
    }

    pub fn snapshot(&self, index_entries: usize) -> PipelineStats {
        PipelineStats {
            requests: self.requests.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            files_processed: self.files_processed.load(Ordering::Relaxed),
            bytes_processed: self.bytes_processed.load(Ordering::Relaxed),
            declarations_documented: self.declarations_documented.load(Ordering::Relaxed),
            declarations_failed: self.declarations_failed.load(Ordering::Relaxed),
            index_entries,
            uptime_secs: self.started.elapsed().as_secs(),
        }
    }
}

/// Terminal progress for the `document` command: one tick per file.
pub struct ProgressTracker {
    main_bar: ProgressBar,
    detail_bar: ProgressBar,
    documented: AtomicU64,
    failed: AtomicU64,
    files_failed: AtomicU64,
}

impl ProgressTracker {
    pub fn with_color(total_files: usize, colored: bool) -> Self {
        let multi_progress = MultiProgress::new();

        let main_bar = create_progress_bar(&multi_progress, total_files as u64, colored);
        let detail_bar = create_detail_bar(&multi_progress);

        Self {
            main_bar,
            detail_bar,
            documented: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            files_failed: AtomicU64::new(0),
        }
    }

    pub fn file_done(&self, documented: usize, failed: usize) {
        self.documented.fetch_add(documented as u64, Ordering::SeqCst);
        self.failed.fetch_add(failed as u64, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn file_failed(&self) {
        self.files_failed.fetch_add(1, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn set_message(&self, message: String) {
        self.main_bar.set_message(message);
    }

    pub fn finish(&self) {
        self.main_bar.finish_with_message("Documentation complete");
        self.detail_bar.finish_and_clear();
    }

    /// (declarations documented, declarations failed, files failed)
    pub fn totals(&self) -> (u64, u64, u64) {
        (
            self.documented.load(Ordering::SeqCst),
            self.failed.load(Ordering::SeqCst),
            self.files_failed.load(Ordering::SeqCst),
        )
    }

    fn update_detail_bar(&self) {
        let (documented, failed, files_failed) = self.totals();
        self.detail_bar.set_message(format!(
            "Documented: {} | Failed: {} | Files skipped: {}",
            documented, failed, files_failed
        ));
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.finish();
    }
}

fn create_progress_bar(multi_progress: &MultiProgress, total: u64, colored: bool) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(total));
    let (template, chars) = if colored {
        (
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
            "█▓▒░",
        )
    } else {
        (
            "{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({eta}) {msg}",
            "=>-",
        )
    };

    let style = ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars(chars);
    bar.set_style(style);
    bar
}

fn create_detail_bar(multi_progress: &MultiProgress) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(0));
    let style = ProgressStyle::default_bar()
        .template("{msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}
