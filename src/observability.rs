use std::sync::atomic::{AtomicU64, Ordering};

/// Advisory counters shared across the pipeline workers. Never drives
/// control flow.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    samples_ingested: AtomicU64,
    decode_errors: AtomicU64,
    records_persisted: AtomicU64,
    persist_failures: AtomicU64,
    inferences_completed: AtomicU64,
    inference_failures: AtomicU64,
    control_writes: AtomicU64,
    write_failures: AtomicU64,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_sample(&self) {
        self.samples_ingested.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persisted(&self) {
        self.records_persisted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persist_failure(&self) {
        self.persist_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_inference(&self) {
        self.inferences_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_inference_failure(&self) {
        self.inference_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write(&self) {
        self.control_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn samples_ingested(&self) -> u64 {
        self.samples_ingested.load(Ordering::Relaxed)
    }

    pub fn decode_errors(&self) -> u64 {
        self.decode_errors.load(Ordering::Relaxed)
    }

    pub fn records_persisted(&self) -> u64 {
        self.records_persisted.load(Ordering::Relaxed)
    }

    pub fn persist_failures(&self) -> u64 {
        self.persist_failures.load(Ordering::Relaxed)
    }

    pub fn inferences_completed(&self) -> u64 {
        self.inferences_completed.load(Ordering::Relaxed)
    }

    pub fn inference_failures(&self) -> u64 {
        self.inference_failures.load(Ordering::Relaxed)
    }

    pub fn control_writes(&self) -> u64 {
        self.control_writes.load(Ordering::Relaxed)
    }

    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }
}
