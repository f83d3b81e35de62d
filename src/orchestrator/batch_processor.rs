//! Batch job processor - orchestration layer
//!
//! ## Responsibilities
//!
//! Fans job classification out over browser contexts and a bounded number of
//! concurrent pages.
//!
//! ## Core behaviour
//!
//! 1. **Admission gate**: one `Semaphore` caps in-flight jobs at
//!    `max_concurrent_jobs`, however many contexts exist
//! 2. **Batching**: jobs are split into batches; batch *n* runs on context
//!    *n mod contexts*, and every job of a batch is spawned at once
//! 3. **Failure isolation**: a failed or panicked task turns into an error
//!    record; siblings keep running
//! 4. **Throttle**: a jittered delay after every job, still holding the permit
//! 5. **Streaming output**: each record goes to the sink as its batch is joined
//! 6. **Graceful stop**: once the stop flag is set no new batch starts
//!
//! ## Design notes
//!
//! - Owns no browser: contexts come in as `Arc<C>`
//! - Delegates each job to `job_processor::process_job`

use crate::config::Config;
use crate::infrastructure::BrowserSession;
use crate::models::{JobRecord, JobSummary, RunStats};
use crate::orchestrator::job_processor::{self, panic_message};
use crate::services::RecordSink;
use crate::utils::delay::sleep_jitter;
use crate::utils::logging::{log_batch_complete, log_batch_start};
use crate::workflow::{JobCtx, JobFlow};
use anyhow::{bail, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// Records and counts of one harness run
#[derive(Debug, Default)]
pub struct RunReport {
    pub records: Vec<JobRecord>,
    pub stats: RunStats,
}

/// Concurrency harness
pub struct BatchProcessor<C: BrowserSession> {
    contexts: Vec<Arc<C>>,
    flow: Arc<JobFlow>,
    gate: Arc<Semaphore>,
    batch_size: usize,
    job_delay: (Duration, Duration),
    portal_base_url: String,
    stop: Arc<AtomicBool>,
}

impl<C: BrowserSession> std::fmt::Debug for BatchProcessor<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchProcessor")
            .field("contexts", &self.contexts.len())
            .field("batch_size", &self.batch_size)
            .field("job_delay", &self.job_delay)
            .field("portal_base_url", &self.portal_base_url)
            .finish_non_exhaustive()
    }
}

impl<C: BrowserSession> BatchProcessor<C> {
    pub fn new(contexts: Vec<Arc<C>>, config: &Config) -> Result<Self> {
        if contexts.is_empty() {
            bail!("at least one browser context is required");
        }
        if config.max_concurrent_jobs == 0 {
            bail!("max_concurrent_jobs must be at least 1");
        }
        Ok(Self {
            contexts,
            flow: Arc::new(JobFlow::new(config)),
            gate: Arc::new(Semaphore::new(config.max_concurrent_jobs)),
            batch_size: config.effective_batch_size().max(1),
            job_delay: config.job_delay(),
            portal_base_url: config.portal_base_url.clone(),
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Share an externally owned stop flag (e.g. set from a Ctrl-C handler)
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    /// Classify every job; one record per job unless a stop was requested
    pub async fn run(&self, jobs: Vec<JobSummary>, sink: &mut dyn RecordSink) -> RunReport {
        let total = jobs.len();
        let total_batches = total.div_ceil(self.batch_size);
        let mut report = RunReport::default();

        for (batch_idx, batch) in jobs.chunks(self.batch_size).enumerate() {
            let batch_start = batch_idx * self.batch_size;

            if self.stop.load(Ordering::SeqCst) {
                let remaining = total - batch_start;
                warn!(
                    "⏹️ Stop requested, {} jobs left for the next run",
                    remaining
                );
                report.stats.skipped += remaining;
                break;
            }

            let context = self.contexts[batch_idx % self.contexts.len()].clone();
            log_batch_start(
                batch_idx + 1,
                total_batches,
                batch_start + 1,
                batch_start + batch.len(),
                total,
                &context.label(),
            );

            let records = self.run_batch(context, batch, batch_start, total).await;

            let mut batch_stats = RunStats::new();
            for record in records {
                if let Err(e) = sink.write(&record) {
                    error!("💾 Failed to write job {}: {}", record.job_id, e);
                }
                batch_stats.record(&record);
                report.records.push(record);
            }

            log_batch_complete(batch_idx + 1, &batch_stats);
            report.stats.merge(&batch_stats);
        }

        info!(
            "✓ {} records written to {}",
            report.stats.recorded(),
            sink.location()
        );
        report
    }

    async fn run_batch(
        &self,
        context: Arc<C>,
        batch: &[JobSummary],
        batch_start: usize,
        total: usize,
    ) -> Vec<JobRecord> {
        let mut handles = Vec::with_capacity(batch.len());

        for (idx, summary) in batch.iter().enumerate() {
            let job_url = summary.detail_url(&self.portal_base_url);
            let ctx = JobCtx::new(
                summary.job_id.clone(),
                batch_start + idx + 1,
                total,
                context.label(),
            );
            info!(
                "{} {} @ {}",
                ctx,
                summary.display_title(),
                summary.display_company()
            );

            let gate = self.gate.clone();
            let flow = self.flow.clone();
            let context = context.clone();
            let summary_clone = summary.clone();
            let url_clone = job_url.clone();
            let job_delay = self.job_delay;

            let handle = tokio::spawn(async move {
                // permit is taken inside the task so the loop never blocks
                let _permit = match gate.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        return JobRecord::failed(
                            &summary_clone.job_id,
                            &url_clone,
                            format!("admission gate closed: {}", e),
                        )
                    }
                };
                let record = job_processor::process_job(
                    context.as_ref(),
                    &flow,
                    &summary_clone,
                    &url_clone,
                    &ctx,
                )
                .await;
                sleep_jitter(job_delay).await;
                record
            });
            handles.push((summary.job_id.clone(), job_url, handle));
        }

        let mut records = Vec::with_capacity(handles.len());
        for (job_id, job_url, handle) in handles {
            let record = match handle.await {
                Ok(record) => record,
                Err(e) => {
                    let message = if e.is_panic() {
                        format!("task panicked: {}", panic_message(e.into_panic().as_ref()))
                    } else {
                        format!("task failed: {}", e)
                    };
                    error!("[Job #{}] ❌ {}", job_id, message);
                    JobRecord::failed(job_id, job_url, message)
                }
            };
            records.push(record);
        }
        records
    }
}
