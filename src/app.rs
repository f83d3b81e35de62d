//! Application entry - owns the browser for the whole run
//!
//! 1. **Initialisation**: output file, processed-id set, browser, contexts
//! 2. **Login**: wait for the user on context 0 unless skipped
//! 3. **Per search url**: collect → filter → cap → harness
//! 4. **Shutdown**: final stats, contexts disposed

use crate::browser::{self, BrowserHandle};
use crate::config::Config;
use crate::infrastructure::{ChromeContext, PageDriver};
use crate::models::{load_processed_ids, JobSummary, RunStats};
use crate::orchestrator::BatchProcessor;
use crate::services::{default_output_file, open_sink, FeedCollector};
use crate::utils::logging::{log_jobs_loaded, log_startup, print_final_stats};
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const LOGIN_POLL: Duration = Duration::from_secs(1);

/// Application main structure
pub struct App {
    config: Config,
    browser: BrowserHandle,
    contexts: Vec<Arc<ChromeContext>>,
    processed: HashSet<String>,
    output_file: String,
    stop: Arc<AtomicBool>,
}

impl App {
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let output_file = config
            .output_file
            .clone()
            .unwrap_or_else(default_output_file);
        let resume_path = config.resume_from.as_deref().unwrap_or(&output_file);
        let processed = load_processed_ids(Path::new(resume_path))
            .with_context(|| format!("cannot read processed jobs from {}", resume_path))?;

        let browser = BrowserHandle::start(&config).await?;
        let contexts =
            browser::create_contexts(&browser.browser, config.num_contexts, browser.connected)
                .await?;

        let stop = Arc::new(AtomicBool::new(false));
        listen_for_ctrl_c(stop.clone());

        Ok(Self {
            config,
            browser,
            contexts,
            processed,
            output_file,
            stop,
        })
    }

    pub async fn run(&self) -> Result<()> {
        let mut sink = open_sink(&self.output_file)?;
        info!("💾 Writing results to {}", sink.location());

        let search_page = self
            .contexts
            .first()
            .context("no browser context available")?
            .open_page_at("about:blank")
            .await
            .context("cannot open search page")?;

        if !self.config.skip_login {
            browser::wait_for_login(
                &search_page,
                &self.config.login_url,
                Duration::from_secs(self.config.login_timeout_secs),
                LOGIN_POLL,
            )
            .await?;
        }

        let collector = FeedCollector::new(
            &self.config.search_api_pattern,
            self.config.navigation_timeout(),
            self.config.page_delay(),
        );
        let harness = BatchProcessor::new(self.contexts.clone(), &self.config)?
            .with_stop_flag(self.stop.clone());

        let mut processed = self.processed.clone();
        let mut stats = RunStats::new();

        for search_url in &self.config.search_urls {
            if self.stop.load(Ordering::SeqCst) {
                break;
            }
            info!("\n🔍 Collecting jobs from {}", search_url);

            let found = match collector
                .collect(
                    &search_page,
                    search_url,
                    self.config.start_page..=self.config.end_page,
                )
                .await
            {
                Ok(jobs) => jobs,
                Err(e) => {
                    warn!("⚠️ Search {} failed: {:#}", search_url, e);
                    continue;
                }
            };

            let found_count = found.len();
            let jobs = select_jobs(found, &processed, self.config.max_jobs_per_search);
            info!(
                "📋 {} jobs found, {} new after filtering",
                found_count,
                jobs.len()
            );
            if jobs.is_empty() {
                continue;
            }

            log_jobs_loaded(jobs.len(), self.config.effective_batch_size());
            let report = harness.run(jobs, sink.as_mut()).await;
            processed.extend(report.records.iter().map(|r| r.job_id.clone()));
            stats.merge(&report.stats);
        }

        if let Err(e) = search_page.close().await {
            debug!("search page already closed: {}", e);
        }

        print_final_stats(&stats, &sink.location());
        Ok(())
    }

    /// Dispose the contexts this run created
    pub async fn shutdown(self) {
        browser::dispose_contexts(&self.browser.browser, &self.contexts).await;
    }
}

/// Up to `cap` jobs that are not processed yet, in feed order
pub fn select_jobs(
    jobs: Vec<JobSummary>,
    processed: &HashSet<String>,
    cap: usize,
) -> Vec<JobSummary> {
    jobs.into_iter()
        .filter(|job| !processed.contains(&job.job_id))
        .take(cap)
        .collect()
}

fn listen_for_ctrl_c(stop: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("⏹️ Ctrl-C received, finishing the current batch");
            stop.store(true, Ordering::SeqCst);
        }
    });
}
