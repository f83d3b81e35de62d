/// Logging utilities
///
/// Subscriber setup plus the progress-line helpers used by the orchestrator.
use crate::config::Config;
use crate::models::RunStats;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber
///
/// `RUST_LOG` wins; otherwise `info`, or `debug` when `verbose` is set.
/// Calling it twice is harmless.
pub fn init(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Startup banner
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 Apply-flow classifier starting");
    info!(
        "🕒 Started at: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!(
        "📊 Max concurrent jobs: {} | contexts: {} | batch size: {}",
        config.max_concurrent_jobs,
        config.num_contexts,
        config.effective_batch_size()
    );
    info!(
        "📄 Search pages {}-{} over {} search url(s)",
        config.start_page,
        config.end_page,
        config.search_urls.len()
    );
    info!("{}", "=".repeat(60));
}

/// Jobs ready for classification
pub fn log_jobs_loaded(total: usize, batch_size: usize) {
    info!("✓ {} jobs to classify", total);
    info!("📋 Processing in batches of {}", batch_size);
}

/// # Parameters
/// - `start`/`end`: 1-based job positions covered by the batch
/// - `context`: label of the browser context the batch runs in
pub fn log_batch_start(
    batch_num: usize,
    total_batches: usize,
    start: usize,
    end: usize,
    total: usize,
    context: &str,
) {
    info!("\n{}", "=".repeat(60));
    info!("📦 Batch {}/{} on {}", batch_num, total_batches, context);
    info!("📄 Jobs {}-{} of {}", start, end, total);
    info!("{}", "=".repeat(60));
}

pub fn log_batch_complete(batch_num: usize, stats: &RunStats) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ Batch {} done: {} recorded, {} errors",
        batch_num,
        stats.recorded(),
        stats.errors()
    );
    for (status, count) in stats.breakdown() {
        info!("   {:<16} {}", status, count);
    }
    info!("{}", "─".repeat(60));
}

pub fn print_final_stats(stats: &RunStats, output: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 Run complete");
    info!(
        "🕒 Finished at: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ Recorded: {}", stats.recorded());
    for (status, count) in stats.breakdown() {
        info!("   {:<16} {}", status, count);
    }
    info!("❌ Errors: {}", stats.errors());
    if stats.skipped > 0 {
        info!("⏭️ Skipped after stop request: {}", stats.skipped);
    }
    info!("{}", "=".repeat(60));
    info!("\n💾 Results saved to: {}", output);
}

/// Cut long text for log lines
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
