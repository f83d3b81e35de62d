//! Search feed collection - service layer
//!
//! Walks the pages of a search url and harvests the job summaries carried by
//! the portal's background search API responses. Pagination is driven by
//! navigation; the job data itself is read only from the network.

use crate::infrastructure::PageDriver;
use crate::models::{JobFeed, JobSummary};
use crate::utils::delay::sleep_jitter;
use std::ops::RangeInclusive;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

/// Feeder settings
#[derive(Debug, Clone)]
pub struct FeedCollector {
    api_pattern: String,
    navigation_timeout: Duration,
    page_delay: (Duration, Duration),
}

impl FeedCollector {
    pub fn new(
        api_pattern: impl Into<String>,
        navigation_timeout: Duration,
        page_delay: (Duration, Duration),
    ) -> Self {
        Self {
            api_pattern: api_pattern.into(),
            navigation_timeout,
            page_delay,
        }
    }

    /// Visit every page in `pages` and return the unique jobs seen, first-seen order
    ///
    /// A page that fails or times out is skipped; this never fails as a whole
    /// unless the response subscription itself cannot be set up.
    pub async fn collect<P: PageDriver>(
        &self,
        page: &P,
        search_url: &str,
        pages: RangeInclusive<u32>,
    ) -> anyhow::Result<Vec<JobSummary>> {
        let mut watch = page.watch_responses(&self.api_pattern).await?;
        let mut feed = JobFeed::new();

        for page_no in pages {
            let url = page_url(search_url, page_no);
            info!("🔍 Loading search page {}: {}", page_no, url);

            match timeout(self.navigation_timeout, page.goto(&url)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("⚠️ Search page {} failed: {}", page_no, e);
                    continue;
                }
                Err(_) => {
                    warn!(
                        "⚠️ Search page {} timed out after {}s",
                        page_no,
                        self.navigation_timeout.as_secs()
                    );
                    continue;
                }
            }

            sleep_jitter(self.page_delay).await;

            let added: usize = watch
                .drain()
                .iter()
                .map(|body| feed.absorb_payload(body))
                .sum();
            info!(
                "✓ Page {}: {} new jobs ({} total)",
                page_no,
                added,
                feed.len()
            );
        }

        // responses that landed after the last drain
        for body in watch.drain() {
            feed.absorb_payload(&body);
        }
        drop(watch);

        Ok(feed.into_jobs())
    }
}

/// `search_url` with `pageNo=<n>` appended
pub fn page_url(search_url: &str, page_no: u32) -> String {
    let separator = if search_url.contains('?') { '&' } else { '?' };
    format!("{}{}pageNo={}", search_url, separator, page_no)
}
