//! Single-job flow - workflow layer
//!
//! open job page → extract details → classify the apply flow.
//! Details are written into the record before classification starts, so an
//! error later on still leaves them in the output.

use anyhow::Result;
use tracing::info;

use crate::config::Config;
use crate::infrastructure::PageDriver;
use crate::models::JobRecord;
use crate::services::DetailExtractor;
use crate::utils::logging::truncate_text;
use crate::workflow::apply_flow::ApplyFlow;
use crate::workflow::job_ctx::JobCtx;

pub struct JobFlow {
    extractor: DetailExtractor,
    apply_flow: ApplyFlow,
}

impl JobFlow {
    pub fn new(config: &Config) -> Self {
        Self {
            extractor: DetailExtractor::new(),
            apply_flow: ApplyFlow::new(config),
        }
    }

    pub fn apply_flow(&self) -> &ApplyFlow {
        &self.apply_flow
    }

    /// Fill `record` for the job at `record.job_url`
    pub async fn run<P: PageDriver>(
        &self,
        page: &P,
        record: &mut JobRecord,
        ctx: &JobCtx,
    ) -> Result<()> {
        let job_url = record.job_url.clone();
        info!("{} 🌐 Opening {}", ctx, job_url);
        self.apply_flow.open(page, &job_url).await?;

        let details = self.extractor.extract(page).await;
        info!(
            "{} 📄 {} @ {}",
            ctx,
            truncate_text(details.title.as_deref().unwrap_or("Unknown"), 60),
            details.company.as_deref().unwrap_or("Unknown")
        );
        record.apply_details(details);

        let outcome = self.apply_flow.classify_loaded(page, &job_url, ctx).await?;
        info!(
            "{} ✓ Apply type: {} | status: {}",
            ctx, outcome.apply_type, outcome.status
        );
        record.apply_outcome(outcome);
        Ok(())
    }
}
