//! Single-job processor - orchestration layer
//!
//! ## Responsibilities
//!
//! Leases one page from a browser context, runs the job flow in it and
//! always hands back exactly one `JobRecord`:
//!
//! 1. **Page lease**: the page is opened for this job only
//! 2. **Flow**: delegates to `JobFlow` (details + classification)
//! 3. **Failure downgrade**: errors and panics become an `error` record
//! 4. **Cleanup**: the page is closed whatever happened; close errors are ignored

use crate::infrastructure::{BrowserSession, PageDriver};
use crate::models::{JobRecord, JobSummary};
use crate::utils::logging::truncate_text;
use crate::workflow::{JobCtx, JobFlow};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::{debug, error};

/// Longest error message kept in a record
pub const ERROR_MESSAGE_LIMIT: usize = 200;

/// Process one job in a fresh page of `context`
pub async fn process_job<C: BrowserSession>(
    context: &C,
    flow: &JobFlow,
    summary: &JobSummary,
    job_url: &str,
    ctx: &JobCtx,
) -> JobRecord {
    let page = match context.open_page().await {
        Ok(page) => page,
        Err(e) => {
            error!("{} ❌ Cannot open page: {:#}", ctx, e);
            return JobRecord::failed(
                &summary.job_id,
                job_url,
                truncate_text(&format!("{:#}", e), ERROR_MESSAGE_LIMIT),
            );
        }
    };

    let mut record = JobRecord::pending(&summary.job_id, job_url);
    let outcome = AssertUnwindSafe(flow.run(&page, &mut record, ctx))
        .catch_unwind()
        .await;

    if let Err(e) = page.close().await {
        debug!("{} page already closed: {}", ctx, e);
    }

    let failure = match outcome {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(format!("{:#}", e)),
        Err(panic) => Some(format!("panic: {}", panic_message(panic.as_ref()))),
    };
    if let Some(message) = failure {
        error!("{} ❌ Error: {}", ctx, message);
        record.mark_error(truncate_text(&message, ERROR_MESSAGE_LIMIT));
    }

    record
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_are_readable() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
        let boxed: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }
}
