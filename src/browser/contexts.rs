use crate::error::BrowserError;
use crate::infrastructure::ChromeContext;
use anyhow::Result;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, DisposeBrowserContextParams,
};
use chromiumoxide::Browser;
use std::sync::Arc;
use tracing::{debug, info};

/// Create `count` browser contexts
///
/// With `reuse_default`, context 0 is the browser's default context so an
/// existing login session carries over; the rest are fresh and isolated.
pub async fn create_contexts(
    browser: &Arc<Browser>,
    count: usize,
    reuse_default: bool,
) -> Result<Vec<Arc<ChromeContext>>> {
    let mut contexts = Vec::with_capacity(count);

    for index in 0..count {
        let label = format!("ctx-{}", index);
        if index == 0 && reuse_default {
            contexts.push(Arc::new(ChromeContext::new(browser.clone(), None, label)));
            continue;
        }

        let created = browser
            .execute(CreateBrowserContextParams::default())
            .await
            .map_err(BrowserError::context_creation_failed)?;
        let id = created.result.browser_context_id.clone();
        debug!("{} -> {:?}", label, id);
        contexts.push(Arc::new(ChromeContext::new(browser.clone(), Some(id), label)));
    }

    info!("✓ {} browser contexts ready", contexts.len());
    Ok(contexts)
}

/// Dispose every non-default context; failures are only logged
pub async fn dispose_contexts(browser: &Browser, contexts: &[Arc<ChromeContext>]) {
    for context in contexts {
        let Some(id) = context.context_id() else {
            continue;
        };
        if let Err(e) = browser
            .execute(DisposeBrowserContextParams::new(id.clone()))
            .await
        {
            debug!("context {:?} not disposed: {}", id, e);
        }
    }
}
