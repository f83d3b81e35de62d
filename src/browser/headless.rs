use std::path::Path;
use std::time::Duration;

use crate::browser::connection::spawn_handler;
use crate::error::BrowserError;
use anyhow::Result;
use chromiumoxide::{Browser, BrowserConfig};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info};

/// Launch a local Chrome
///
/// Headful unless `headless` is set, so the user can log in by hand.
pub async fn launch_browser(
    headless: bool,
    chrome_executable: Option<&str>,
) -> Result<(Browser, JoinHandle<()>)> {
    info!(
        "🚀 Launching browser ({})",
        if headless { "headless" } else { "headful" }
    );

    let mut builder = BrowserConfig::builder();
    builder = if headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };
    if let Some(path) = chrome_executable {
        debug!("chrome executable: {}", path);
        builder = builder.chrome_executable(Path::new(path));
    }

    let config = builder
        .args(vec![
            "--disable-gpu",
            "--no-sandbox",
            "--disable-dev-shm-usage",
        ])
        .build()
        .map_err(|e| {
            error!("Browser config rejected: {}", e);
            BrowserError::LaunchFailed {
                source: e.into(),
            }
        })?;

    let (browser, handler) = Browser::launch(config).await.map_err(|e| {
        error!("Browser launch failed: {}", e);
        BrowserError::LaunchFailed {
            source: Box::new(e),
        }
    })?;
    debug!("browser launched");

    let handler_task = spawn_handler(handler);
    sleep(Duration::from_millis(300)).await;

    Ok((browser, handler_task))
}
