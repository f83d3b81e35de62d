use crate::error::BrowserError;
use anyhow::Result;
use chromiumoxide::Browser;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info};

/// Attach to a Chrome started with `--remote-debugging-port=<port>`
///
/// Returns the browser and the task draining its CDP handler.
pub async fn connect_to_browser(port: u16) -> Result<(Browser, JoinHandle<()>)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("🔌 Connecting to browser: {}", browser_url);

    let (browser, handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("Browser connection failed: {}", e);
        BrowserError::ConnectionFailed {
            port,
            source: Box::new(e),
        }
    })?;
    debug!("browser connected");

    let handler_task = spawn_handler(handler);

    // let the target list sync before the first command
    sleep(Duration::from_millis(300)).await;

    Ok((browser, handler_task))
}

/// Drain CDP events in the background until the connection drops
pub(crate) fn spawn_handler(mut handler: chromiumoxide::Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if let Err(e) = h {
                debug!("browser handler stopped: {}", e);
                break;
            }
        }
    })
}
