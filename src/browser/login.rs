use crate::error::BrowserError;
use crate::infrastructure::PageDriver;
use anyhow::Result;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

/// Open the login page and wait until the user has logged in
///
/// Login counts as done once the page url no longer contains `login`.
pub async fn wait_for_login<P: PageDriver>(
    page: &P,
    login_url: &str,
    timeout: Duration,
    poll: Duration,
) -> Result<()> {
    page.goto(login_url).await?;
    info!(
        "🔐 Please log in in the browser window (waiting up to {}s)",
        timeout.as_secs()
    );

    let deadline = Instant::now() + timeout;
    loop {
        match page.current_url().await {
            Ok(url) if !url.contains("login") => {
                info!("✓ Login detected: {}", url);
                return Ok(());
            }
            Ok(_) => {}
            Err(e) => debug!("login probe failed: {}", e),
        }
        if Instant::now() >= deadline {
            return Err(BrowserError::LoginTimeout {
                timeout_secs: timeout.as_secs(),
            }
            .into());
        }
        sleep(poll).await;
    }
}
