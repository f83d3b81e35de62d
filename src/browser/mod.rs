//! Browser bootstrap
//!
//! Connect or launch, carve out browser contexts, and wait for login.

pub mod connection;
pub mod contexts;
pub mod headless;
pub mod login;

pub use connection::connect_to_browser;
pub use contexts::{create_contexts, dispose_contexts};
pub use headless::launch_browser;
pub use login::wait_for_login;

use crate::config::Config;
use anyhow::Result;
use chromiumoxide::Browser;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// A running browser plus its CDP handler task
pub struct BrowserHandle {
    pub browser: Arc<Browser>,
    /// `true` when attached to a browser we did not start
    pub connected: bool,
    handler_task: JoinHandle<()>,
}

impl BrowserHandle {
    /// Connect when `browser_debug_port` is set, launch otherwise
    pub async fn start(config: &Config) -> Result<Self> {
        let (browser, handler_task, connected) = match config.browser_debug_port {
            Some(port) => {
                let (browser, task) = connect_to_browser(port).await?;
                (browser, task, true)
            }
            None => {
                let (browser, task) =
                    launch_browser(config.headless, config.chrome_executable.as_deref()).await?;
                (browser, task, false)
            }
        };
        Ok(Self {
            browser: Arc::new(browser),
            connected,
            handler_task,
        })
    }
}

impl Drop for BrowserHandle {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}
