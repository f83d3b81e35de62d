//! Page automation capability - infrastructure layer
//!
//! Everything above this layer talks to a browser tab only through
//! [`PageDriver`] and to a browser context only through [`BrowserSession`].
//! The chromiumoxide implementation lives in `chrome_page`; tests plug in
//! an in-memory one.

use anyhow::Result;
use std::fmt;
use std::future::Future;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// How to find elements on a page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// Plain CSS selector (case-insensitive attribute flags allowed)
    Css(String),
    /// Elements of `tag` whose text contains `text`, ignoring case
    HasText { tag: String, text: String },
    /// Elements of `tag` whose text contains `text` exactly
    TextIncludes { tag: String, text: String },
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn has_text(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Locator::HasText {
            tag: tag.into(),
            text: text.into(),
        }
    }

    pub fn text_includes(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Locator::TextIncludes {
            tag: tag.into(),
            text: text.into(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(sel) => write!(f, "{}", sel),
            Locator::HasText { tag, text } => write!(f, "{}:has-text(\"{}\")", tag, text),
            Locator::TextIncludes { tag, text } => write!(f, "{}:text-includes(\"{}\")", tag, text),
        }
    }
}

/// Single-use handle on "the next page opened by this page"
///
/// Created right before an engagement; resolves at most once. Dropping it
/// cancels the underlying subscription.
pub struct PopupWatch<P> {
    rx: oneshot::Receiver<P>,
    done: bool,
}

impl<P> PopupWatch<P> {
    pub fn new(rx: oneshot::Receiver<P>) -> Self {
        Self { rx, done: false }
    }

    pub fn channel() -> (oneshot::Sender<P>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self::new(rx))
    }

    /// Wait for the popup; `None` once the watcher gave up or was already consumed
    ///
    /// Cancel-safe: dropping the future keeps the watch usable.
    pub async fn recv(&mut self) -> Option<P> {
        if self.done {
            return std::future::pending().await;
        }
        let result = (&mut self.rx).await;
        self.done = true;
        result.ok()
    }

    /// Non-blocking check
    pub fn try_take(&mut self) -> Option<P> {
        if self.done {
            return None;
        }
        match self.rx.try_recv() {
            Ok(page) => {
                self.done = true;
                Some(page)
            }
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => {
                self.done = true;
                None
            }
        }
    }
}

/// Bodies of network responses matching a url pattern
///
/// The subscription lives as long as this value; drop it to unsubscribe.
pub struct ResponseWatch {
    rx: mpsc::UnboundedReceiver<String>,
    task: Option<JoinHandle<()>>,
}

impl ResponseWatch {
    pub fn new(rx: mpsc::UnboundedReceiver<String>, task: Option<JoinHandle<()>>) -> Self {
        Self { rx, task }
    }

    /// Everything received so far
    pub fn drain(&mut self) -> Vec<String> {
        let mut bodies = Vec::new();
        while let Ok(body) = self.rx.try_recv() {
            bodies.push(body);
        }
        bodies
    }
}

impl Drop for ResponseWatch {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// One browser tab
pub trait PageDriver: Send + Sync + Sized + 'static {
    /// Handle on a located element
    type Element: Send + Sync;

    fn goto(&self, url: &str) -> impl Future<Output = Result<()>> + Send;

    fn current_url(&self) -> impl Future<Output = Result<String>> + Send;

    fn count(&self, locator: &Locator) -> impl Future<Output = Result<usize>> + Send;

    /// Trimmed `innerText` of every match, in document order
    fn inner_texts(&self, locator: &Locator) -> impl Future<Output = Result<Vec<String>>> + Send;

    fn first_attribute(
        &self,
        locator: &Locator,
        name: &str,
    ) -> impl Future<Output = Result<Option<String>>> + Send;

    fn find_first(
        &self,
        locator: &Locator,
    ) -> impl Future<Output = Result<Option<Self::Element>>> + Send;

    /// `el.href || el.getAttribute('href')`
    fn element_href(
        &self,
        element: &Self::Element,
    ) -> impl Future<Output = Result<Option<String>>> + Send;

    fn click(&self, element: &Self::Element) -> impl Future<Output = Result<()>> + Send;

    /// `document.body.innerText`
    fn visible_text(&self) -> impl Future<Output = Result<String>> + Send;

    /// Subscribe to the next child page opened by this page
    fn watch_popup(&self) -> impl Future<Output = Result<PopupWatch<Self>>> + Send;

    /// Subscribe to bodies of responses whose url contains `url_pattern`
    fn watch_responses(
        &self,
        url_pattern: &str,
    ) -> impl Future<Output = Result<ResponseWatch>> + Send;

    fn close(self) -> impl Future<Output = Result<()>> + Send;
}

/// One isolated browser context able to host many pages
pub trait BrowserSession: Send + Sync + 'static {
    type Page: PageDriver;

    /// Name used in logs
    fn label(&self) -> String;

    fn open_page(&self) -> impl Future<Output = Result<Self::Page>> + Send;
}
