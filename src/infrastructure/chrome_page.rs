//! chromiumoxide-backed page - infrastructure layer
//!
//! Owns a CDP `Page` and exposes it only as a [`PageDriver`]. Locators are
//! rendered to small JS snippets and run through `eval`.

use crate::error::BrowserError;
use crate::infrastructure::page_driver::{
    BrowserSession, Locator, PageDriver, PopupWatch, ResponseWatch,
};
use anyhow::Result;
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFinished, EventResponseReceived, GetResponseBodyParams,
};
use chromiumoxide::cdp::browser_protocol::target::{
    CloseTargetParams, CreateTargetParams, EventTargetCreated, TargetId,
};
use chromiumoxide::element::Element;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Attribute used to hand an element found by JS over to CDP
const TARGET_ATTR: &str = "data-apply-flow-target";

static NEXT_TARGET: AtomicU64 = AtomicU64::new(1);

const POPUP_ATTACH_ATTEMPTS: usize = 10;

/// How long a finished popup watch keeps closing popups that show up late
const POPUP_LINGER: Duration = Duration::from_secs(5);

/// A new `page` target opened by `opener`
fn is_popup_of(kind: &str, opener_id: Option<&TargetId>, opener: &TargetId) -> bool {
    kind == "page" && opener_id == Some(opener)
}

/// A browser tab
///
/// Keeps the `Browser` handle so it can resolve popups opened by this tab.
#[derive(Clone)]
pub struct ChromePage {
    browser: Arc<Browser>,
    page: Page,
}

impl ChromePage {
    pub fn new(browser: Arc<Browser>, page: Page) -> Self {
        Self { browser, page }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Run a JS expression and return its JSON value
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self
            .page
            .evaluate(js_code.into())
            .await
            .map_err(BrowserError::from)?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// Run a JS expression and deserialize the result
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }
}

/// JS expression yielding the array of elements a locator matches
fn locator_js(locator: &Locator) -> String {
    match locator {
        Locator::Css(selector) => {
            format!("Array.from(document.querySelectorAll({}))", js_str(selector))
        }
        Locator::HasText { tag, text } => format!(
            "Array.from(document.querySelectorAll({})).filter(e => (e.innerText || '').toLowerCase().includes({}))",
            js_str(tag),
            js_str(&text.to_lowercase())
        ),
        Locator::TextIncludes { tag, text } => format!(
            "Array.from(document.querySelectorAll({})).filter(e => (e.innerText || '').includes({}))",
            js_str(tag),
            js_str(text)
        ),
    }
}

fn js_str(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

impl PageDriver for ChromePage {
    type Element = Element;

    async fn goto(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::navigation_failed(url, e.into()))?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let url = self.page.url().await.map_err(BrowserError::from)?;
        Ok(url.unwrap_or_default())
    }

    async fn count(&self, locator: &Locator) -> Result<usize> {
        let js = format!("({}).length", locator_js(locator));
        self.eval_as::<usize>(js).await
    }

    async fn inner_texts(&self, locator: &Locator) -> Result<Vec<String>> {
        let js = format!(
            "({}).map(e => (e.innerText || '').trim())",
            locator_js(locator)
        );
        self.eval_as::<Vec<String>>(js).await
    }

    async fn first_attribute(&self, locator: &Locator, name: &str) -> Result<Option<String>> {
        let js = format!(
            "(() => {{ const el = ({})[0]; return el ? el.getAttribute({}) : null; }})()",
            locator_js(locator),
            js_str(name)
        );
        self.eval_as::<Option<String>>(js).await
    }

    async fn find_first(&self, locator: &Locator) -> Result<Option<Element>> {
        let token = format!("t{}", NEXT_TARGET.fetch_add(1, Ordering::Relaxed));
        let js = format!(
            "(() => {{ const el = ({})[0]; if (!el) return false; el.setAttribute({}, {}); return true; }})()",
            locator_js(locator),
            js_str(TARGET_ATTR),
            js_str(&token)
        );
        if !self.eval_as::<bool>(js).await? {
            return Ok(None);
        }
        let element = self
            .page
            .find_element(format!("[{}=\"{}\"]", TARGET_ATTR, token))
            .await
            .map_err(BrowserError::from)?;
        Ok(Some(element))
    }

    async fn element_href(&self, element: &Element) -> Result<Option<String>> {
        let property = element
            .property("href")
            .await
            .map_err(BrowserError::from)?
            .and_then(|v| v.as_str().map(str::to_string))
            .filter(|s| !s.is_empty());
        if property.is_some() {
            return Ok(property);
        }
        let attribute = element
            .attribute("href")
            .await
            .map_err(BrowserError::from)?
            .filter(|s| !s.is_empty());
        Ok(attribute)
    }

    async fn click(&self, element: &Element) -> Result<()> {
        element.click().await.map_err(BrowserError::from)?;
        Ok(())
    }

    async fn visible_text(&self) -> Result<String> {
        self.eval_as::<String>("document.body ? document.body.innerText : ''")
            .await
    }

    async fn watch_popup(&self) -> Result<PopupWatch<Self>> {
        let mut events = self
            .browser
            .event_listener::<EventTargetCreated>()
            .await
            .map_err(BrowserError::from)?;
        let opener = self.page.target_id().clone();
        let browser = self.browser.clone();
        let (mut tx, watch) = PopupWatch::channel();

        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = tx.closed() => break,
                    event = events.next() => event,
                };
                let Some(event) = event else { return };
                let info = &event.target_info;
                if !is_popup_of(&info.r#type, info.opener_id.as_ref(), &opener) {
                    continue;
                }
                // the target may be announced before it is attached
                for _ in 0..POPUP_ATTACH_ATTEMPTS {
                    match browser.get_page(info.target_id.clone()).await {
                        Ok(page) => {
                            debug!("🔗 Popup detected: {}", info.url);
                            if let Err(late) = tx.send(ChromePage::new(browser.clone(), page)) {
                                debug!("popup {} arrived after the watch ended", info.url);
                                let _ = late.close().await;
                            }
                            return;
                        }
                        Err(e) => {
                            debug!("popup target {} not attachable yet: {}", info.url, e);
                            sleep(Duration::from_millis(100)).await;
                        }
                    }
                }
                return;
            }

            // nobody waits any more; a popup from the same click would be orphaned
            let linger = sleep(POPUP_LINGER);
            tokio::pin!(linger);
            loop {
                let event = tokio::select! {
                    _ = &mut linger => return,
                    event = events.next() => event,
                };
                let Some(event) = event else { return };
                let info = &event.target_info;
                if is_popup_of(&info.r#type, info.opener_id.as_ref(), &opener) {
                    debug!("closing late popup {}", info.url);
                    let close = CloseTargetParams::new(info.target_id.clone());
                    if let Err(e) = browser.execute(close).await {
                        debug!("late popup {} already gone: {}", info.url, e);
                    }
                    return;
                }
            }
        });

        Ok(watch)
    }

    async fn watch_responses(&self, url_pattern: &str) -> Result<ResponseWatch> {
        let responses = self
            .page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(BrowserError::from)?;
        let finished = self
            .page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(BrowserError::from)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let page = self.page.clone();
        let pattern = url_pattern.to_string();

        let task = tokio::spawn(async move {
            let events = futures::stream::select(
                responses.map(NetworkEvent::Response),
                finished.map(NetworkEvent::Finished),
            );
            tokio::pin!(events);
            let mut pending = HashMap::new();

            while let Some(event) = events.next().await {
                match event {
                    NetworkEvent::Response(ev) => {
                        if ev.response.url.contains(&pattern) {
                            pending.insert(ev.request_id.inner().clone(), ev.request_id.clone());
                        }
                    }
                    NetworkEvent::Finished(ev) => {
                        let Some(request_id) = pending.remove(ev.request_id.inner()) else {
                            continue;
                        };
                        match page.execute(GetResponseBodyParams::new(request_id)).await {
                            Ok(body) if !body.result.base64_encoded => {
                                if tx.send(body.result.body.clone()).is_err() {
                                    return;
                                }
                            }
                            Ok(_) => debug!("skipping base64 search payload"),
                            Err(e) => debug!("search payload unavailable: {}", e),
                        }
                    }
                }
            }
        });

        Ok(ResponseWatch::new(rx, Some(task)))
    }

    async fn close(self) -> Result<()> {
        self.page.close().await.map_err(BrowserError::from)?;
        Ok(())
    }
}

enum NetworkEvent {
    Response(Arc<EventResponseReceived>),
    Finished(Arc<EventLoadingFinished>),
}

/// An isolated browser context; `context_id == None` is the default context
pub struct ChromeContext {
    browser: Arc<Browser>,
    context_id: Option<BrowserContextId>,
    label: String,
}

impl ChromeContext {
    pub fn new(
        browser: Arc<Browser>,
        context_id: Option<BrowserContextId>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            browser,
            context_id,
            label: label.into(),
        }
    }

    pub fn context_id(&self) -> Option<&BrowserContextId> {
        self.context_id.as_ref()
    }

    /// New tab in this context, already at `url`
    pub async fn open_page_at(&self, url: &str) -> Result<ChromePage> {
        let mut builder = CreateTargetParams::builder().url(url);
        if let Some(id) = &self.context_id {
            builder = builder.browser_context_id(id.clone());
        }
        let params = builder
            .build()
            .map_err(|e| anyhow::anyhow!("invalid target params: {}", e))?;
        let page = self.browser.new_page(params).await.map_err(|e| {
            warn!("[{}] cannot open page: {}", self.label, e);
            BrowserError::page_creation_failed(e)
        })?;
        Ok(ChromePage::new(self.browser.clone(), page))
    }
}

impl BrowserSession for ChromeContext {
    type Page = ChromePage;

    fn label(&self) -> String {
        self.label.clone()
    }

    async fn open_page(&self) -> Result<ChromePage> {
        self.open_page_at("about:blank").await
    }
}
