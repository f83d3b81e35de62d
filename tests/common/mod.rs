//! In-memory browser used by the integration tests
//!
//! A `MockSite` maps urls to scripted page behaviour. `MockContext` opens
//! `MockPage`s on it and counts page lifetimes so tests can check the
//! concurrency bound and that every page was closed.

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use apply_flow::infrastructure::{BrowserSession, Locator, PageDriver, PopupWatch, ResponseWatch};
use apply_flow::Config;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

pub const PORTAL: &str = "https://www.naukri.com";

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Timings small enough for tests
pub fn fast_config() -> Config {
    Config {
        max_concurrent_jobs: 2,
        num_contexts: 1,
        batch_size: None,
        page_settle_ms: 0,
        settle_timeout_ms: 300,
        settle_poll_ms: 10,
        popup_grace_ms: 30,
        navigation_timeout_secs: 5,
        job_delay_min_ms: 0,
        job_delay_max_ms: 0,
        page_delay_min_ms: 0,
        page_delay_max_ms: 0,
        ..Config::default()
    }
}

pub fn job_url(id: &str) -> String {
    format!("{}/job-listings-{}", PORTAL, id)
}

/// What a click on the apply affordance does
#[derive(Clone, Default)]
pub struct ClickEffect {
    /// Opens a child page at this url
    pub popup: Option<String>,
    /// Main page moves here
    pub navigate_to: Option<String>,
    /// An iframe with this src is injected
    pub iframe_src: Option<String>,
    /// The popup opens this long after the click
    pub popup_delay: Option<Duration>,
    /// The popup starts on about:blank and reaches its url after this long
    pub popup_loads_after: Option<Duration>,
}

#[derive(Clone)]
pub struct Button {
    /// Display form of the locator that finds it
    pub locator: String,
    pub href: Option<String>,
    pub on_click: ClickEffect,
}

/// Scripted behaviour of one url
#[derive(Clone, Default)]
pub struct PageScript {
    pub counts: HashMap<String, usize>,
    pub texts: HashMap<String, Vec<String>>,
    pub attrs: HashMap<(String, String), String>,
    pub body_text: String,
    pub button: Option<Button>,
    pub goto_fails: bool,
    /// Only the first visit succeeds
    pub revisit_fails: bool,
    pub goto_panics: bool,
    pub goto_delay: Option<Duration>,
    pub script_fails: bool,
    /// Response bodies emitted to a response watch after navigating here
    pub payloads: Vec<String>,
}

impl PageScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(mut self, locator: &Locator, n: usize) -> Self {
        self.counts.insert(locator.to_string(), n);
        self
    }

    pub fn texts(mut self, locator: &Locator, texts: &[&str]) -> Self {
        self.texts.insert(
            locator.to_string(),
            texts.iter().map(|t| t.to_string()).collect(),
        );
        self
    }

    pub fn body(mut self, text: &str) -> Self {
        self.body_text = text.to_string();
        self
    }

    pub fn button(mut self, locator: &Locator, href: Option<&str>, on_click: ClickEffect) -> Self {
        self.button = Some(Button {
            locator: locator.to_string(),
            href: href.map(str::to_string),
            on_click,
        });
        self
    }

    pub fn payload(mut self, body: &str) -> Self {
        self.payloads.push(body.to_string());
        self
    }

    pub fn failing_goto(mut self) -> Self {
        self.goto_fails = true;
        self
    }

    pub fn failing_revisit(mut self) -> Self {
        self.revisit_fails = true;
        self
    }

    pub fn panicking_goto(mut self) -> Self {
        self.goto_panics = true;
        self
    }

    pub fn slow_goto(mut self, delay: Duration) -> Self {
        self.goto_delay = Some(delay);
        self
    }
}

/// Page lifetime accounting
#[derive(Default)]
pub struct Counters {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub open_now: AtomicUsize,
    pub max_open: AtomicUsize,
    pub clicks: AtomicUsize,
    pub popups_closed: AtomicUsize,
}

impl Counters {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
    pub fn max_open(&self) -> usize {
        self.max_open.load(Ordering::SeqCst)
    }
    pub fn clicks(&self) -> usize {
        self.clicks.load(Ordering::SeqCst)
    }
    pub fn popups_closed(&self) -> usize {
        self.popups_closed.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct MockSite {
    scripts: HashMap<String, PageScript>,
    pub counters: Counters,
}

impl MockSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: impl Into<String>, script: PageScript) -> Self {
        self.scripts.insert(url.into(), script);
        self
    }

    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn script(&self, url: &str) -> PageScript {
        self.scripts.get(url).cloned().unwrap_or_default()
    }
}

struct PageState {
    url: String,
    injected_iframe: Option<String>,
    popup_tx: Option<oneshot::Sender<MockPage>>,
    responses_tx: Option<mpsc::UnboundedSender<String>>,
    visited: Vec<String>,
}

#[derive(Clone)]
pub struct MockPage {
    site: Arc<MockSite>,
    state: Arc<Mutex<PageState>>,
    is_popup: bool,
}

impl MockPage {
    fn new(site: Arc<MockSite>, url: &str, is_popup: bool) -> Self {
        Self {
            site,
            state: Arc::new(Mutex::new(PageState {
                url: url.to_string(),
                injected_iframe: None,
                popup_tx: None,
                responses_tx: None,
                visited: Vec::new(),
            })),
            is_popup,
        }
    }

    /// Standalone page, not counted by any context
    pub fn detached(site: Arc<MockSite>, url: &str) -> Self {
        Self::new(site, url, true)
    }

    pub fn set_url(&self, url: &str) {
        lock(&self.state).url = url.to_string();
    }

    /// Every url passed to `goto`, in order
    pub fn visited(&self) -> Vec<String> {
        lock(&self.state).visited.clone()
    }

    fn current(&self) -> PageScript {
        let url = lock(&self.state).url.clone();
        self.site.script(&url)
    }
}

const FRAME_LOCATOR: &str = r#"iframe[src*="apply"], iframe[src*="career"]"#;

impl PageDriver for MockPage {
    type Element = String;

    async fn goto(&self, url: &str) -> Result<()> {
        let earlier_visits = {
            let mut state = lock(&self.state);
            let n = state.visited.iter().filter(|v| v.as_str() == url).count();
            state.visited.push(url.to_string());
            n
        };
        let script = self.site.script(url);
        if let Some(delay) = script.goto_delay {
            tokio::time::sleep(delay).await;
        }
        if script.goto_panics {
            panic!("renderer crashed on {}", url);
        }
        if script.goto_fails || (script.revisit_fails && earlier_visits > 0) {
            return Err(anyhow!("net::ERR_CONNECTION_RESET at {}", url));
        }

        let mut state = lock(&self.state);
        state.url = url.to_string();
        state.injected_iframe = None;
        if let Some(tx) = &state.responses_tx {
            for body in &script.payloads {
                let _ = tx.send(body.clone());
            }
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(lock(&self.state).url.clone())
    }

    async fn count(&self, locator: &Locator) -> Result<usize> {
        let script = self.current();
        if script.script_fails {
            return Err(anyhow!("Execution context was destroyed"));
        }
        let key = locator.to_string();
        if key == FRAME_LOCATOR && lock(&self.state).injected_iframe.is_some() {
            return Ok(1);
        }
        Ok(script.counts.get(&key).copied().unwrap_or(0))
    }

    async fn inner_texts(&self, locator: &Locator) -> Result<Vec<String>> {
        let script = self.current();
        if script.script_fails {
            return Err(anyhow!("Execution context was destroyed"));
        }
        Ok(script
            .texts
            .get(&locator.to_string())
            .cloned()
            .unwrap_or_default())
    }

    async fn first_attribute(&self, locator: &Locator, name: &str) -> Result<Option<String>> {
        let key = locator.to_string();
        if key == FRAME_LOCATOR && name == "src" {
            if let Some(src) = lock(&self.state).injected_iframe.clone() {
                return Ok(Some(src));
            }
        }
        Ok(self.current().attrs.get(&(key, name.to_string())).cloned())
    }

    async fn find_first(&self, locator: &Locator) -> Result<Option<String>> {
        let key = locator.to_string();
        Ok(self
            .current()
            .button
            .filter(|b| b.locator == key)
            .map(|b| b.locator))
    }

    async fn element_href(&self, _element: &String) -> Result<Option<String>> {
        Ok(self.current().button.and_then(|b| b.href))
    }

    async fn click(&self, _element: &String) -> Result<()> {
        self.site.counters.clicks.fetch_add(1, Ordering::SeqCst);
        let Some(button) = self.current().button else {
            return Err(anyhow!("element detached"));
        };
        let effect = button.on_click;

        let mut state = lock(&self.state);
        if let Some(url) = &effect.navigate_to {
            state.url = url.clone();
        }
        if let Some(src) = &effect.iframe_src {
            state.injected_iframe = Some(src.clone());
        }
        let Some(url) = effect.popup else {
            return Ok(());
        };
        let Some(tx) = state.popup_tx.take() else {
            return Ok(());
        };
        drop(state);

        let popup = match effect.popup_loads_after {
            Some(delay) => {
                let popup = MockPage::new(self.site.clone(), "about:blank", true);
                let loading = popup.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    loading.set_url(&url);
                });
                popup
            }
            None => MockPage::new(self.site.clone(), &url, true),
        };
        match effect.popup_delay {
            Some(delay) => {
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(popup);
                });
            }
            None => {
                let _ = tx.send(popup);
            }
        }
        Ok(())
    }

    async fn visible_text(&self) -> Result<String> {
        let script = self.current();
        if script.script_fails {
            return Err(anyhow!("Execution context was destroyed"));
        }
        Ok(script.body_text)
    }

    async fn watch_popup(&self) -> Result<PopupWatch<Self>> {
        let (tx, watch) = PopupWatch::channel();
        lock(&self.state).popup_tx = Some(tx);
        Ok(watch)
    }

    async fn watch_responses(&self, _url_pattern: &str) -> Result<ResponseWatch> {
        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.state).responses_tx = Some(tx);
        Ok(ResponseWatch::new(rx, None))
    }

    async fn close(self) -> Result<()> {
        if self.is_popup {
            self.site.counters.popups_closed.fetch_add(1, Ordering::SeqCst);
        } else {
            self.site.counters.closed.fetch_add(1, Ordering::SeqCst);
            self.site.counters.open_now.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Browser context over a `MockSite`
pub struct MockContext {
    site: Arc<MockSite>,
    label: String,
    pub pages_opened: AtomicUsize,
    fail_open: bool,
    panic_on_open: bool,
}

impl MockContext {
    pub fn new(site: Arc<MockSite>, label: &str) -> Self {
        Self {
            site,
            label: label.to_string(),
            pages_opened: AtomicUsize::new(0),
            fail_open: false,
            panic_on_open: false,
        }
    }

    pub fn failing(site: Arc<MockSite>, label: &str) -> Self {
        Self {
            fail_open: true,
            ..Self::new(site, label)
        }
    }

    pub fn panicking(site: Arc<MockSite>, label: &str) -> Self {
        Self {
            panic_on_open: true,
            ..Self::new(site, label)
        }
    }

    pub fn pages_opened(&self) -> usize {
        self.pages_opened.load(Ordering::SeqCst)
    }
}

impl BrowserSession for MockContext {
    type Page = MockPage;

    fn label(&self) -> String {
        self.label.clone()
    }

    async fn open_page(&self) -> Result<MockPage> {
        if self.panic_on_open {
            panic!("context {} crashed", self.label);
        }
        if self.fail_open {
            return Err(anyhow!("Target.createTarget failed in {}", self.label));
        }
        self.pages_opened.fetch_add(1, Ordering::SeqCst);

        let counters = &self.site.counters;
        counters.opened.fetch_add(1, Ordering::SeqCst);
        let now = counters.open_now.fetch_add(1, Ordering::SeqCst) + 1;
        counters.max_open.fetch_max(now, Ordering::SeqCst);

        Ok(MockPage::new(self.site.clone(), "about:blank", false))
    }
}
