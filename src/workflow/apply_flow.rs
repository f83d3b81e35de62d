//! Apply-flow classification - workflow layer
//!
//! Defines how one job page is classified:
//!
//! 1. already applied? → stop
//! 2. find the apply affordance → none: stop
//! 3. absolute href on it → classified from the link, no click
//! 4. click, settle, then the first matching outcome of
//!    popup → redirect → apply iframe → inline form
//!
//! Holds no page; every call borrows one from the caller.

use anyhow::Result;
use regex::Regex;
use std::time::Duration;
use tokio::time::{interval, sleep, sleep_until, timeout, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::{Config, SettleMode};
use crate::error::BrowserError;
use crate::infrastructure::{Locator, PageDriver, PopupWatch};
use crate::models::{ApplicationStatus, ApplyOutcome, ApplyType};
use crate::services::{is_absolute_link, PortalHost, QuestionDetector};
use crate::workflow::job_ctx::JobCtx;

pub const ALREADY_APPLIED_PATTERN: &str = r"(?i)already applied";

const MIN_SETTLE_POLL: Duration = Duration::from_millis(10);

/// Apply affordance strategies, most specific first
pub fn apply_button_locators() -> Vec<Locator> {
    vec![
        Locator::has_text("button", "Apply"),
        Locator::has_text("a", "Apply"),
        Locator::css(r#"button[id*="apply" i]"#),
        Locator::css(r#"a[id*="apply" i]"#),
        Locator::css(r#"button[class*="apply" i]"#),
        Locator::css(r#"a[class*="apply" i]"#),
    ]
}

pub fn already_applied_markers() -> Vec<Locator> {
    vec![Locator::css(".applied"), Locator::css(r#"[class*="applied"]"#)]
}

pub fn apply_frame_locator() -> Locator {
    Locator::css(r#"iframe[src*="apply"], iframe[src*="career"]"#)
}

/// Apply-flow classifier
pub struct ApplyFlow {
    portal: PortalHost,
    detector: QuestionDetector,
    navigation_timeout: Duration,
    page_settle: Duration,
    settle_mode: SettleMode,
    settle_timeout: Duration,
    settle_poll: Duration,
    popup_grace: Duration,
    return_after_redirect: bool,
}

impl ApplyFlow {
    pub fn new(config: &Config) -> Self {
        Self {
            portal: PortalHost::new(&config.portal_domain, config.domain_match),
            detector: QuestionDetector::new(),
            navigation_timeout: config.navigation_timeout(),
            page_settle: Duration::from_millis(config.page_settle_ms),
            settle_mode: config.settle_mode,
            settle_timeout: Duration::from_millis(config.settle_timeout_ms),
            settle_poll: Duration::from_millis(config.settle_poll_ms).max(MIN_SETTLE_POLL),
            popup_grace: Duration::from_millis(config.popup_grace_ms),
            return_after_redirect: config.return_after_redirect,
        }
    }

    pub fn portal(&self) -> &PortalHost {
        &self.portal
    }

    /// Navigate within the navigation timeout, then let the page settle
    pub async fn open<P: PageDriver>(&self, page: &P, url: &str) -> Result<()> {
        match timeout(self.navigation_timeout, page.goto(url)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(BrowserError::NavigationTimeout {
                    url: url.to_string(),
                    timeout_secs: self.navigation_timeout.as_secs(),
                }
                .into())
            }
        }
        if !self.page_settle.is_zero() {
            sleep(self.page_settle).await;
        }
        Ok(())
    }

    /// Open `job_url` and classify it
    pub async fn classify<P: PageDriver>(
        &self,
        page: &P,
        job_url: &str,
        ctx: &JobCtx,
    ) -> Result<ApplyOutcome> {
        self.open(page, job_url).await?;
        self.classify_loaded(page, job_url, ctx).await
    }

    /// Classify a page already showing `job_url`
    pub async fn classify_loaded<P: PageDriver>(
        &self,
        page: &P,
        job_url: &str,
        ctx: &JobCtx,
    ) -> Result<ApplyOutcome> {
        if self.is_already_applied(page).await? {
            info!("{} ✓ Already applied", ctx);
            return Ok(ApplyOutcome::already_applied());
        }

        let Some(button) = self.locate_affordance(page).await? else {
            info!("{} ⚠️ No apply button found", ctx);
            return Ok(ApplyOutcome::no_apply_button());
        };

        if let Some(link) = page.element_href(&button).await? {
            if is_absolute_link(&link) {
                let apply_type = self.portal.link_type(&link);
                info!("{} 🔗 Direct link ({}): {}", ctx, apply_type, link);
                return Ok(ApplyOutcome::new(
                    apply_type,
                    Some(link),
                    ApplicationStatus::LinkExtracted,
                    false,
                ));
            }
        }

        self.engage(page, &button, job_url, ctx).await
    }

    async fn is_already_applied<P: PageDriver>(&self, page: &P) -> Result<bool> {
        let re = Regex::new(ALREADY_APPLIED_PATTERN)?;
        if re.is_match(&page.visible_text().await?) {
            return Ok(true);
        }
        for marker in already_applied_markers() {
            if page.count(&marker).await? > 0 {
                debug!("already-applied marker {} present", marker);
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn locate_affordance<P: PageDriver>(&self, page: &P) -> Result<Option<P::Element>> {
        for locator in apply_button_locators() {
            if let Some(element) = page.find_first(&locator).await? {
                debug!("apply affordance matched {}", locator);
                return Ok(Some(element));
            }
        }
        Ok(None)
    }

    async fn engage<P: PageDriver>(
        &self,
        page: &P,
        button: &P::Element,
        job_url: &str,
        ctx: &JobCtx,
    ) -> Result<ApplyOutcome> {
        let before = page.current_url().await?;
        // subscribe before the click so a fast popup is not missed
        let mut popup_watch = page.watch_popup().await?;

        info!("{} 🖱️ Clicking apply", ctx);
        page.click(button).await?;

        let popup = self.settle(page, &before, &mut popup_watch).await;
        drop(popup_watch);

        if let Some(popup) = popup {
            return self.finish_popup(popup, ctx).await;
        }

        let current = page.current_url().await?;
        if current != before {
            return Ok(self.finish_redirect(page, current, job_url, ctx).await);
        }

        if let Some(src) = page.first_attribute(&apply_frame_locator(), "src").await? {
            info!("{} 🪟 Apply iframe: {}", ctx, src);
            return Ok(ApplyOutcome::new(
                ApplyType::Iframe,
                Some(src),
                ApplicationStatus::IframeDetected,
                false,
            ));
        }

        let questions = self.detector.has_questions(page).await;
        info!("{} 📝 Inline apply (questions: {})", ctx, questions);
        Ok(ApplyOutcome::new(
            ApplyType::InlineApply,
            Some(job_url.to_string()),
            ApplicationStatus::InlineForm,
            questions,
        ))
    }

    /// Wait for the click to take effect; returns the popup if one opened
    async fn settle<P: PageDriver>(
        &self,
        page: &P,
        before: &str,
        watch: &mut PopupWatch<P>,
    ) -> Option<P> {
        match self.settle_mode {
            SettleMode::Fixed => {
                sleep(self.settle_timeout).await;
                watch.try_take()
            }
            SettleMode::Race => self.settle_race(page, before, watch).await,
        }
    }

    async fn settle_race<P: PageDriver>(
        &self,
        page: &P,
        before: &str,
        watch: &mut PopupWatch<P>,
    ) -> Option<P> {
        let deadline = Instant::now() + self.settle_timeout;
        let mut ticker = interval(self.settle_poll);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                popup = watch.recv() => {
                    if popup.is_some() {
                        return popup;
                    }
                }
                _ = sleep_until(deadline) => {
                    debug!("settle deadline reached");
                    return watch.try_take();
                }
                _ = ticker.tick() => {
                    if self.page_moved(page, before).await {
                        break;
                    }
                }
            }
        }

        // a popup opened by the same click still outranks the navigation
        let grace_end = Instant::now() + self.popup_grace;
        tokio::select! {
            popup = watch.recv() => popup,
            _ = sleep_until(grace_end) => watch.try_take(),
        }
    }

    /// URL changed or an apply iframe appeared; probe errors count as "no"
    async fn page_moved<P: PageDriver>(&self, page: &P, before: &str) -> bool {
        match page.current_url().await {
            Ok(url) if url != before => return true,
            Ok(_) => {}
            Err(e) => debug!("url probe failed: {}", e),
        }
        match page.count(&apply_frame_locator()).await {
            Ok(n) => n > 0,
            Err(e) => {
                debug!("frame probe failed: {}", e);
                false
            }
        }
    }

    async fn finish_popup<P: PageDriver>(&self, popup: P, ctx: &JobCtx) -> Result<ApplyOutcome> {
        let inspected = self.inspect_popup(&popup).await;
        if let Err(e) = popup.close().await {
            debug!("{} popup already closed: {}", ctx, e);
        }

        let (link, questions) = inspected?;
        let apply_type = self.portal.popup_type(&link);
        info!("{} 🔗 Popup ({}): {}", ctx, apply_type, link);
        Ok(ApplyOutcome::new(
            apply_type,
            Some(link),
            ApplicationStatus::PopupDetected,
            questions,
        ))
    }

    async fn inspect_popup<P: PageDriver>(&self, popup: &P) -> Result<(String, bool)> {
        let link = self.popup_url(popup).await?;
        let questions = self.detector.has_questions(popup).await;
        Ok((link, questions))
    }

    /// Popups start on about:blank; wait for the real url within the settle timeout
    async fn popup_url<P: PageDriver>(&self, popup: &P) -> Result<String> {
        let deadline = Instant::now() + self.settle_timeout;
        loop {
            let url = popup.current_url().await?;
            let blank = url.is_empty() || url == "about:blank";
            if !blank || Instant::now() >= deadline {
                return Ok(url);
            }
            sleep(self.settle_poll).await;
        }
    }

    async fn finish_redirect<P: PageDriver>(
        &self,
        page: &P,
        current: String,
        job_url: &str,
        ctx: &JobCtx,
    ) -> ApplyOutcome {
        let apply_type = self.portal.link_type(&current);
        let questions = self.detector.has_questions(page).await;
        info!("{} ↪️ Redirected ({}): {}", ctx, apply_type, current);

        if self.return_after_redirect {
            match timeout(self.navigation_timeout, page.goto(job_url)).await {
                Ok(Ok(())) => debug!("{} back on job page", ctx),
                Ok(Err(e)) => warn!("{} ⚠️ Could not return to job page: {}", ctx, e),
                Err(_) => warn!("{} ⚠️ Timed out returning to job page", ctx),
            }
        }

        ApplyOutcome::new(
            apply_type,
            Some(current),
            ApplicationStatus::Redirected,
            questions,
        )
    }
}
