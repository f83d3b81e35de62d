//! Job detail extraction - service layer
//!
//! Reads the structured fields of an already-loaded job detail page. Every
//! field degrades to `None`; extraction itself never fails.

use crate::infrastructure::{Locator, PageDriver};
use crate::models::DetailFields;
use tracing::debug;

/// Selector candidates per field, tried in order
#[derive(Debug, Clone)]
pub struct DetailSelectors {
    pub title: Vec<Locator>,
    pub company: Vec<Locator>,
    pub experience: Vec<Locator>,
    pub salary: Vec<Locator>,
    pub location: Vec<Locator>,
    pub posted: Vec<Locator>,
    pub openings: Vec<Locator>,
    pub applicants: Vec<Locator>,
    pub description: Vec<Locator>,
    pub skills: Locator,
}

impl Default for DetailSelectors {
    fn default() -> Self {
        Self {
            title: vec![Locator::css("h1")],
            company: vec![
                Locator::css(".styles_jd-header-comp-name__MvqAI"),
                Locator::css(".jd-header-comp-name"),
            ],
            experience: vec![Locator::css(".styles_jhc__exp"), Locator::css(".exp")],
            salary: vec![Locator::css(".styles_jhc__salary"), Locator::css(".salary")],
            location: vec![
                Locator::css(".styles_jhc__location"),
                Locator::css(".location"),
            ],
            // these move around between templates, so match on text
            posted: vec![
                Locator::text_includes("span", "Posted"),
                Locator::text_includes("span", "days ago"),
            ],
            openings: vec![Locator::text_includes("span", "Opening")],
            applicants: vec![Locator::text_includes("span", "Applicants")],
            description: vec![
                Locator::css(".styles_JDC__dang-inner-html__h0K4t"),
                Locator::css(".job-desc"),
            ],
            skills: Locator::css(r#".styles_key-skill__GIPn_, .key-skill, a[href*="skills"]"#),
        }
    }
}

/// Detail extraction service
#[derive(Debug, Clone, Default)]
pub struct DetailExtractor {
    selectors: DetailSelectors,
}

impl DetailExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_selectors(selectors: DetailSelectors) -> Self {
        Self { selectors }
    }

    pub async fn extract<P: PageDriver>(&self, page: &P) -> DetailFields {
        let s = &self.selectors;
        DetailFields {
            title: first_text(page, &s.title).await,
            company: first_text(page, &s.company).await,
            experience: first_text(page, &s.experience).await,
            salary: first_text(page, &s.salary).await,
            location: first_text(page, &s.location).await,
            posted: first_text(page, &s.posted).await,
            openings: first_text(page, &s.openings).await,
            applicants: first_text(page, &s.applicants).await,
            description: first_text(page, &s.description).await,
            skills: all_texts(page, &s.skills).await,
        }
    }
}

/// Text of the first element of the first candidate that yields non-empty text
async fn first_text<P: PageDriver>(page: &P, candidates: &[Locator]) -> Option<String> {
    for locator in candidates {
        match page.inner_texts(locator).await {
            Ok(texts) => {
                if let Some(text) = texts.into_iter().next().filter(|t| !t.is_empty()) {
                    return Some(text);
                }
            }
            Err(e) => debug!("selector {} unreadable: {}", locator, e),
        }
    }
    None
}

async fn all_texts<P: PageDriver>(page: &P, locator: &Locator) -> Vec<String> {
    match page.inner_texts(locator).await {
        Ok(texts) => texts
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        Err(e) => {
            debug!("selector {} unreadable: {}", locator, e);
            Vec::new()
        }
    }
}
