//! Question-presence detection - service layer
//!
//! Decides whether an application form asks free-text questions. Two
//! heuristics are OR'd: enough form fields of one kind, or a known question
//! phrase in the page text. Any failure reads as "no questions".

use crate::infrastructure::{Locator, PageDriver};
use anyhow::Result;
use tracing::debug;

/// More matches than this for one selector means a real questionnaire
pub const FIELD_COUNT_THRESHOLD: usize = 2;

pub const DEFAULT_QUESTION_PHRASES: [&str; 8] = [
    "why are you interested",
    "tell us about",
    "describe your",
    "what makes you",
    "why should we",
    "notice period",
    "current ctc",
    "expected ctc",
];

#[derive(Debug, Clone)]
pub struct QuestionDetector {
    field_selectors: Vec<Locator>,
    phrases: Vec<String>,
    threshold: usize,
}

impl Default for QuestionDetector {
    fn default() -> Self {
        Self {
            field_selectors: vec![
                Locator::css(r#"input[type="text"]:not([name*="email"]):not([name*="phone"])"#),
                Locator::css("textarea"),
                Locator::css(r#"select:not([name*="experience"]):not([name*="location"])"#),
                Locator::css(".question"),
                Locator::css(r#"[class*="question"]"#),
                Locator::has_text("label", "?"),
                Locator::css("form input[required]"),
            ],
            phrases: DEFAULT_QUESTION_PHRASES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            threshold: FIELD_COUNT_THRESHOLD,
        }
    }
}

impl QuestionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn has_questions<P: PageDriver>(&self, page: &P) -> bool {
        match self.scan(page).await {
            Ok(found) => found,
            Err(e) => {
                debug!("question scan failed, assuming none: {}", e);
                false
            }
        }
    }

    async fn scan<P: PageDriver>(&self, page: &P) -> Result<bool> {
        for locator in &self.field_selectors {
            let count = page.count(locator).await?;
            if count > self.threshold {
                debug!("{} form fields match {}", count, locator);
                return Ok(true);
            }
        }

        let text = page.visible_text().await?.to_lowercase();
        Ok(self.mentions_question(&text))
    }

    /// Lexical heuristic on already lower-cased text
    pub fn mentions_question(&self, lowered_text: &str) -> bool {
        self.phrases.iter().any(|p| lowered_text.contains(p.as_str()))
    }
}
