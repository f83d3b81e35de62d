//! # Apply Flow
//!
//! Classifies how job postings on a job portal take applications.
//!
//! ## Architecture
//!
//! Four strict layers:
//!
//! ### ① Infrastructure
//! - `infrastructure/` - holds the scarce resource (the browser tab) and only exposes capabilities
//! - `PageDriver` / `BrowserSession` - the page and context seam
//! - `ChromePage` / `ChromeContext` - chromiumoxide implementation
//!
//! ### ② Services
//! - `services/` - "what can I do with one page"
//! - `FeedCollector` - job summaries from search API responses
//! - `DetailExtractor` - job detail fields
//! - `QuestionDetector` - free-text question heuristics
//! - `PortalHost` - internal/external link predicate
//! - `RecordSink` - CSV / JSON output
//!
//! ### ③ Workflow
//! - `workflow/` - the complete flow for one job
//! - `JobCtx` - logging context
//! - `ApplyFlow` - apply-flow state machine
//! - `JobFlow` - details + classification
//!
//! ### ④ Orchestration
//! - `orchestrator/batch_processor` - batches, contexts, admission gate
//! - `orchestrator/job_processor` - one job in one page
//!
//! `browser/` bootstraps Chrome and `app` wires a whole run together.

pub mod app;
pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// Commonly used re-exports
pub use app::App;
pub use config::{Config, SettleMode};
pub use error::{AppError, AppResult, BrowserError, ConfigError, SinkError};
pub use infrastructure::{BrowserSession, ChromeContext, ChromePage, Locator, PageDriver};
pub use models::{
    ApplicationStatus, ApplyOutcome, ApplyType, DetailFields, JobRecord, JobSummary, RunStats,
};
pub use orchestrator::{BatchProcessor, RunReport};
pub use services::{DomainMatch, PortalHost, RecordSink};
pub use workflow::{ApplyFlow, JobCtx, JobFlow};
