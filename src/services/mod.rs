//! Service layer
//!
//! Single-purpose capabilities used by the workflow: each one answers one
//! question about a page or persists one thing, and none of them knows about
//! batches or ordering.
//!
//! - `feed_collector` - job summaries from the search API responses
//! - `detail_extractor` - structured fields of a job detail page
//! - `question_detector` - does the apply form ask free-text questions
//! - `host_policy` - internal vs external links
//! - `record_sink` - CSV / JSON persistence

pub mod detail_extractor;
pub mod feed_collector;
pub mod host_policy;
pub mod question_detector;
pub mod record_sink;

pub use detail_extractor::{DetailExtractor, DetailSelectors};
pub use feed_collector::FeedCollector;
pub use host_policy::{is_absolute_link, DomainMatch, PortalHost};
pub use question_detector::QuestionDetector;
pub use record_sink::{default_output_file, open_sink, CsvSink, JsonSink, RecordSink};
