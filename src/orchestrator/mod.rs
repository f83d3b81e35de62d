//! Orchestration layer
//!
//! ## Responsibilities
//!
//! Batch scheduling and resource leasing; the "command centre" of a run.
//!
//! ## Modules
//!
//! ### `batch_processor` - concurrency harness
//! - Splits jobs into batches, round-robin over browser contexts
//! - Bounds in-flight jobs with a semaphore
//! - Streams records to the sink and keeps per-status counts
//! - Honours the stop flag between batches
//!
//! ### `job_processor` - single job
//! - Opens and closes the job's page
//! - Runs `JobFlow`
//! - Turns errors and panics into error records
//!
//! ## Layering
//!
//! ```text
//! batch_processor (Vec<JobSummary>)
//!     ↓
//! job_processor (one JobSummary, one page)
//!     ↓
//! workflow::JobFlow / ApplyFlow
//!     ↓
//! services (detail / question / host / sink)
//!     ↓
//! infrastructure (PageDriver)
//! ```

pub mod batch_processor;
pub mod job_processor;

pub use batch_processor::{BatchProcessor, RunReport};
pub use job_processor::process_job;
