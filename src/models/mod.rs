pub mod feed;
pub mod job;
pub mod loaders;
pub mod stats;

pub use feed::{parse_job_details, JobFeed};
pub use job::{
    ApplicationStatus, ApplyOutcome, ApplyType, DetailFields, JobRecord, JobSummary, CSV_HEADERS,
    SKILL_SEPARATOR,
};
pub use loaders::load_processed_ids;
pub use stats::RunStats;
