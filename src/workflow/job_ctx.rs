//! Job processing context
//!
//! Carries "which job of the run am I on" for log lines.

use std::fmt::Display;

/// Per-job logging context
#[derive(Debug, Clone)]
pub struct JobCtx {
    /// Portal job id
    pub job_id: String,

    /// 1-based position in the run
    pub job_index: usize,

    pub total: usize,

    /// Browser context the job runs in
    pub context_label: String,
}

impl JobCtx {
    pub fn new(
        job_id: impl Into<String>,
        job_index: usize,
        total: usize,
        context_label: impl Into<String>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            job_index,
            total,
            context_label: context_label.into(),
        }
    }
}

impl Display for JobCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[Job {}/{} #{} @{}]",
            self.job_index, self.total, self.job_id, self.context_label
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_position_and_context() {
        let ctx = JobCtx::new("240101500123", 3, 10, "ctx-1");
        assert_eq!(ctx.to_string(), "[Job 3/10 #240101500123 @ctx-1]");
    }
}
