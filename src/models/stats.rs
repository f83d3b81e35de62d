use crate::models::{ApplicationStatus, JobRecord};
use std::collections::HashMap;

/// Record counts by `application_status`
#[derive(Debug, Default, Clone)]
pub struct RunStats {
    by_status: HashMap<ApplicationStatus, usize>,
    recorded: usize,
    /// Jobs never started because a stop was requested
    pub skipped: usize,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: &JobRecord) {
        *self.by_status.entry(record.application_status).or_insert(0) += 1;
        self.recorded += 1;
    }

    pub fn merge(&mut self, other: &RunStats) {
        for (status, count) in &other.by_status {
            *self.by_status.entry(*status).or_insert(0) += count;
        }
        self.recorded += other.recorded;
        self.skipped += other.skipped;
    }

    pub fn recorded(&self) -> usize {
        self.recorded
    }

    pub fn count(&self, status: ApplicationStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    pub fn errors(&self) -> usize {
        self.count(ApplicationStatus::Error)
    }

    /// Non-zero counts, largest first
    pub fn breakdown(&self) -> Vec<(ApplicationStatus, usize)> {
        let mut rows: Vec<_> = self
            .by_status
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(status, count)| (*status, *count))
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));
        rows
    }
}
