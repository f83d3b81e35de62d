//! Search-api payload parsing and first-seen dedup

use crate::models::job::JobSummary;
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use tracing::debug;

/// Ordered, deduplicated job summaries gathered during one `collect` call
#[derive(Debug, Default)]
pub struct JobFeed {
    seen: HashSet<String>,
    jobs: Vec<JobSummary>,
}

impl JobFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Append a summary unless its id was already seen; returns whether it was new
    pub fn push(&mut self, job: JobSummary) -> bool {
        if self.seen.insert(job.job_id.clone()) {
            self.jobs.push(job);
            true
        } else {
            false
        }
    }

    /// Parse one response body and keep the unseen entries; returns the number added
    pub fn absorb_payload(&mut self, body: &str) -> usize {
        let payload: JsonValue = match serde_json::from_str(body) {
            Ok(v) => v,
            Err(e) => {
                debug!("skipping unparsable search payload: {}", e);
                return 0;
            }
        };
        parse_job_details(&payload)
            .into_iter()
            .map(|job| self.push(job))
            .filter(|added| *added)
            .count()
    }

    pub fn into_jobs(self) -> Vec<JobSummary> {
        self.jobs
    }
}

/// Entries of `jobDetails`; ones without an id or detail path are dropped
pub fn parse_job_details(payload: &JsonValue) -> Vec<JobSummary> {
    let Some(entries) = payload.get("jobDetails").and_then(|v| v.as_array()) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let job_id = match entry.get("jobId")? {
                JsonValue::String(s) if !s.is_empty() => s.clone(),
                JsonValue::Number(n) => n.to_string(),
                _ => return None,
            };
            let jd_path = entry.get("jdURL").and_then(|v| v.as_str())?.to_string();
            Some(JobSummary {
                job_id,
                jd_path,
                title: string_field(entry, "title"),
                company: string_field(entry, "companyName"),
            })
        })
        .collect()
}

fn string_field(entry: &JsonValue, key: &str) -> Option<String> {
    entry
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dedup_keeps_first_seen_position() {
        let mut feed = JobFeed::new();
        let page1 = json!({"jobDetails": [
            {"jobId": "a", "jdURL": "/a", "title": "A"},
            {"jobId": "b", "jdURL": "/b"}
        ]});
        let page2 = json!({"jobDetails": [
            {"jobId": "c", "jdURL": "/c"},
            {"jobId": "a", "jdURL": "/a-again", "title": "A2"}
        ]});
        assert_eq!(feed.absorb_payload(&page1.to_string()), 2);
        assert_eq!(feed.absorb_payload(&page2.to_string()), 1);

        let jobs = feed.into_jobs();
        let ids: Vec<_> = jobs.iter().map(|j| j.job_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(jobs[0].jd_path, "/a");
        assert_eq!(jobs[0].title.as_deref(), Some("A"));
    }

    #[test]
    fn garbage_and_incomplete_entries_are_ignored() {
        let mut feed = JobFeed::new();
        assert_eq!(feed.absorb_payload("<html>"), 0);
        assert_eq!(feed.absorb_payload(r#"{"noJobs": true}"#), 0);
        let partial = json!({"jobDetails": [
            {"jdURL": "/no-id"},
            {"jobId": "", "jdURL": "/empty-id"},
            {"jobId": "x"},
            {"jobId": 123, "jdURL": "/numeric"}
        ]});
        assert_eq!(feed.absorb_payload(&partial.to_string()), 1);
        assert_eq!(feed.into_jobs()[0].job_id, "123");
    }
}
