mod common;

use apply_flow::services::FeedCollector;
use common::{MockPage, MockSite, PageScript};
use serde_json::json;
use std::time::Duration;

const SEARCH: &str = "https://www.naukri.com/rust-jobs?k=rust";

fn collector() -> FeedCollector {
    FeedCollector::new(
        "jobapi/v3/search",
        Duration::from_secs(5),
        (Duration::ZERO, Duration::ZERO),
    )
}

fn payload(entries: serde_json::Value) -> String {
    json!({ "jobDetails": entries, "noOfJobs": 120 }).to_string()
}

#[tokio::test]
async fn jobs_are_deduplicated_across_pages_in_first_seen_order() {
    let site = MockSite::new()
        .page(
            format!("{}&pageNo=1", SEARCH),
            PageScript::new().payload(&payload(json!([
                {"jobId": "101", "jdURL": "/job-listings-101", "title": "Rust Engineer", "companyName": "Acme"},
                {"jobId": "102", "jdURL": "/job-listings-102"}
            ]))),
        )
        .page(
            format!("{}&pageNo=2", SEARCH),
            PageScript::new()
                .payload(&payload(json!([
                    {"jobId": "102", "jdURL": "/job-listings-102-dup"},
                    {"jobId": 103, "jdURL": "/job-listings-103"}
                ])))
                .payload("not json at all"),
        )
        .build();
    let page = MockPage::detached(site, "about:blank");

    let jobs = collector().collect(&page, SEARCH, 1..=2).await.unwrap();

    let ids: Vec<&str> = jobs.iter().map(|j| j.job_id.as_str()).collect();
    assert_eq!(ids, vec!["101", "102", "103"]);
    assert_eq!(jobs[1].jd_path, "/job-listings-102");
    assert_eq!(jobs[0].display_company(), "Acme");
}

#[tokio::test]
async fn a_failing_page_is_skipped() {
    let site = MockSite::new()
        .page(
            format!("{}&pageNo=1", SEARCH),
            PageScript::new().payload(&payload(json!([
                {"jobId": "1", "jdURL": "/job-listings-1"}
            ]))),
        )
        .page(format!("{}&pageNo=2", SEARCH), PageScript::new().failing_goto())
        .page(
            format!("{}&pageNo=3", SEARCH),
            PageScript::new().payload(&payload(json!([
                {"jobId": "3", "jdURL": "/job-listings-3"}
            ]))),
        )
        .build();
    let page = MockPage::detached(site, "about:blank");

    let jobs = collector().collect(&page, SEARCH, 1..=3).await.unwrap();

    let ids: Vec<&str> = jobs.iter().map(|j| j.job_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "3"]);
    assert_eq!(
        page.visited(),
        vec![
            format!("{}&pageNo=1", SEARCH),
            format!("{}&pageNo=2", SEARCH),
            format!("{}&pageNo=3", SEARCH),
        ]
    );
}

#[tokio::test]
async fn empty_range_visits_nothing() {
    let site = MockSite::new().build();
    let page = MockPage::detached(site, "about:blank");

    #[allow(clippy::reversed_empty_ranges)]
    let jobs = collector().collect(&page, SEARCH, 3..=1).await.unwrap();

    assert!(jobs.is_empty());
    assert!(page.visited().is_empty());
}
