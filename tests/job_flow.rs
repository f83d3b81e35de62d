mod common;

use apply_flow::browser::wait_for_login;
use apply_flow::{ApplicationStatus, BrowserError, JobCtx, JobFlow, JobRecord, Locator};
use common::{fast_config, job_url, ClickEffect, MockPage, MockSite, PageScript};
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

fn detail_page() -> PageScript {
    PageScript::new()
        .texts(&Locator::css("h1"), &["Senior Rust Engineer"])
        .texts(&Locator::css(".jd-header-comp-name"), &["Acme Labs"])
        .texts(&Locator::css(".styles_jhc__exp"), &["3-6 Yrs"])
        .texts(&Locator::css(".location"), &["Pune, Remote"])
        .texts(&Locator::text_includes("span", "days ago"), &["2 days ago"])
        .texts(&Locator::text_includes("span", "Applicants"), &["Applicants: 87"])
        .texts(
            &Locator::css(r#".styles_key-skill__GIPn_, .key-skill, a[href*="skills"]"#),
            &[" Rust ", "", "Tokio"],
        )
        .button(
            &Locator::has_text("button", "Apply"),
            None,
            ClickEffect::default(),
        )
}

#[tokio::test]
async fn details_and_outcome_land_in_the_record() {
    let url = job_url("42");
    let site = MockSite::new().page(&url, detail_page()).build();
    let page = MockPage::detached(site, "about:blank");
    let flow = JobFlow::new(&fast_config());
    let mut record = JobRecord::pending("42", &url);

    assert_ok!(flow.run(&page, &mut record, &JobCtx::new("42", 1, 1, "ctx-0")).await);

    assert_eq!(record.title.as_deref(), Some("Senior Rust Engineer"));
    assert_eq!(record.company.as_deref(), Some("Acme Labs"));
    assert_eq!(record.experience.as_deref(), Some("3-6 Yrs"));
    assert_eq!(record.salary, None);
    assert_eq!(record.location.as_deref(), Some("Pune, Remote"));
    assert_eq!(record.posted_date.as_deref(), Some("2 days ago"));
    assert_eq!(record.openings, None);
    assert_eq!(record.applicants.as_deref(), Some("Applicants: 87"));
    assert_eq!(record.skills.as_deref(), Some("Rust | Tokio"));
    assert_eq!(record.application_status, ApplicationStatus::InlineForm);
    assert_eq!(record.apply_link.as_deref(), Some(url.as_str()));
}

#[tokio::test]
async fn details_are_kept_when_no_button_is_found() {
    let url = job_url("43");
    let mut script = detail_page();
    script.button = None;
    let site = MockSite::new().page(&url, script).build();
    let page = MockPage::detached(site, "about:blank");
    let flow = JobFlow::new(&fast_config());
    let mut record = JobRecord::pending("43", &url);

    assert_ok!(flow.run(&page, &mut record, &JobCtx::new("43", 1, 1, "ctx-0")).await);
    assert_eq!(record.application_status, ApplicationStatus::NoButtonFound);
    assert_eq!(record.title.as_deref(), Some("Senior Rust Engineer"));
}

#[tokio::test]
async fn login_wait_ends_when_url_leaves_login() {
    let login = "https://www.naukri.com/nlogin/login";
    let site = MockSite::new().build();
    let page = MockPage::detached(site, "about:blank");

    let user = page.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        user.set_url("https://www.naukri.com/mnjuser/homepage");
    });

    assert_ok!(
        wait_for_login(
            &page,
            login,
            Duration::from_secs(2),
            Duration::from_millis(10)
        )
        .await
    );
}

#[tokio::test]
async fn login_wait_times_out() {
    let login = "https://www.naukri.com/nlogin/login";
    let site = MockSite::new().build();
    let page = MockPage::detached(site, "about:blank");

    let err = assert_err!(
        wait_for_login(
            &page,
            login,
            Duration::from_millis(50),
            Duration::from_millis(10)
        )
        .await
    );
    assert!(matches!(
        err.downcast_ref::<BrowserError>(),
        Some(BrowserError::LoginTimeout { .. })
    ));
}
