use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator used when flattening skill tags into one column
pub const SKILL_SEPARATOR: &str = " | ";

/// Column order of every persisted record
pub const CSV_HEADERS: [&str; 16] = [
    "job_id",
    "title",
    "company",
    "experience",
    "salary",
    "location",
    "posted_date",
    "openings",
    "applicants",
    "job_description",
    "skills",
    "job_url",
    "apply_type",
    "apply_link",
    "application_status",
    "questions_asked",
];

/// One entry of the search feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub job_id: String,
    /// Detail page path, relative to the portal (`/job-listings-...`)
    pub jd_path: String,
    /// Only used for progress logs
    pub title: Option<String>,
    pub company: Option<String>,
}

impl JobSummary {
    pub fn new(job_id: impl Into<String>, jd_path: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            jd_path: jd_path.into(),
            title: None,
            company: None,
        }
    }

    /// Canonical detail url on the given portal
    pub fn detail_url(&self, portal_base_url: &str) -> String {
        if self.jd_path.starts_with("http://") || self.jd_path.starts_with("https://") {
            return self.jd_path.clone();
        }
        let base = portal_base_url.trim_end_matches('/');
        if self.jd_path.starts_with('/') {
            format!("{}{}", base, self.jd_path)
        } else {
            format!("{}/{}", base, self.jd_path)
        }
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Unknown")
    }

    pub fn display_company(&self) -> &str {
        self.company.as_deref().unwrap_or("Unknown")
    }
}

/// How the apply affordance behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyType {
    AlreadyApplied,
    NoApplyButton,
    External,
    Internal,
    ExternalPopup,
    InternalPopup,
    Iframe,
    InlineApply,
    Error,
}

impl ApplyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplyType::AlreadyApplied => "already_applied",
            ApplyType::NoApplyButton => "no_apply_button",
            ApplyType::External => "external",
            ApplyType::Internal => "internal",
            ApplyType::ExternalPopup => "external_popup",
            ApplyType::InternalPopup => "internal_popup",
            ApplyType::Iframe => "iframe",
            ApplyType::InlineApply => "inline_apply",
            ApplyType::Error => "error",
        }
    }
}

impl fmt::Display for ApplyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the classifier ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    NotProcessed,
    AlreadyApplied,
    NoButtonFound,
    LinkExtracted,
    PopupDetected,
    Redirected,
    IframeDetected,
    InlineForm,
    Error,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::NotProcessed => "not_processed",
            ApplicationStatus::AlreadyApplied => "already_applied",
            ApplicationStatus::NoButtonFound => "no_button_found",
            ApplicationStatus::LinkExtracted => "link_extracted",
            ApplicationStatus::PopupDetected => "popup_detected",
            ApplicationStatus::Redirected => "redirected",
            ApplicationStatus::IframeDetected => "iframe_detected",
            ApplicationStatus::InlineForm => "inline_form",
            ApplicationStatus::Error => "error",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier result for one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub apply_type: ApplyType,
    pub apply_link: Option<String>,
    pub status: ApplicationStatus,
    pub questions_asked: bool,
}

impl ApplyOutcome {
    pub fn new(
        apply_type: ApplyType,
        apply_link: Option<String>,
        status: ApplicationStatus,
        questions_asked: bool,
    ) -> Self {
        Self {
            apply_type,
            apply_link,
            status,
            questions_asked,
        }
    }

    pub fn already_applied() -> Self {
        Self::new(
            ApplyType::AlreadyApplied,
            None,
            ApplicationStatus::AlreadyApplied,
            false,
        )
    }

    pub fn no_apply_button() -> Self {
        Self::new(
            ApplyType::NoApplyButton,
            None,
            ApplicationStatus::NoButtonFound,
            false,
        )
    }

    pub fn error() -> Self {
        Self::new(ApplyType::Error, None, ApplicationStatus::Error, false)
    }
}

/// Fields scraped from a job detail page; `None` when every selector missed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailFields {
    pub title: Option<String>,
    pub company: Option<String>,
    pub experience: Option<String>,
    pub salary: Option<String>,
    pub location: Option<String>,
    pub posted: Option<String>,
    pub openings: Option<String>,
    pub applicants: Option<String>,
    pub description: Option<String>,
    pub skills: Vec<String>,
}

/// One output row per job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: String,
    pub title: Option<String>,
    pub company: Option<String>,
    pub experience: Option<String>,
    pub salary: Option<String>,
    pub location: Option<String>,
    pub posted_date: Option<String>,
    pub openings: Option<String>,
    pub applicants: Option<String>,
    pub job_description: Option<String>,
    pub skills: Option<String>,
    pub job_url: String,
    pub apply_type: Option<ApplyType>,
    pub apply_link: Option<String>,
    pub application_status: ApplicationStatus,
    pub questions_asked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobRecord {
    /// Fresh record before any page work
    pub fn pending(job_id: impl Into<String>, job_url: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            title: None,
            company: None,
            experience: None,
            salary: None,
            location: None,
            posted_date: None,
            openings: None,
            applicants: None,
            job_description: None,
            skills: None,
            job_url: job_url.into(),
            apply_type: None,
            apply_link: None,
            application_status: ApplicationStatus::NotProcessed,
            questions_asked: false,
            error: None,
        }
    }

    /// Error record used when a job fails before producing anything
    pub fn failed(
        job_id: impl Into<String>,
        job_url: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let mut record = Self::pending(job_id, job_url);
        record.mark_error(message);
        record
    }

    pub fn apply_details(&mut self, details: DetailFields) {
        self.title = details.title;
        self.company = details.company;
        self.experience = details.experience;
        self.salary = details.salary;
        self.location = details.location;
        self.posted_date = details.posted;
        self.openings = details.openings;
        self.applicants = details.applicants;
        self.job_description = details.description;
        self.skills = if details.skills.is_empty() {
            None
        } else {
            Some(details.skills.join(SKILL_SEPARATOR))
        };
    }

    pub fn apply_outcome(&mut self, outcome: ApplyOutcome) {
        self.apply_type = Some(outcome.apply_type);
        self.apply_link = outcome.apply_link;
        self.application_status = outcome.status;
        self.questions_asked = outcome.questions_asked;
    }

    /// Downgrade to an error record; scraped details are kept
    pub fn mark_error(&mut self, message: impl Into<String>) {
        self.apply_type = Some(ApplyType::Error);
        self.application_status = ApplicationStatus::Error;
        self.error = Some(message.into());
    }

    pub fn is_error(&self) -> bool {
        self.application_status == ApplicationStatus::Error
    }

    /// Row in `CSV_HEADERS` order
    pub fn csv_row(&self) -> [String; 16] {
        let opt = |v: &Option<String>| v.clone().unwrap_or_default();
        [
            self.job_id.clone(),
            opt(&self.title),
            opt(&self.company),
            opt(&self.experience),
            opt(&self.salary),
            opt(&self.location),
            opt(&self.posted_date),
            opt(&self.openings),
            opt(&self.applicants),
            opt(&self.job_description),
            opt(&self.skills),
            self.job_url.clone(),
            self.apply_type.map(|t| t.as_str().to_string()).unwrap_or_default(),
            opt(&self.apply_link),
            self.application_status.as_str().to_string(),
            if self.questions_asked { "yes" } else { "no" }.to_string(),
        ]
    }
}
