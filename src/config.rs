use crate::error::ConfigError;
use crate::services::host_policy::DomainMatch;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// How the classifier waits after clicking the apply affordance
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SettleMode {
    /// Race popup / url change / frame against the settle deadline
    #[default]
    Race,
    /// Always sleep the full settle timeout
    Fixed,
}

impl FromStr for SettleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "race" => Ok(SettleMode::Race),
            "fixed" => Ok(SettleMode::Fixed),
            other => Err(format!("unknown settle mode: {}", other)),
        }
    }
}

/// Program configuration
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- concurrency ---
    /// Classifications in flight at once
    pub max_concurrent_jobs: usize,
    /// Isolated browser contexts
    pub num_contexts: usize,
    /// Jobs per batch (defaults to `max_concurrent_jobs`)
    pub batch_size: Option<usize>,

    // --- browser ---
    /// Attach to an existing browser on this port instead of launching one
    pub browser_debug_port: Option<u16>,
    pub headless: bool,
    pub chrome_executable: Option<String>,

    // --- portal ---
    pub portal_base_url: String,
    pub portal_domain: String,
    pub domain_match: DomainMatch,
    pub login_url: String,
    pub login_timeout_secs: u64,
    pub skip_login: bool,

    // --- search ---
    pub search_urls: Vec<String>,
    pub start_page: u32,
    pub end_page: u32,
    pub max_jobs_per_search: usize,
    pub search_api_pattern: String,

    // --- timings ---
    pub navigation_timeout_secs: u64,
    /// Sleep after landing on a job page
    pub page_settle_ms: u64,
    /// Upper bound on the post-click wait
    pub settle_timeout_ms: u64,
    pub settle_poll_ms: u64,
    /// Extra time a popup gets to win over a navigation
    pub popup_grace_ms: u64,
    pub settle_mode: SettleMode,
    pub job_delay_min_ms: u64,
    pub job_delay_max_ms: u64,
    pub page_delay_min_ms: u64,
    pub page_delay_max_ms: u64,

    // --- behaviour ---
    /// Send the page back to the job url after a redirect outcome
    pub return_after_redirect: bool,

    // --- output ---
    /// Output file (.csv or .json); timestamped csv when unset
    pub output_file: Option<String>,
    /// Prior output whose job ids are skipped
    pub resume_from: Option<String>,
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 3,
            num_contexts: 2,
            batch_size: None,
            browser_debug_port: None,
            headless: false,
            chrome_executable: None,
            portal_base_url: "https://www.naukri.com".to_string(),
            portal_domain: "naukri.com".to_string(),
            domain_match: DomainMatch::Substring,
            login_url: "https://www.naukri.com/nlogin/login".to_string(),
            login_timeout_secs: 180,
            skip_login: false,
            search_urls: vec![
                "https://www.naukri.com/ai-engineer-jobs-in-pune?k=ai%20engineer&l=pune%2C%20remote&experience=2"
                    .to_string(),
            ],
            start_page: 1,
            end_page: 3,
            max_jobs_per_search: 500,
            search_api_pattern: "jobapi/v3/search".to_string(),
            navigation_timeout_secs: 60,
            page_settle_ms: 3000,
            settle_timeout_ms: 5000,
            settle_poll_ms: 250,
            popup_grace_ms: 500,
            settle_mode: SettleMode::Race,
            job_delay_min_ms: 2000,
            job_delay_max_ms: 4000,
            page_delay_min_ms: 4000,
            page_delay_max_ms: 7000,
            return_after_redirect: true,
            output_file: None,
            resume_from: None,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// Defaults, then the TOML file in `APPLY_FLOW_CONFIG` (if any), then env overrides
    pub fn load() -> Result<Self, ConfigError> {
        let base = match std::env::var("APPLY_FLOW_CONFIG") {
            Ok(path) => Self::from_toml_file(&path)?,
            Err(_) => Self::default(),
        };
        let config = base.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn from_toml_str(content: &str, path: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.to_string(),
            source,
        })
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    fn with_env_overrides(self) -> Self {
        Self {
            max_concurrent_jobs: env_parse("MAX_CONCURRENT_JOBS")
                .unwrap_or(self.max_concurrent_jobs),
            num_contexts: env_parse("NUM_CONTEXTS").unwrap_or(self.num_contexts),
            batch_size: env_parse("BATCH_SIZE").or(self.batch_size),
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT").or(self.browser_debug_port),
            headless: env_parse("HEADLESS").unwrap_or(self.headless),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().or(self.chrome_executable),
            portal_base_url: std::env::var("PORTAL_BASE_URL").unwrap_or(self.portal_base_url),
            portal_domain: std::env::var("PORTAL_DOMAIN").unwrap_or(self.portal_domain),
            domain_match: env_parse("DOMAIN_MATCH").unwrap_or(self.domain_match),
            login_url: std::env::var("LOGIN_URL").unwrap_or(self.login_url),
            login_timeout_secs: env_parse("LOGIN_TIMEOUT_SECS").unwrap_or(self.login_timeout_secs),
            skip_login: env_parse("SKIP_LOGIN").unwrap_or(self.skip_login),
            search_urls: std::env::var("SEARCH_URLS")
                .ok()
                .map(|v| split_list(&v))
                .filter(|v| !v.is_empty())
                .unwrap_or(self.search_urls),
            start_page: env_parse("START_PAGE").unwrap_or(self.start_page),
            end_page: env_parse("END_PAGE").unwrap_or(self.end_page),
            max_jobs_per_search: env_parse("MAX_JOBS_PER_SEARCH")
                .unwrap_or(self.max_jobs_per_search),
            search_api_pattern: std::env::var("SEARCH_API_PATTERN")
                .unwrap_or(self.search_api_pattern),
            navigation_timeout_secs: env_parse("NAVIGATION_TIMEOUT_SECS")
                .unwrap_or(self.navigation_timeout_secs),
            page_settle_ms: env_parse("PAGE_SETTLE_MS").unwrap_or(self.page_settle_ms),
            settle_timeout_ms: env_parse("SETTLE_TIMEOUT_MS").unwrap_or(self.settle_timeout_ms),
            settle_poll_ms: env_parse("SETTLE_POLL_MS").unwrap_or(self.settle_poll_ms),
            popup_grace_ms: env_parse("POPUP_GRACE_MS").unwrap_or(self.popup_grace_ms),
            settle_mode: env_parse("SETTLE_MODE").unwrap_or(self.settle_mode),
            job_delay_min_ms: env_parse("JOB_DELAY_MIN_MS").unwrap_or(self.job_delay_min_ms),
            job_delay_max_ms: env_parse("JOB_DELAY_MAX_MS").unwrap_or(self.job_delay_max_ms),
            page_delay_min_ms: env_parse("PAGE_DELAY_MIN_MS").unwrap_or(self.page_delay_min_ms),
            page_delay_max_ms: env_parse("PAGE_DELAY_MAX_MS").unwrap_or(self.page_delay_max_ms),
            return_after_redirect: env_parse("RETURN_AFTER_REDIRECT")
                .unwrap_or(self.return_after_redirect),
            output_file: std::env::var("OUTPUT_FILE").ok().or(self.output_file),
            resume_from: std::env::var("RESUME_FROM").ok().or(self.resume_from),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
        }
    }

    /// Reject settings the harness cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_jobs == 0 {
            return Err(ConfigError::Invalid("max_concurrent_jobs must be > 0".into()));
        }
        if self.num_contexts == 0 {
            return Err(ConfigError::Invalid("num_contexts must be > 0".into()));
        }
        if self.batch_size == Some(0) {
            return Err(ConfigError::Invalid("batch_size must be > 0".into()));
        }
        if self.start_page > self.end_page {
            return Err(ConfigError::Invalid(format!(
                "start_page {} is after end_page {}",
                self.start_page, self.end_page
            )));
        }
        if self.job_delay_min_ms > self.job_delay_max_ms {
            return Err(ConfigError::Invalid("job_delay_min_ms > job_delay_max_ms".into()));
        }
        if self.page_delay_min_ms > self.page_delay_max_ms {
            return Err(ConfigError::Invalid("page_delay_min_ms > page_delay_max_ms".into()));
        }
        if self.portal_domain.trim().is_empty() {
            return Err(ConfigError::Invalid("portal_domain is empty".into()));
        }
        Ok(())
    }

    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.unwrap_or(self.max_concurrent_jobs).max(1)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn job_delay(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.job_delay_min_ms),
            Duration::from_millis(self.job_delay_max_ms),
        )
    }

    pub fn page_delay(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.page_delay_min_ms),
            Duration::from_millis(self.page_delay_max_ms),
        )
    }
}

fn env_parse<T: FromStr>(var_name: &str) -> Option<T> {
    std::env::var(var_name).ok().and_then(|v| v.trim().parse().ok())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
