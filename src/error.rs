use thiserror::Error;

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Browser-side failures
    #[error("browser error: {0}")]
    Browser(#[from] BrowserError),
    /// Configuration failures
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    /// Record sink failures
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),
    /// Anything else worth a message
    #[error("error: {0}")]
    Other(String),
}

/// Browser related errors
#[derive(Debug, Error)]
pub enum BrowserError {
    /// Could not attach to a running browser
    #[error("cannot connect to browser (port {port}): {source}")]
    ConnectionFailed {
        port: u16,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// Could not launch a local browser
    #[error("browser launch failed: {source}")]
    LaunchFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// Target.createBrowserContext failed
    #[error("browser context creation failed: {source}")]
    ContextCreationFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// New tab could not be opened
    #[error("page creation failed: {source}")]
    PageCreationFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// Navigation returned an error
    #[error("navigation to {url} failed: {source}")]
    NavigationFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// Navigation did not finish in time
    #[error("navigation to {url} timed out after {timeout_secs}s")]
    NavigationTimeout { url: String, timeout_secs: u64 },
    /// Page script evaluation failed
    #[error("script execution failed: {source}")]
    ScriptFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// Login was not observed before the deadline
    #[error("login not detected within {timeout_secs}s")]
    LoginTimeout { timeout_secs: u64 },
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable could not be parsed
    #[error("env var {var_name}: value '{value}' is not a valid {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// Config file unreadable
    #[error("cannot read config file {path}: {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// Config file is not valid TOML for `Config`
    #[error("cannot parse config file {path}: {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// Value out of range
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Record sink errors
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<chromiumoxide::error::CdpError> for BrowserError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        BrowserError::ScriptFailed {
            source: Box::new(err),
        }
    }
}

// ========== Convenience constructors ==========

impl BrowserError {
    pub fn navigation_failed(url: impl Into<String>, source: anyhow::Error) -> Self {
        BrowserError::NavigationFailed {
            url: url.into(),
            source: source.into(),
        }
    }

    pub fn page_creation_failed(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        BrowserError::PageCreationFailed {
            source: Box::new(source),
        }
    }

    pub fn context_creation_failed(
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        BrowserError::ContextCreationFailed {
            source: Box::new(source),
        }
    }
}

impl SinkError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        SinkError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Application result alias
pub type AppResult<T> = Result<T, AppError>;
