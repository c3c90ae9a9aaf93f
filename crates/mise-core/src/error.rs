use thiserror::Error;

#[derive(Debug, Error)]
pub enum MiseError {
    #[error("OpenAI API key not set: save an API key before generating")]
    MissingApiKey,

    #[error("no workspace folder is open")]
    NoWorkspace,

    #[error("{0}")]
    SourceNotFound(String),

    #[error("invalid '{command}' message: {reason}")]
    InvalidCommand { command: String, reason: String },

    #[error("{0} generation is already running")]
    AlreadyRunning(String),

    #[error("{0} was cancelled")]
    Cancelled(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("{0} is outside the output directory")]
    OutsideOutput(String),

    #[error("could not parse AI response: {0}")]
    MalformedResponse(String),

    #[error("home directory not found: set HOME environment variable")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl MiseError {
    /// Precondition failures are detected before any side effect.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            MiseError::MissingApiKey
                | MiseError::NoWorkspace
                | MiseError::SourceNotFound(_)
                | MiseError::InvalidCommand { .. }
                | MiseError::AlreadyRunning(_)
                | MiseError::OutsideOutput(_)
        )
    }
}

// ---------------------------------------------------------------------------
// Failure categories
// ---------------------------------------------------------------------------

/// Coarse category inferred from an error message, used to attach a
/// user-actionable pointer to a failure notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    ApiKey,
    Network,
    Permission,
}

impl FailureCategory {
    pub fn classify(message: &str) -> Option<Self> {
        let m = message.to_ascii_lowercase();
        if m.contains("api key")
            || m.contains("api_key")
            || m.contains("401")
            || m.contains("unauthorized")
            || m.contains("incorrect api key")
        {
            Some(FailureCategory::ApiKey)
        } else if m.contains("permission denied") || m.contains("eacces") || m.contains("403") {
            Some(FailureCategory::Permission)
        } else if m.contains("network")
            || m.contains("timed out")
            || m.contains("timeout")
            || m.contains("connection")
            || m.contains("dns")
            || m.contains("429")
            || m.contains("rate limit")
        {
            Some(FailureCategory::Network)
        } else {
            None
        }
    }

    pub fn hint(self) -> &'static str {
        match self {
            FailureCategory::ApiKey => "Check that your OpenAI API key is valid.",
            FailureCategory::Network => {
                "Check your network connection and try again in a moment."
            }
            FailureCategory::Permission => {
                "Check that the output directory is writable."
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, MiseError>;
