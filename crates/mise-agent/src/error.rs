use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("request to AI service failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not parse AI service response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("AI service returned an empty completion")]
    EmptyResponse,
}

pub type Result<T> = std::result::Result<T, AgentError>;
