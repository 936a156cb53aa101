use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("invalid generation input: {0}")]
    InvalidInput(String),

    #[error("provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("provider unreachable: {0}")]
    Transport(String),

    #[error("unexpected provider response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for AiError {
    fn from(err: reqwest::Error) -> Self {
        AiError::Transport(err.to_string())
    }
}
