use thiserror::Error;

pub type Result<T> = std::result::Result<T, TripmateError>;

/// Coarse failure classes callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Parse,
    Auth,
    Unknown,
}

#[derive(Debug, Error)]
pub enum TripmateError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{provider} rejected credentials ({status}): {body}")]
    Auth {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("malformed response: {0}")]
    Parse(String),

    #[error("language model error: {0}")]
    LanguageModel(String),

    #[error("tool `{0}` not found")]
    ToolNotFound(String),

    #[error("tool `{name}` invocation failed: {source}")]
    ToolInvocation {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TripmateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TripmateError::Network(_) => ErrorKind::Network,
            TripmateError::Parse(_) | TripmateError::Serde(_) => ErrorKind::Parse,
            TripmateError::Auth { .. } => ErrorKind::Auth,
            _ => ErrorKind::Unknown,
        }
    }
}
