use shared::error::ErrorCode;
use thiserror::Error;

pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Input problems caught before anything reaches the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter contract content first")]
    EmptyContract,
    #[error("Please provide rewrite instructions")]
    EmptyInstructions,
    #[error("Please add at least one signer")]
    NoSigners,
    #[error("Signer {position} needs both a name and an email")]
    IncompleteSigner { position: usize },
    #[error("No signer at position {position}")]
    UnknownSigner { position: usize },
    #[error("Unsupported file type: {filename}")]
    UnsupportedFile { filename: String },
    #[error("File {filename} could not be read as text")]
    UnreadableFile { filename: String },
    #[error("File {filename} is empty")]
    EmptyFile { filename: String },
    #[error("A valid email address is required")]
    InvalidEmail,
    #[error("Comment cannot be empty")]
    EmptyComment,
    #[error("Select exactly two versions to compare")]
    VersionSelection,
    #[error("No pending signature request to resume")]
    NothingPending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Transport,
    Http,
    Backend,
    Malformed,
    Validation,
    Local,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    Status {
        code: ErrorCode,
        status: u16,
        message: String,
    },
    #[error("{0}")]
    Backend(String),
    #[error("unexpected {endpoint} response: {detail}")]
    MalformedResponse {
        endpoint: &'static str,
        detail: String,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("a signature request is already being sent")]
    SendInProgress,
    #[error("{action} response superseded by a newer request")]
    Superseded { action: &'static str },
    #[error("local storage error: {0:#}")]
    Storage(anyhow::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    pub fn malformed(endpoint: &'static str, detail: impl Into<String>) -> Self {
        Self::MalformedResponse {
            endpoint,
            detail: detail.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport(_) => ErrorCategory::Transport,
            Self::Status { .. } => ErrorCategory::Http,
            Self::Backend(_) => ErrorCategory::Backend,
            Self::MalformedResponse { .. } => ErrorCategory::Malformed,
            Self::Validation(_) | Self::SendInProgress => ErrorCategory::Validation,
            Self::Superseded { .. } | Self::Storage(_) | Self::Config(_) => ErrorCategory::Local,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.category() == ErrorCategory::Validation
    }
}
