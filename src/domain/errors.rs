use thiserror::Error;

/// Failure of a local store's backing file.
///
/// Expected absence ("not in cart") is never an error; operations report it
/// as a zero row count or `None`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid storage format: {0}")]
    Format(#[from] serde_json::Error),

    #[error("no user is signed in")]
    NotSignedIn,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure talking to the remote backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The request never got an answer.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("server answered {0}")]
    Status(u16),

    /// The server answered, but not with the expected JSON.
    #[error("unreadable response: {0}")]
    Unreadable(String),
}

impl BackendError {
    /// Whether the server was reached and answered without a usable result.
    pub fn is_rejection(&self) -> bool {
        matches!(self, BackendError::Status(_) | BackendError::Unreadable(_))
    }
}

pub type BackendOutcome<T> = Result<T, BackendError>;
