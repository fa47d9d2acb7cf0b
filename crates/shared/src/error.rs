use thiserror::Error;

/// Failure talking to the pins API.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server responded with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("could not decode response: {0}")]
    Decode(String),
}

/// Failure reading or writing the persisted session key.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    #[error("storage is unavailable")]
    Unavailable,
    #[error("storage access failed: {0}")]
    Access(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DraftError {
    #[error("no draft is open")]
    NotArmed,
    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),
    #[error("rating is not a number: {0:?}")]
    UnparsableRating(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubmitError {
    #[error("no draft is open")]
    NoDraft,
    #[error("log in to add a pin")]
    NotLoggedIn,
    #[error("a pin is already being saved")]
    InFlight,
    #[error(transparent)]
    Backend(#[from] BackendError),
}
