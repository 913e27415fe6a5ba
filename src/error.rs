use thiserror::Error;

use crate::session::Phase;

/// Failure reported by a [`Transport`](crate::transport::Transport).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// No response reached us: connection refused, reset, timed out.
    #[error("network error: {0}")]
    Network(String),
    #[error("backend responded {status}: {message}")]
    Status { status: u16, message: String },
    #[error("could not encode request body: {0}")]
    Encode(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("session expired: {0}")]
    Unauthorized(String),
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("could not encode request body: {0}")]
    Encode(String),
    /// The backend answered, but not with the resource asked for.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ApiError {
    /// Maps a transport failure, recognising the backend's two ways of
    /// signalling an invalid credential.
    pub fn classify(err: TransportError) -> Self {
        match err {
            TransportError::Network(message) => ApiError::Transport(message),
            TransportError::Status { status, message } if is_auth_failure(status, &message) => {
                ApiError::Unauthorized(message)
            }
            TransportError::Status { status, message } => ApiError::Rejected { status, message },
            TransportError::Encode(message) => ApiError::Encode(message),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}

pub fn is_auth_failure(status: u16, message: &str) -> bool {
    status == 401
        || (status == 400
            && (message.contains("Not Authorized") || message.contains("Session Expired")))
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("select a language before running code")]
    NoLanguage,
    #[error("another request is in flight ({phase})")]
    Busy { phase: Phase },
    #[error("workspace has been closed")]
    Closed,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkspaceError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Api(#[from] ApiError),
}
