// session-coordinator/src/error.rs
use common::DecodeError;
use thiserror::Error;

/// Failure of a single whoami round trip
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Connection refused, DNS failure, reset, generic network error
    #[error("network error: {0}")]
    Network(String),

    #[error("identity request timed out")]
    Timeout,

    #[error("identity service responded with status {code}")]
    Status { code: u16 },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The HTTP client itself could not be built or used
    #[error("identity client error: {0}")]
    Client(String),
}

impl IdentityError {
    pub fn status(&self) -> Option<u16> {
        match self {
            IdentityError::Status { code } => Some(*code),
            _ => None,
        }
    }
}

/// Failure talking to the coordinator actor itself
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("coordinator mailbox error: {0}")]
    Mailbox(#[from] actix::MailboxError),

    #[error("coordinator stopped before the verification resolved")]
    CoordinatorStopped,
}

#[derive(Debug, Error)]
pub enum CredentialStoreError {
    #[error("credential store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("credential store is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
