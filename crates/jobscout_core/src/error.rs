use thiserror::Error;

use crate::ConnectionState;

/// Synchronous rejection of a user request. State is never changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("keywords must not be empty")]
    EmptyKeywords,
    #[error("not ready: session is {0}")]
    NotReady(ConnectionState),
}
