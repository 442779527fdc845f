use crate::docstore::DocStoreError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum NoteError {
    /// A client-side precondition failed; nothing was sent to the store.
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("User not authenticated")]
    Unauthenticated,

    #[error(transparent)]
    Store(#[from] DocStoreError),
}

pub type Result<T> = std::result::Result<T, NoteError>;

impl NoteError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
