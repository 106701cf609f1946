//! Error types for case-study synchronization

use thiserror::Error;

/// Error type for synchronization operations
///
/// Every error except [`SyncError::NotFound`] aborts the surrounding unit of
/// work; the store rolls back everything performed so far. `NotFound` is a
/// "nothing to do" signal — nothing has been written when it is raised.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// An embedded image reference could not be decoded or classified
    #[error("Image decode error: {0}")]
    Decode(String),

    /// The targeted case study does not exist
    #[error("Case study not found: {0}")]
    NotFound(i64),

    /// An underlying blob-store or document-store call failed
    #[error("Store error: {0}")]
    Store(String),
}

/// Result type for synchronization operations
pub type SyncResult<T> = Result<T, SyncError>;
