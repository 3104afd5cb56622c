use std::fmt;
use thiserror::Error;

/// Associations a thread must have eagerly loaded before it can be projected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Association {
    Folders,
    Labels,
    Messages,
}

impl fmt::Display for Association {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Association::Folders => "folders",
            Association::Labels => "labels",
            Association::Messages => "messages",
        };
        f.write_str(name)
    }
}

/// Failures raised by a `ThreadStore` adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("malformed participants column: {0}")]
    Participants(#[from] serde_json::Error),
    #[error("thread {0} not found")]
    ThreadNotFound(String),
    #[error("store error: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum ThreadError {
    /// The caller handed over a thread without one of its associations
    /// loaded. Reload it with the association populated; retrying as-is
    /// will fail again.
    #[error("thread {thread_id} was projected without {association} eagerly loaded")]
    DataNotLoaded {
        thread_id: String,
        association: Association,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ThreadError {
    /// Store failures may succeed on retry; missing associations are caller
    /// misuse and never will.
    pub fn is_transient(&self) -> bool {
        matches!(self, ThreadError::Store(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_association_is_not_transient() {
        let err = ThreadError::DataNotLoaded {
            thread_id: "t1".to_string(),
            association: Association::Messages,
        };
        assert!(!err.is_transient());
        assert_eq!(
            err.to_string(),
            "thread t1 was projected without messages eagerly loaded"
        );
    }

    #[test]
    fn store_failure_is_transient() {
        let err = ThreadError::from(StoreError::Backend("connection reset".to_string()));
        assert!(err.is_transient());
        assert_eq!(err.to_string(), "store error: connection reset");
    }
}
