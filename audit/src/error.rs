use thiserror::Error;
use vouch_store::StoreError;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit queue is full")]
    QueueFull,

    #[error("audit writer has stopped")]
    Closed,

    #[error("audit entry could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("audit sink rejected entry: {0}")]
    Sink(#[from] StoreError),
}
