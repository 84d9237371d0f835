use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt session storage: {0}")]
    Corrupt(String),

    #[error("session serialization failed: {0}")]
    Serialization(String),
}
