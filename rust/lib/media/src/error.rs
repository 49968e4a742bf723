use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("invalid media key: {0}")]
    InvalidKey(String),

    #[error("media not found: {0}")]
    NotFound(String),
}
