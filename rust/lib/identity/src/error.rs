use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdentityError {
    /// An identity with the same email already exists.
    #[error("identity already exists: {0}")]
    Duplicate(String),

    /// The identity does not exist. Deletion workflows treat this as
    /// already-done; everything else treats it as fatal.
    #[error("identity not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}
