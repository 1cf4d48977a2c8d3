use thiserror::Error;

pub type AclResult<T> = Result<T, AclError>;

#[derive(Debug, Error)]
pub enum AclError {
    #[error("invalid grant: {0}")]
    InvalidGrant(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
