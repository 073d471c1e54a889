use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("invalid segment: {0}")]
    InvalidSegment(String),
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("invalid access tag: {0}")]
    InvalidTag(String),
    #[error("invalid effect: {0}")]
    InvalidEffect(String),
}

pub type AuthzResult<T> = Result<T, AuthzError>;
