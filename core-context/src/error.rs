use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContextError {
    #[error("context unavailable: {0}")]
    ContextUnavailable(String),
}

pub type Result<T> = std::result::Result<T, ContextError>;
