use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("durable store error: {0}")]
    Store(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, CacheError>;
