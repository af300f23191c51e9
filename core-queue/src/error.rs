use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("index {index} out of bounds for queue of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, QueueError>;
