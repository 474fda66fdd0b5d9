use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StreamError>;

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("reader closed")]
    ReaderClosed,
    #[error("{0} on closed stream")]
    Closed(&'static str),
    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl<T> From<std::sync::PoisonError<T>> for StreamError {
    fn from(value: std::sync::PoisonError<T>) -> Self {
        Self::Other(anyhow::anyhow!(value.to_string()))
    }
}

impl From<StreamError> for io::Error {
    fn from(value: StreamError) -> Self {
        match value {
            StreamError::Io(err) => err,
            StreamError::ReaderClosed => {
                io::Error::new(io::ErrorKind::BrokenPipe, "reader closed")
            }
            other => io::Error::new(io::ErrorKind::Other, other.to_string()),
        }
    }
}
