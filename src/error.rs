use thiserror::Error as ThisError;

#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum Error {
    /// A point that cannot take part in an operation: non-finite coordinates,
    /// or outside the bounds an index was configured with
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Rectangle bounds that are NaN or out of order
    #[error("invalid range: {0}")]
    InvalidRange(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn invalid_range(message: impl Into<String>) -> Self {
        Self::InvalidRange(message.into())
    }
}
