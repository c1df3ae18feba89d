use std::num::ParseIntError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// ErrDuplicateTrackId indicates a track was added to a stream which
    /// already holds a track with the same id.
    #[error("track id already present in stream")]
    ErrDuplicateTrackId,
    /// ErrSsrcParse indicates a signaled SSRC parameter is not a valid
    /// 32-bit unsigned integer.
    #[error("ssrc parse error: {0}")]
    ErrSsrcParse(String),

    #[error("mutex poison: {0}")]
    PoisonError(String),
}

impl From<ParseIntError> for Error {
    fn from(e: ParseIntError) -> Self {
        Error::ErrSsrcParse(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Error::PoisonError(e.to_string())
    }
}
