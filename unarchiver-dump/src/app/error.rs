/*!
Errors that can happen during the application's runtime
*/

use std::{
    fmt::{Display, Formatter, Result},
    io::Error as IoError,
    path::PathBuf,
};

use typedstream_unarchiver::error::typedstream::TypedStreamError;

/// Errors that can happen during the application's runtime
#[derive(Debug)]
pub enum RuntimeError {
    InvalidOptions(String),
    ReadError(IoError, PathBuf),
    WriteError(IoError),
    ArchiveError(TypedStreamError),
}

impl Display for RuntimeError {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        match self {
            RuntimeError::InvalidOptions(why) => write!(fmt, "Invalid options!\n{why}"),
            RuntimeError::ReadError(why, path) => write!(fmt, "{why}: {path:?}"),
            RuntimeError::WriteError(why) => write!(fmt, "{why}"),
            RuntimeError::ArchiveError(why) => write!(fmt, "{why}"),
        }
    }
}
