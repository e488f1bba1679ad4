use thiserror::Error;

pub use color_eyre::eyre::eyre;

use crate::protocol::response::{ErrPayload, ErrPayloadBytes};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Server Error: {0}")]
    Server(#[from] ErrPayload),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bad config error: {0}")]
    BadConfigError(String),

    #[error("Invalid packet")]
    InvalidPacket,

    #[error("Unexpected end of packet")]
    UnexpectedEof,

    #[error("Unsupported authentication plugin: {0}")]
    UnsupportedAuthPlugin(String),

    #[error("Incorrect number of parameters; statement requires {expected} but {actual} were provided")]
    ParamCountMismatch { expected: usize, actual: usize },

    #[error(
        "Incorrect number of output columns; statement returns {expected} but the row type has {actual}"
    )]
    ColumnCountMismatch { expected: usize, actual: usize },

    #[error("Tried to run a query as a command")]
    QueryAsCommand,

    #[error("Tried to run a command as a query")]
    CommandAsQuery,

    #[error("Null value encountered in column {column} with non-nullable output type {type_name}")]
    UnexpectedNull {
        column: usize,
        type_name: &'static str,
    },

    #[error("Cannot decode column {column}: {message}")]
    Decode { column: usize, message: String },

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Unknown fetch status {0}")]
    UnknownFetchStatus(i32),

    #[error("Server reported an unknown number of affected rows")]
    UnknownAffectedRows,

    #[error("Template error: {0}")]
    Template(String),

    #[error("{error}; {cleanup}")]
    Cleanup {
        error: Box<Error>,
        cleanup: Box<Error>,
    },

    #[error("Library bug: {0}")]
    LibraryBug(color_eyre::Report),
}

impl Error {
    /// Attach a failure that happened while releasing a statement after `self` was raised.
    pub fn with_cleanup_failure(self, cleanup: Error) -> Self {
        Error::Cleanup {
            error: Box::new(self),
            cleanup: Box::new(cleanup),
        }
    }

    /// The original error, looking through any cleanup failures attached to it.
    pub fn root(&self) -> &Error {
        match self {
            Error::Cleanup { error, .. } => error.root(),
            other => other,
        }
    }

    pub(crate) fn from_debug(err: impl std::fmt::Debug) -> Self {
        Error::LibraryBug(eyre!("{:?}", err))
    }
}

impl<'a> From<ErrPayloadBytes<'a>> for Error {
    fn from(value: ErrPayloadBytes) -> Self {
        match ErrPayload::try_from(value) {
            Ok(err_payload) => Error::Server(err_payload),
            Err(err) => err,
        }
    }
}

impl From<std::convert::Infallible> for Error {
    fn from(err: std::convert::Infallible) -> Self {
        match err {}
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Fold the outcome of an operation and the outcome of the cleanup that followed it.
///
/// The operation's error wins; a cleanup error is attached to it instead of replacing it.
pub(crate) fn merge_cleanup<T>(result: Result<T>, cleanup: Result<()>) -> Result<T> {
    match (result, cleanup) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(cleanup)) => Err(cleanup),
        (Err(error), Ok(())) => Err(error),
        (Err(error), Err(cleanup)) => Err(error.with_cleanup_failure(cleanup)),
    }
}
