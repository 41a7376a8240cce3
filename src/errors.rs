use std::fmt;

/// Errors raised while filling column vectors, encoding column chunks or
/// decoding them back.
#[derive(Debug)]
pub enum Error {
    /// A buffer or offset computation would exceed the representable size.
    CapacityOverflow { requested: usize, limit: usize },
    /// A row reference points outside the vector or outside its source bytes.
    InvalidRowReference(String),
    /// The column chunk was already flushed (or the writer closed).
    SealedChunkMutation,
    /// The output sink rejected a write.
    EncoderResourceExhaustion(std::io::Error),
    /// The vector was closed and its storage released.
    VectorClosed,
    /// Malformed configuration or chunk bytes.
    OutOfSpec(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::CapacityOverflow { requested, limit } => {
                write!(f, "capacity overflow: requested {requested}, limit {limit}")
            }
            Error::InvalidRowReference(msg) => write!(f, "invalid row reference: {msg}"),
            Error::SealedChunkMutation => write!(f, "column chunk is already flushed"),
            Error::EncoderResourceExhaustion(e) => write!(f, "output sink error: {e}"),
            Error::VectorClosed => write!(f, "column vector is closed"),
            Error::OutOfSpec(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::EncoderResourceExhaustion(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::EncoderResourceExhaustion(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::OutOfSpec(format!("invalid metadata: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

macro_rules! general_err {
    ($fmt:expr) => (Error::OutOfSpec($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (Error::OutOfSpec(format!($fmt, $($args),*)));
}

macro_rules! row_err {
    ($fmt:expr) => (Error::InvalidRowReference($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (Error::InvalidRowReference(format!($fmt, $($args),*)));
}
