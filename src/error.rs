use std::fmt;
use std::io;

#[derive(Debug)]
pub enum RadpostError {
    Io(io::Error),
    /// Missing or contradictory parameters for a requested operation.
    Config(String),
    /// Input sequences or array ranks do not fit the requested operation.
    DimensionMismatch(String),
    /// Malformed or truncated image file.
    DataFormat(String),
    /// A physical quantity is outside its valid domain.
    NumericDomain(String),
}

impl fmt::Display for RadpostError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            RadpostError::Io(ref err) => write!(f, "IO error: {}", err),
            RadpostError::Config(ref msg) => write!(f, "configuration error: {}", msg),
            RadpostError::DimensionMismatch(ref msg) => write!(f, "dimension mismatch: {}", msg),
            RadpostError::DataFormat(ref msg) => write!(f, "data format error: {}", msg),
            RadpostError::NumericDomain(ref msg) => write!(f, "numeric domain error: {}", msg),
        }
    }
}

impl std::error::Error for RadpostError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            RadpostError::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for RadpostError {
    fn from(err: io::Error) -> RadpostError {
        RadpostError::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, RadpostError>;
