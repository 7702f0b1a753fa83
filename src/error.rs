//! Error type shared by every stage of QR generation.
use thiserror::Error;

/// Main error type for qrsvg operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed SVG length, unknown unit or unusable viewBox
    #[error("Format error: {0}")]
    Format(String),

    /// Payload could not be encoded at the requested correction level
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Logo file unreadable, unparsable, unrenderable or without size information
    #[error("Asset error: {0}")]
    Asset(String),

    /// Interactive prompt was cancelled
    #[error("Input aborted")]
    InputAborted,

    /// Caller supplied an out-of-range option
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No QR content could be read back from an image
    #[error("Decode error: {0}")]
    Decode(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<qrcode::types::QrError> for Error {
    fn from(err: qrcode::types::QrError) -> Self {
        Error::Encoding(err.to_string())
    }
}

/// Result type for qrsvg operations.
pub type Result<T> = std::result::Result<T, Error>;
