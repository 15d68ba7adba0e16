use thiserror::Error;

/// Failure to attach to a supported title or locate its asset tables.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("No supported game is running")]
    NoGamesRunning,

    #[error("Failed to locate asset info for {0}")]
    FailedToLocateInfo(String),

    #[error("Unknown resolution error: {0}")]
    UnknownError(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Failed to open process: {0}")]
    ProcessOpenFailed(String),

    #[error("Source is no longer accessible: {0}")]
    NotAccessible(String),

    #[error("Failed to read memory at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("Read of {len} bytes at {address:#x} is outside window {base:#x}..{end:#x}")]
    OutOfBounds {
        address: u64,
        len: usize,
        base: u64,
        end: u64,
    },

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Failed to search offset: {0}")]
    OffsetSearchFailed(String),

    #[error("Failed to decode {asset}: {message}")]
    Decode { asset: String, message: String },

    #[error("Inconsistent counts in {asset}: {message}")]
    InconsistentCounts { asset: String, message: String },

    #[error("Package entry {key:#x} not found")]
    NotFound { key: u64 },

    #[error("Decompression failed: {0}")]
    Decompression(String),

    #[error("Unsupported codec: {0}")]
    UnsupportedCodec(String),

    #[error("Transcode failed: {0}")]
    Transcode(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn decode(asset: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Decode {
            asset: asset.into(),
            message: message.into(),
        }
    }

    /// Check if this error is a "file not found" or missing package entry error
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            Error::NotFound { .. } => true,
            _ => false,
        }
    }

    /// Errors that end the current walk or export rather than a single asset.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::NotAccessible(_) | Error::Io(_) | Error::Cancelled)
    }
}
