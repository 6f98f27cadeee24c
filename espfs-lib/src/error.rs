use thiserror::Error;

/// Convenient result type for `espfs-lib`.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("invalid size literal `{0}`")]
    InvalidSize(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no SPIFFS/LittleFS partition found among {scanned} partition table entries")]
    PartitionNotFound { scanned: usize },

    #[error("missing linker symbol(s): {}", .missing.join(", "))]
    MissingLinkerSymbol { missing: Vec<String> },

    #[error("unsupported filesystem `{0}`, only `littlefs` can be downloaded")]
    UnsupportedFilesystem(String),

    #[error("region invariant violated: {0}")]
    RegionInvariantViolation(String),

    #[error("image size mismatch: expected {expected:#x} bytes ({block_size:#x} byte blocks), got {actual:#x}")]
    ImageSizeMismatch {
        expected: u32,
        actual: u64,
        block_size: u32,
    },

    #[error("flash read with `{tool}` failed: {reason}")]
    ExternalReadFailure { tool: String, reason: String },

    #[error("filesystem extraction with `{tool}` failed: {reason}")]
    ExternalExtractFailure { tool: String, reason: String },
}

impl Error {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::RegionInvariantViolation(msg.into())
    }

    pub fn read_failure(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ExternalReadFailure {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    pub fn extract_failure(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ExternalExtractFailure {
            tool: tool.into(),
            reason: reason.into(),
        }
    }
}
