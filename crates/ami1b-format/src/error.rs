//! Error types for 1B module handling

use thiserror::Error;

/// Errors that can occur when loading, editing or writing a 1B module
#[derive(Debug, Error)]
pub enum ModuleError {
    /// Open, read, write or stat failure, including chunk reads past EOF
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Header prologue or component table cannot be decoded
    #[error("malformed 1B header: {0}")]
    MalformedHeader(String),

    /// Declared component count exceeds the configured table capacity
    #[error("unsupported component count: {count} (maximum is {max})")]
    UnsupportedComponentCount {
        /// Count from the header prologue
        count: u16,
        /// Configured ceiling
        max: usize,
    },

    /// Component has no payload in the module file
    #[error("component [{position:02X}h] has no data present in the module")]
    ComponentNotPresent {
        /// Table position of the component
        position: usize,
    },

    /// Lookup by position or file offset matched nothing
    #[error("component not found: {0}")]
    ComponentNotFound(String),

    /// Module state cannot be serialized or used
    #[error("invalid module: {0}")]
    InvalidModule(String),

    /// Replacement payload does not fit the 31-bit length field
    #[error("payload for component [{position:02X}h] is too large: {length} bytes")]
    PayloadTooLarge {
        /// Table position of the component
        position: usize,
        /// Length of the rejected payload
        length: u64,
    },

    /// Binary read/write error
    #[error("binary parsing error: {0}")]
    BinRead(String),
}

impl ModuleError {
    /// Whether the error means the header itself could not be decoded
    ///
    /// An over-capacity component count is reported through its own variant
    /// but is a header defect all the same.
    pub const fn is_malformed_header(&self) -> bool {
        matches!(
            self,
            Self::MalformedHeader(_) | Self::UnsupportedComponentCount { .. }
        )
    }
}

impl From<binrw::Error> for ModuleError {
    fn from(e: binrw::Error) -> Self {
        match e {
            binrw::Error::Io(io) => Self::Io(io),
            other => Self::BinRead(other.to_string()),
        }
    }
}

/// Result type alias for 1B module operations
pub type Result<T> = std::result::Result<T, ModuleError>;
