//! Error types for the PDF writer.
//!
//! Every error is fatal for the document being written: once an operation fails, the
//! output sink holds a partial document that must be discarded.

/// Result type alias for writer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while building or writing a PDF.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A caller supplied a value outside of the accepted domain
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Unsupported PDF version
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Password cannot be used with the standard security handler
    #[error("Unsupported password: {0}")]
    UnsupportedPassword(String),

    /// A reserved storage slot was never filled
    #[error("Object slot for id {0} was reserved but not filled")]
    UnfilledSlot(u32),

    /// Attempt to fill a slot that was never reserved
    #[error("No reserved slot for id {0} found")]
    SlotNotReserved(u32),

    /// A reference was presented to a storage that did not mint it
    #[error("Reference {0} does not belong to this object storage")]
    StorageMismatch(crate::object::ObjectRef),

    /// A reference points into a storage that is not available to the consumer
    #[error("Reference {0} points into a foreign object storage")]
    ForeignReference(crate::object::ObjectRef),

    /// The graph sweep produced a value of the wrong shape
    #[error("Unexpected sweep result: expected {expected}, found {found}")]
    UnexpectedSweepResult {
        /// Expected object type
        expected: String,
        /// Actual object type found
        found: String,
    },

    /// Write attempted after the writer was closed
    #[error("Writer is closed")]
    WriterClosed,

    /// Cipher failure
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Image import error
    #[error("Image error: {0}")]
    Image(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Image(err.to_string())
    }
}
