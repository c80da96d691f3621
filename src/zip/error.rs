//! Error types for central directory operations.
//!
//! Every failure of the byte-level core is reported as a distinct
//! [`ZipError`] variant. Lookup misses are not errors.

use thiserror::Error;

/// Errors produced by the record views, the lookup engine and the merge engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZipError {
    /// Fewer bytes are available than a field or record requires.
    #[error("Truncated buffer: need {needed} bytes, have {available}")]
    TruncatedBuffer {
        /// Number of bytes needed.
        needed: usize,
        /// Number of bytes available.
        available: usize,
    },

    /// Magic value mismatch.
    #[error("Invalid signature: expected {expected:#010x}, found {found:#010x}")]
    InvalidSignature {
        /// Signature required by the record type.
        expected: u32,
        /// Signature found in the buffer.
        found: u32,
    },

    /// Directory byte size does not fit `records` entries of `stride` bytes.
    #[error("Record count mismatch: {size} directory bytes for {records} records of stride {stride}")]
    RecordCountMismatch {
        /// Directory size in bytes.
        size: usize,
        /// Declared record count.
        records: usize,
        /// Assumed record stride.
        stride: usize,
    },

    /// In-place name rewrite with a different byte length.
    #[error("Name length mismatch: field holds {expected} bytes, replacement has {found}")]
    NameLengthMismatch {
        /// Length stored in the record.
        expected: usize,
        /// Length of the replacement name.
        found: usize,
    },

    /// A rebased local header offset does not fit in 32 bits.
    #[error("Offset overflow: {offset} + {shift} exceeds 32-bit range")]
    OffsetOverflow {
        /// Original local header offset.
        offset: u32,
        /// Shift being applied.
        shift: u64,
    },

    /// The end record carries zip64 sentinel values.
    #[error("ZIP64 archives are not supported")]
    Zip64Unsupported,
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, ZipError>;
