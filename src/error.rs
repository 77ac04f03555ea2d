//! Error types for yuvkit.

use thiserror::Error;

/// Result type alias using yuvkit's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for yuvkit operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Unrecognized pixel format tag (FourCC).
    #[error("unsupported pixel format: {}", fourcc_to_string(*.0))]
    UnsupportedFormat(u32),

    /// Size or pitch arithmetic would exceed the representable range.
    ///
    /// Checked proactively at every intermediate step, never detected after
    /// the fact via wraparound.
    #[error("size computation overflow")]
    Overflow,

    /// No direct or intermediate conversion path exists between two formats.
    #[error("unsupported conversion: {src} -> {dst}")]
    UnsupportedConversion {
        /// Source format name.
        src: &'static str,
        /// Destination format name.
        dst: &'static str,
    },

    /// The requested transform is not byte-compatible with source == destination.
    #[error("in-place conversion not supported for this format pair")]
    InPlaceUnsupported,

    /// Sub-rectangle lock requested on a layout that requires full-surface access.
    #[error("partial lock not supported for this format")]
    PartialLockUnsupported,

    /// Buffer or auxiliary surface allocation failed.
    #[error("out of memory")]
    OutOfMemory,

    /// Invalid parameter (dimensions, rectangle, pitch, or buffer size).
    #[error("invalid configuration: {0}")]
    Config(String),
}

fn fourcc_to_string(code: u32) -> String {
    let bytes = code.to_le_bytes();
    if bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
        bytes.iter().map(|b| *b as char).collect()
    } else {
        format!("{code:#010x}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fourcc_display() {
        let err = Error::UnsupportedFormat(u32::from_le_bytes(*b"AB12"));
        assert_eq!(err.to_string(), "unsupported pixel format: AB12");
    }

    #[test]
    fn test_non_ascii_fourcc_display() {
        let err = Error::UnsupportedFormat(0x0000_0001);
        assert!(err.to_string().contains("0x00000001"));
    }
}
