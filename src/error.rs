//! Error types for whitebox-raster

use std::io;
use thiserror::Error;

/// Result type for whitebox-raster operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while reading or writing a Whitebox raster
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error on one of the sidecar files
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Header sidecar is unparseable or lacks required geometry fields
    #[error("Corrupt header: {0}")]
    CorruptHeader(String),

    /// Data sidecar length does not match the header geometry
    #[error("Corrupt data file: expected {expected} bytes, found {actual}")]
    CorruptData { expected: u64, actual: u64 },

    /// Two rasters that must align cell-for-cell do not
    #[error("Raster dimension mismatch: expected {expected_rows}x{expected_cols}, got {actual_rows}x{actual_cols}")]
    DimensionMismatch {
        expected_rows: usize,
        expected_cols: usize,
        actual_rows: usize,
        actual_cols: usize,
    },

    /// Unrecognized data type name
    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    /// Stats sidecar is unparseable
    #[error("Corrupt stats file: {0}")]
    CorruptStats(String),

    /// Unsupported feature
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// A full-grid scan was cancelled through its cancel flag
    #[error("Operation cancelled")]
    Cancelled,

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Config(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::CorruptHeader("missing Rows".to_string());
        assert_eq!(err.to_string(), "Corrupt header: missing Rows");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_corrupt_data_reports_lengths() {
        let err = Error::CorruptData { expected: 32, actual: 30 };
        let msg = err.to_string();
        assert!(msg.contains("32"));
        assert!(msg.contains("30"));
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = Error::DimensionMismatch {
            expected_rows: 3,
            expected_cols: 4,
            actual_rows: 5,
            actual_cols: 6,
        };
        assert!(err.to_string().contains("3x4"));
        assert!(err.to_string().contains("5x6"));
    }
}
