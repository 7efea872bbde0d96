// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Storage error types for the knowledge graph backends.

use thiserror::Error;

/// Errors that can occur when loading or saving the durable graph.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred in the underlying storage layer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize or deserialize a graph record.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The stored data is corrupted or in an unexpected format.
    #[error("corrupted data at record {line}: {reason}")]
    CorruptedData {
        /// 1-based record (line) number where the problem was found.
        line: usize,
        reason: String,
    },

    /// The storage backend is not available (e.g., database cannot be opened).
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A write was rejected or only partially applied.
    #[error("write failed: {0}")]
    WriteFailed(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file gone");
        let err = StorageError::Io(io_err);
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_corrupted_data_display() {
        let err = StorageError::CorruptedData {
            line: 3,
            reason: "expected value".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "corrupted data at record 3: expected value"
        );
    }

    #[test]
    fn test_serde_error_converts() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: StorageError = parse.into();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[test]
    fn test_write_failed_display() {
        let err = StorageError::WriteFailed("disk full".to_string());
        assert!(err.to_string().contains("disk full"));
    }
}
