// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for zebralink.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to reach a printer over its transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error("printer at {0} is unreachable")]
    AddressUnreachable(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("connection already in use: {0}")]
    AlreadyInUse(String),
}

impl ConnectionError {
    /// Classify an OS-level connect failure against `endpoint`.
    pub fn from_io(err: &std::io::Error, endpoint: &str) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::TimedOut => Self::Timeout(format!("connect to {endpoint}: {err}")),
            ErrorKind::PermissionDenied => Self::PermissionDenied(format!("{endpoint}: {err}")),
            ErrorKind::AddrInUse | ErrorKind::ResourceBusy => {
                Self::AlreadyInUse(format!("{endpoint}: {err}"))
            }
            _ => Self::AddressUnreachable(format!("{endpoint} ({err})")),
        }
    }
}

/// Failure to load a document from local storage.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level error type for all zebralink operations.
#[derive(Debug, Error)]
pub enum ZebraLinkError {
    // -- Transport / session --
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("write to printer failed: {0}")]
    Write(String),

    #[error("malformed printer response: {0}")]
    Protocol(String),

    #[error(transparent)]
    File(#[from] FileError),

    // -- Routing --
    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("printer rejected the command: {0}")]
    Rejected(String),

    #[error("invalid arguments: {0}")]
    Validation(String),

    // -- Discovery / platform --
    #[error("bluetooth scanner unavailable: {0}")]
    ScannerUnavailable(String),

    #[error("feature not available on this platform")]
    PlatformUnavailable,

    // -- Ambient --
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal failure: {0}")]
    Internal(String),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ZebraLinkError>;

/// Error codes surfaced to callers in a terminal failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    AddressUnreachable,
    Timeout,
    PermissionDenied,
    AlreadyInUse,
    WriteError,
    ProtocolError,
    FileNotFound,
    FileReadError,
    NotImplemented,
    Rejected,
    ScannerUnavailable,
    ValidationError,
    Exception,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddressUnreachable => "ADDRESS_UNREACHABLE",
            Self::Timeout => "TIMEOUT",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::AlreadyInUse => "ALREADY_IN_USE",
            Self::WriteError => "WRITE_ERROR",
            Self::ProtocolError => "PROTOCOL_ERROR",
            Self::FileNotFound => "FILE_NOT_FOUND",
            Self::FileReadError => "FILE_READ_ERROR",
            Self::NotImplemented => "NOT_IMPLEMENTED",
            Self::Rejected => "REJECTED",
            Self::ScannerUnavailable => "SCANNER_UNAVAILABLE",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::Exception => "EXCEPTION",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ZebraLinkError {
    /// The outward error code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Connection(ConnectionError::AddressUnreachable(_)) => ErrorCode::AddressUnreachable,
            Self::Connection(ConnectionError::Timeout(_)) => ErrorCode::Timeout,
            Self::Connection(ConnectionError::PermissionDenied(_)) => ErrorCode::PermissionDenied,
            Self::Connection(ConnectionError::AlreadyInUse(_)) => ErrorCode::AlreadyInUse,
            Self::Write(_) => ErrorCode::WriteError,
            Self::Protocol(_) => ErrorCode::ProtocolError,
            Self::File(FileError::NotFound(_)) => ErrorCode::FileNotFound,
            Self::File(FileError::Read { .. }) => ErrorCode::FileReadError,
            Self::NotImplemented(_) => ErrorCode::NotImplemented,
            Self::Rejected(_) => ErrorCode::Rejected,
            Self::Validation(_) => ErrorCode::ValidationError,
            Self::ScannerUnavailable(_) | Self::PlatformUnavailable => {
                ErrorCode::ScannerUnavailable
            }
            Self::Io(_) | Self::Serialization(_) | Self::Internal(_) => ErrorCode::Exception,
        }
    }

    /// Whether this failure happened while reaching the printer.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_kinds_map_to_distinct_codes() {
        let unreachable: ZebraLinkError =
            ConnectionError::AddressUnreachable("10.0.0.9:9100".into()).into();
        let timeout: ZebraLinkError = ConnectionError::Timeout("connect".into()).into();
        assert_eq!(unreachable.code(), ErrorCode::AddressUnreachable);
        assert_eq!(timeout.code(), ErrorCode::Timeout);
        assert!(timeout.is_connection());
    }

    #[test]
    fn io_errors_classify_by_kind() {
        use std::io::{Error, ErrorKind};
        let refused = Error::from(ErrorKind::ConnectionRefused);
        assert!(matches!(
            ConnectionError::from_io(&refused, "10.0.0.9:9100"),
            ConnectionError::AddressUnreachable(_)
        ));
        let denied = Error::from(ErrorKind::PermissionDenied);
        assert!(matches!(
            ConnectionError::from_io(&denied, "AA:BB:CC:DD:EE:FF"),
            ConnectionError::PermissionDenied(_)
        ));
        let busy = Error::from(ErrorKind::AddrInUse);
        assert!(matches!(
            ConnectionError::from_io(&busy, "AA:BB:CC:DD:EE:FF"),
            ConnectionError::AlreadyInUse(_)
        ));
    }

    #[test]
    fn file_errors_keep_the_path() {
        let err: ZebraLinkError = FileError::NotFound(PathBuf::from("/tmp/missing.zpl")).into();
        assert_eq!(err.code(), ErrorCode::FileNotFound);
        assert!(err.to_string().contains("/tmp/missing.zpl"));
    }

    #[test]
    fn codes_serialize_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::NotImplemented).unwrap();
        assert_eq!(json, "\"NOT_IMPLEMENTED\"");
        assert_eq!(ErrorCode::ScannerUnavailable.as_str(), "SCANNER_UNAVAILABLE");
    }

    #[test]
    fn uncaught_failures_surface_as_exception() {
        let err = ZebraLinkError::Internal("worker panicked".into());
        assert_eq!(err.code(), ErrorCode::Exception);
    }
}
