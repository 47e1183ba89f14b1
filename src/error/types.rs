//! Error types
//!
//! Defines domain-specific error types for each layer of the server.

use std::fmt;
use std::io;

/// Storage and path-confinement errors
#[derive(Debug)]
pub enum StorageError {
    /// A client-supplied path or filename resolves outside the storage root
    PathEscape(String),
    NotFound(String),
    InvalidName(String),
    Io(io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::PathEscape(p) => write!(f, "Path escapes storage root: {}", p),
            StorageError::NotFound(p) => write!(f, "Not found: {}", p),
            StorageError::InvalidName(s) => write!(f, "Invalid name: {}", s),
            StorageError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(error: io::Error) -> Self {
        StorageError::Io(error)
    }
}

/// Multipart body errors
#[derive(Debug, PartialEq)]
pub enum MultipartError {
    NotMultipart(String),
    MissingBoundary,
    MissingFile,
    Truncated,
    InvalidField(String),
}

impl fmt::Display for MultipartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MultipartError::NotMultipart(ct) => {
                write!(f, "Expected multipart/form-data, got: {}", ct)
            }
            MultipartError::MissingBoundary => write!(f, "Content-Type has no boundary"),
            MultipartError::MissingFile => write!(f, "No file field in upload"),
            MultipartError::Truncated => write!(f, "Multipart body is truncated"),
            MultipartError::InvalidField(name) => write!(f, "Invalid multipart field: {}", name),
        }
    }
}

impl std::error::Error for MultipartError {}

/// Request errors that surface after hyper has parsed the head
#[derive(Debug)]
pub enum RequestError {
    Malformed(String),
    PayloadTooLarge { limit: u64 },
    /// The body could not be read in full
    Truncated(String),
    InvalidJson(String),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Malformed(s) => write!(f, "Malformed request: {}", s),
            RequestError::PayloadTooLarge { limit } => {
                write!(f, "Request body exceeds limit of {} bytes", limit)
            }
            RequestError::Truncated(s) => write!(f, "Request body truncated: {}", s),
            RequestError::InvalidJson(s) => write!(f, "Invalid JSON body: {}", s),
        }
    }
}

impl std::error::Error for RequestError {}

/// General server error that encompasses all error types
#[derive(Debug)]
pub enum DriveError {
    Storage(StorageError),
    Multipart(MultipartError),
    Request(RequestError),
    Io(io::Error),
}

impl fmt::Display for DriveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Messages reach clients verbatim, so no layer prefix here.
        match self {
            DriveError::Storage(e) => write!(f, "{}", e),
            DriveError::Multipart(e) => write!(f, "{}", e),
            DriveError::Request(e) => write!(f, "{}", e),
            DriveError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for DriveError {}

impl From<StorageError> for DriveError {
    fn from(error: StorageError) -> Self {
        DriveError::Storage(error)
    }
}

impl From<MultipartError> for DriveError {
    fn from(error: MultipartError) -> Self {
        DriveError::Multipart(error)
    }
}

impl From<RequestError> for DriveError {
    fn from(error: RequestError) -> Self {
        DriveError::Request(error)
    }
}

impl From<io::Error> for DriveError {
    fn from(error: io::Error) -> Self {
        DriveError::Io(error)
    }
}
