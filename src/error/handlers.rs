//! Error handlers
//!
//! Maps errors onto HTTP status codes and logs them.

use hyper::StatusCode;
use log::{error, warn};

use crate::error::types::{DriveError, RequestError, StorageError};

/// Log a request error at a level matching its status class
pub fn handle_error(err: &DriveError, status: StatusCode) {
    if status.is_server_error() {
        error!("Request failed: {}", err);
    } else {
        warn!("Request rejected: {}", err);
    }
}

/// Convert error to HTTP status code for file downloads and inline views
pub fn error_to_status(err: &DriveError) -> StatusCode {
    match err {
        DriveError::Storage(e) => match e {
            StorageError::PathEscape(_) => StatusCode::BAD_REQUEST,
            StorageError::InvalidName(_) => StatusCode::BAD_REQUEST,
            StorageError::NotFound(_) => StatusCode::NOT_FOUND,
            StorageError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        },
        DriveError::Multipart(_) => StatusCode::BAD_REQUEST,
        DriveError::Request(e) => match e {
            RequestError::Malformed(_) => StatusCode::BAD_REQUEST,
            RequestError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            RequestError::Truncated(_) => StatusCode::BAD_REQUEST,
            RequestError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        },
        DriveError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Convert error to HTTP status code for the JSON API endpoints.
///
/// A missing target or a refused name is a failed operation there: 500 with
/// the message in the JSON body. Path escapes and malformed input stay 4xx.
pub fn api_error_status(err: &DriveError) -> StatusCode {
    match err {
        DriveError::Storage(StorageError::NotFound(_) | StorageError::InvalidName(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        other => error_to_status(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MultipartError;
    use std::io;

    #[test]
    fn test_client_errors_map_to_4xx() {
        let escape = DriveError::from(StorageError::PathEscape("../etc".into()));
        assert_eq!(error_to_status(&escape), StatusCode::BAD_REQUEST);

        let missing = DriveError::from(StorageError::NotFound("a.txt".into()));
        assert_eq!(error_to_status(&missing), StatusCode::NOT_FOUND);

        let multipart = DriveError::from(MultipartError::MissingBoundary);
        assert_eq!(error_to_status(&multipart), StatusCode::BAD_REQUEST);

        let too_big = DriveError::from(RequestError::PayloadTooLarge { limit: 10 });
        assert_eq!(error_to_status(&too_big), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_io_errors_map_to_500() {
        let err = DriveError::from(StorageError::Io(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "denied",
        )));
        assert_eq!(error_to_status(&err), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            error_to_status(&DriveError::Io(io::Error::other("boom"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_api_failures_map_to_500() {
        let missing = DriveError::from(StorageError::NotFound("ghost".into()));
        assert_eq!(api_error_status(&missing), StatusCode::INTERNAL_SERVER_ERROR);

        let empty = DriveError::from(StorageError::InvalidName("Folder name required".into()));
        assert_eq!(api_error_status(&empty), StatusCode::INTERNAL_SERVER_ERROR);

        let escape = DriveError::from(StorageError::PathEscape("../x".into()));
        assert_eq!(api_error_status(&escape), StatusCode::BAD_REQUEST);

        let json = DriveError::from(RequestError::InvalidJson("eof".into()));
        assert_eq!(api_error_status(&json), StatusCode::BAD_REQUEST);
    }
}
