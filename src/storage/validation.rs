//! Name validation
//!
//! Checks single path components supplied by clients, such as upload filenames.

use crate::error::StorageError;

/// Validate that `name` is a single, plain path component.
///
/// Separators and `.`/`..` would let a filename address a different
/// directory than the one it was resolved against, so they count as
/// path escapes rather than bad input.
pub fn validate_file_name(name: &str) -> Result<&str, StorageError> {
    if name.is_empty() {
        return Err(StorageError::InvalidName("empty filename".into()));
    }

    if name.contains('\0') {
        return Err(StorageError::InvalidName(format!(
            "filename contains NUL: {:?}",
            name
        )));
    }

    if name == "." || name == ".." || name.contains('/') || name.contains('\\') {
        return Err(StorageError::PathEscape(name.to_string()));
    }

    Ok(name)
}
