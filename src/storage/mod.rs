//! File system storage management
//!
//! Confines client paths to the storage root and performs the file
//! operations behind the HTTP API.

pub mod operations;
pub mod resolver;
pub mod results;
pub mod validation;

pub use operations::{delete, list, make_directory, open_for_read, write_file};
pub use resolver::StorageRoot;
pub use results::{Entry, EntryKind, FileHandle};
pub use validation::validate_file_name;
