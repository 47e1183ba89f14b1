//! Storage result types
//!
//! Defines result structures returned by storage operations.

use serde::Serialize;

/// Kind of a listed entry, serialized the way the web UI expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Folder,
}

/// A file or directory inside the storage root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Size in bytes, 0 for folders
    pub size: u64,
    /// Root-relative path, `/`-separated
    pub path: String,
}

/// An opened file ready to be streamed
#[derive(Debug)]
pub struct FileHandle {
    pub file: tokio::fs::File,
    pub len: u64,
    pub name: String,
}
