//! Storage operations
//!
//! Handles file system operations for the HTTP API including list, mkdir,
//! delete, read and write. Every function expects a path that already went
//! through [`StorageRoot::resolve`].

use log::{error, info};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::StorageError;
use crate::storage::resolver::StorageRoot;
use crate::storage::results::{Entry, EntryKind, FileHandle};
use crate::storage::validation::validate_file_name;

/// Sequence for temporary upload names, unique within the process
static UPLOAD_SEQ: AtomicU64 = AtomicU64::new(0);

/// Lists the contents of a directory, sorted by name.
///
/// A directory that does not exist lists as empty.
pub async fn list(root: &StorageRoot, dir: &Path) -> Result<Vec<Entry>, StorageError> {
    let mut read_dir = match fs::read_dir(dir).await {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Listed missing directory {} as empty", display(root, dir));
            return Ok(Vec::new());
        }
        Err(e) => {
            error!("Failed to list directory {}: {}", display(root, dir), e);
            return Err(StorageError::from(e));
        }
    };

    let mut entries = Vec::new();

    while let Some(dir_entry) = read_dir.next_entry().await? {
        let entry_path = dir_entry.path();
        let name = dir_entry.file_name().to_string_lossy().into_owned();

        // Follow symlinks for kind and size; a dangling link lists as an empty file
        let (kind, size) = match fs::metadata(&entry_path).await {
            Ok(metadata) if metadata.is_dir() => (EntryKind::Folder, 0),
            Ok(metadata) => (EntryKind::File, metadata.len()),
            Err(_) => (EntryKind::File, 0),
        };

        let path = root
            .relative_path(&entry_path)
            .unwrap_or_else(|| name.clone());

        entries.push(Entry {
            name,
            kind,
            size,
            path,
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));

    info!(
        "Listed directory {} - {} entries",
        display(root, dir),
        entries.len()
    );

    Ok(entries)
}

/// Creates a directory and any missing parents. Succeeds if it already exists.
pub async fn make_directory(path: &Path) -> Result<(), StorageError> {
    fs::create_dir_all(path).await?;
    info!("Created directory {}", path.display());
    Ok(())
}

/// Deletes a file, or a directory with everything in it.
///
/// `path` should come from [`StorageRoot::resolve_entry`]; a symlink is
/// removed as a link.
pub async fn delete(root: &StorageRoot, path: &Path) -> Result<(), StorageError> {
    if path == root.path() {
        return Err(StorageError::InvalidName(
            "refusing to delete the storage root".into(),
        ));
    }

    let metadata = match fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(StorageError::NotFound(display(root, path)));
        }
        Err(e) => return Err(StorageError::from(e)),
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    };

    match result {
        Ok(()) => {
            info!("Deleted {}", display(root, path));
            Ok(())
        }
        Err(e) => {
            error!("Failed to delete {}: {}", display(root, path), e);
            Err(StorageError::from(e))
        }
    }
}

/// Opens a regular file for streaming and reports its length.
pub async fn open_for_read(root: &StorageRoot, path: &Path) -> Result<FileHandle, StorageError> {
    let metadata = match fs::metadata(path).await {
        Ok(metadata) if metadata.is_file() => metadata,
        Ok(_) => return Err(StorageError::NotFound(display(root, path))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(StorageError::NotFound(display(root, path)));
        }
        Err(e) => return Err(StorageError::from(e)),
    };

    let file = fs::File::open(path).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(FileHandle {
        file,
        len: metadata.len(),
        name,
    })
}

/// Writes `content` to `dir/filename`, creating `dir` if needed and
/// replacing any existing file of that name.
///
/// The data goes to a hidden temporary file first and is renamed into place
/// once fully written. The temporary name has a fixed length, so any name that
/// fits the filesystem as a final name can be written.
pub async fn write_file(
    dir: &Path,
    filename: &str,
    content: &[u8],
) -> Result<PathBuf, StorageError> {
    let filename = validate_file_name(filename)?;

    fs::create_dir_all(dir).await?;

    let final_path = dir.join(filename);
    let temp_path = dir.join(temp_file_name());

    if let Err(e) = write_temp(&temp_path, content).await {
        error!("Failed to write temporary file {}: {}", temp_path.display(), e);
        let _ = fs::remove_file(&temp_path).await;
        return Err(StorageError::from(e));
    }

    if let Err(e) = fs::rename(&temp_path, &final_path).await {
        error!(
            "Failed to rename {} to {}: {}",
            temp_path.display(),
            final_path.display(),
            e
        );
        let _ = fs::remove_file(&temp_path).await;
        return Err(StorageError::from(e));
    }

    info!(
        "Stored {} ({} bytes)",
        final_path.display(),
        content.len()
    );

    Ok(final_path)
}

async fn write_temp(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(content).await?;
    file.flush().await?;
    file.sync_all().await
}

fn temp_file_name() -> String {
    let seq = UPLOAD_SEQ.fetch_add(1, Ordering::Relaxed);
    format!(".upload-{:08x}-{:016x}.part", std::process::id(), seq)
}

fn display(root: &StorageRoot, path: &Path) -> String {
    match root.relative_path(path) {
        Some(relative) if relative.is_empty() => "/".to_string(),
        Some(relative) => relative,
        None => path.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;

    fn setup() -> (TempDir, StorageRoot) {
        let dir = tempfile::tempdir().unwrap();
        let root = StorageRoot::open(&dir.path().join("data")).unwrap();
        (dir, root)
    }

    #[tokio::test]
    async fn test_list_missing_directory_is_empty() {
        let (_dir, root) = setup();
        let path = root.resolve("nope").unwrap();
        assert!(list(&root, &path).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_file_is_an_error() {
        let (_dir, root) = setup();
        std::fs::write(root.path().join("a.txt"), b"x").unwrap();
        let path = root.resolve("a.txt").unwrap();
        assert!(matches!(list(&root, &path).await, Err(StorageError::Io(_))));
    }

    #[tokio::test]
    async fn test_list_sorts_by_name_and_reports_kinds() {
        let (_dir, root) = setup();
        std::fs::create_dir(root.path().join("docs")).unwrap();
        std::fs::write(root.path().join("b.txt"), b"hello").unwrap();
        std::fs::write(root.path().join("B.txt"), b"hi").unwrap();
        std::fs::write(root.path().join("docs/inner.txt"), b"1234").unwrap();

        let entries = list(&root, root.path()).await.unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["B.txt", "b.txt", "docs"]);

        assert_eq!(
            entries[2],
            Entry {
                name: "docs".into(),
                kind: EntryKind::Folder,
                size: 0,
                path: "docs".into(),
            }
        );
        assert_eq!(entries[1].size, 5);

        let docs = root.resolve("docs").unwrap();
        let inner = list(&root, &docs).await.unwrap();
        assert_eq!(inner[0].path, "docs/inner.txt");
        assert_eq!(inner[0].size, 4);
    }

    #[tokio::test]
    async fn test_make_directory_is_idempotent() {
        let (_dir, root) = setup();
        let path = root.resolve("a/b/c").unwrap();
        make_directory(&path).await.unwrap();
        make_directory(&path).await.unwrap();
        assert!(path.is_dir());

        let entries = list(&root, &root.resolve("a/b").unwrap()).await.unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_directory_recursively() {
        let (_dir, root) = setup();
        std::fs::create_dir_all(root.path().join("docs/sub")).unwrap();
        std::fs::write(root.path().join("docs/sub/a.txt"), b"x").unwrap();

        delete(&root, &root.resolve("docs").unwrap()).await.unwrap();
        assert!(!root.path().join("docs").exists());
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let (_dir, root) = setup();
        let path = root.resolve("ghost.txt").unwrap();
        match delete(&root, &path).await {
            Err(StorageError::NotFound(p)) => assert_eq!(p, "ghost.txt"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_root_is_refused() {
        let (_dir, root) = setup();
        assert!(matches!(
            delete(&root, root.path()).await,
            Err(StorageError::InvalidName(_))
        ));
        assert!(root.path().is_dir());
    }

    #[tokio::test]
    async fn test_open_for_read() {
        let (_dir, root) = setup();
        std::fs::write(root.path().join("a.txt"), b"0123456789").unwrap();

        let mut handle = open_for_read(&root, &root.resolve("a.txt").unwrap())
            .await
            .unwrap();
        assert_eq!(handle.len, 10);
        assert_eq!(handle.name, "a.txt");

        let mut buf = Vec::new();
        handle.file.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"0123456789");
    }

    #[tokio::test]
    async fn test_open_directory_is_not_found() {
        let (_dir, root) = setup();
        std::fs::create_dir(root.path().join("docs")).unwrap();

        assert!(matches!(
            open_for_read(&root, &root.resolve("docs").unwrap()).await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            open_for_read(&root, &root.resolve("missing.bin").unwrap()).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_write_file_creates_directory_and_overwrites() {
        let (_dir, root) = setup();
        let dir = root.resolve("docs/new").unwrap();

        let path = write_file(&dir, "a.txt", b"first").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"first");

        write_file(&dir, "a.txt", b"second!").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second!");

        // no temporary files left behind
        let entries = list(&root, &dir).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].size, 7);
    }

    #[tokio::test]
    async fn test_write_empty_file() {
        let (_dir, root) = setup();
        let path = write_file(root.path(), "empty.bin", b"").await.unwrap();
        assert_eq!(std::fs::metadata(path).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_write_file_accepts_longest_names() {
        let (_dir, root) = setup();
        // 255 bytes is the usual NAME_MAX; the temporary name must not push past it
        let name = format!("{}.txt", "n".repeat(251));
        let path = write_file(root.path(), &name, b"long").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"long");

        let entries = list(&root, root.path()).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, name);
    }

    #[test]
    fn test_temp_file_names_are_unique_and_short() {
        let first = temp_file_name();
        let second = temp_file_name();
        assert_ne!(first, second);
        assert_eq!(first.len(), second.len());
        assert!(first.starts_with('.') && first.ends_with(".part"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_delete_symlink_keeps_target() {
        let (_dir, root) = setup();
        std::fs::create_dir_all(root.path().join("real")).unwrap();
        std::fs::write(root.path().join("real/a.txt"), b"keep").unwrap();
        std::os::unix::fs::symlink(root.path().join("real"), root.path().join("alias")).unwrap();

        delete(&root, &root.resolve_entry("alias").unwrap()).await.unwrap();

        assert!(std::fs::symlink_metadata(root.path().join("alias")).is_err());
        assert_eq!(std::fs::read(root.path().join("real/a.txt")).unwrap(), b"keep");
    }

    #[tokio::test]
    async fn test_write_file_rejects_traversal_names() {
        let (dir, root) = setup();
        assert!(matches!(
            write_file(root.path(), "../escape.txt", b"x").await,
            Err(StorageError::PathEscape(_))
        ));
        assert!(!dir.path().join("escape.txt").exists());
    }
}
