//! Path confinement
//!
//! Maps untrusted, client-supplied relative paths onto the real filesystem
//! while keeping every result inside the storage root.

use log::{info, warn};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::StorageError;

/// The canonical directory all client paths are confined to.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct StorageRoot {
    root: PathBuf,
}

impl StorageRoot {
    /// Creates `path` if needed and canonicalizes it.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        fs::create_dir_all(path)?;
        let root = path.canonicalize()?;

        if !root.is_dir() {
            return Err(StorageError::Io(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("storage root is not a directory: {}", root.display()),
            )));
        }

        info!("Storage root: {}", root.display());
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Resolves a root-relative path to an absolute path inside the root.
    ///
    /// Leading separators are ignored, so `/docs` means `<root>/docs`.
    /// Components that exist on disk are canonicalized (following symlinks);
    /// the missing tail is normalized lexically. The result must equal the
    /// root or lie beneath it, compared component by component.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, StorageError> {
        if relative.contains('\0') {
            return Err(StorageError::InvalidName(format!(
                "path contains NUL: {:?}",
                relative
            )));
        }

        let trimmed = relative.trim_start_matches(['/', '\\']);
        let mut resolved = self.root.clone();

        for component in Path::new(trimmed).components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    resolved.pop();
                }
                Component::Normal(part) => {
                    resolved.push(part);
                    match fs::symlink_metadata(&resolved) {
                        Ok(_) => {
                            resolved = match resolved.canonicalize() {
                                Ok(canonical) => canonical,
                                // dangling symlink: its target can't be checked
                                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                                    warn!("Refusing dangling symlink in path {:?}", relative);
                                    return Err(StorageError::PathEscape(relative.to_string()));
                                }
                                Err(e) => return Err(StorageError::Io(e)),
                            };
                        }
                        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                        Err(e) if e.kind() == io::ErrorKind::NotADirectory => {}
                        Err(e) => return Err(StorageError::Io(e)),
                    }
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(StorageError::PathEscape(relative.to_string()));
                }
            }
        }

        if !self.contains(&resolved) {
            warn!(
                "Path escape attempt: {:?} resolved to {}",
                relative,
                resolved.display()
            );
            return Err(StorageError::PathEscape(relative.to_string()));
        }

        Ok(resolved)
    }

    /// Resolves a path to the entry itself rather than to what it points at.
    ///
    /// The parent goes through [`resolve`](Self::resolve); a symlink in the
    /// final position is kept as the link, so removing the result removes the
    /// link and never its target.
    pub fn resolve_entry(&self, relative: &str) -> Result<PathBuf, StorageError> {
        let path = Path::new(relative);
        let Some(Component::Normal(name)) = path.components().next_back() else {
            return self.resolve(relative);
        };
        if relative.contains('\0') {
            return self.resolve(relative);
        }

        let parent = path.parent().and_then(Path::to_str).unwrap_or_default();
        Ok(self.resolve(parent)?.join(name))
    }

    /// Whether `path` is the root or beneath it (segment-wise, not by string prefix)
    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.root)
    }

    /// Converts a resolved absolute path back into its `/`-separated root-relative form
    pub fn relative_path(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let segments: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(segments.join("/"))
    }
}
