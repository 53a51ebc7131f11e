//! Scratch directory for one `/generate` request.
//!
//! Uploaded files land in a `laudo_*` temp directory that is removed when the
//! [`Workspace`] is dropped, whatever the outcome of the request.

use std::fs;
use std::path::{Component, Path, PathBuf};

use sanitize_filename::sanitize;
use tempfile::{Builder, TempDir};
use thiserror::Error;

const WORKSPACE_PREFIX: &str = "laudo_";

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("unsafe file path '{0}'")]
    UnsafePath(String),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WorkspaceError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WorkspaceError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Turn a client-supplied path into a relative path that stays inside the
/// workspace. Leading slashes are dropped, backslashes become separators and
/// every segment is sanitized; `..` is refused.
pub fn safe_relative_path(raw: &str) -> Result<PathBuf, WorkspaceError> {
    let normalized = raw.trim().replace('\\', "/");
    let trimmed = normalized.trim_start_matches('/');

    let mut path = PathBuf::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(segment) => {
                let segment = sanitize(segment.to_string_lossy());
                if segment.is_empty() {
                    return Err(WorkspaceError::UnsafePath(raw.to_string()));
                }
                path.push(segment);
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(WorkspaceError::UnsafePath(raw.to_string()))
            }
        }
    }

    if path.as_os_str().is_empty() {
        return Err(WorkspaceError::UnsafePath(raw.to_string()));
    }
    Ok(path)
}

/// A temp directory owned by one request.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn create() -> Result<Self, WorkspaceError> {
        let dir = Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir()
            .map_err(|e| WorkspaceError::io(std::env::temp_dir(), e))?;
        log::debug!("Created workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `data` at the client-supplied relative path, creating folders.
    pub fn write_file(&self, relative: &str, data: &[u8]) -> Result<PathBuf, WorkspaceError> {
        let target = self.path().join(safe_relative_path(relative)?);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| WorkspaceError::io(parent, e))?;
        }
        fs::write(&target, data).map_err(|e| WorkspaceError::io(&target, e))?;
        Ok(target)
    }

    /// Copy a file from outside the workspace to `name` inside it.
    pub fn copy_in(&self, source: &Path, name: &str) -> Result<PathBuf, WorkspaceError> {
        let target = self.path().join(safe_relative_path(name)?);
        fs::copy(source, &target).map_err(|e| WorkspaceError::io(source, e))?;
        Ok(target)
    }
}
