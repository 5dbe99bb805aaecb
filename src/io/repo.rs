use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::io::paths::is_hidden;
use crate::store::StoreError;

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    Conflict(String),
    #[error("nothing to do: {0} is already there")]
    Unchanged(String),
    #[error("could not access {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("change applied but not saved: {0}")]
    Store(#[from] StoreError),
}

impl RepoError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        RepoError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Names of the immediate, non-hidden subdirectories of `dir`, sorted.
pub(crate) fn list_subdirs(dir: &Path) -> Result<Vec<String>, RepoError> {
    let entries = fs::read_dir(dir).map_err(|e| RepoError::io(dir, e))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| RepoError::io(dir, e))?;
        let file_type = entry.file_type().map_err(|e| RepoError::io(&entry.path(), e))?;
        if !file_type.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            tracing::debug!(path = %entry.path().display(), "skipping non-UTF-8 directory");
            continue;
        };
        if is_hidden(&name) {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

/// Create `dir` if it does not exist yet.
pub(crate) fn ensure_dir(dir: &Path) -> Result<(), RepoError> {
    if dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|e| RepoError::io(dir, e))
}

/// Rename a directory, refusing to clobber an existing target.
pub(crate) fn rename_dir(from: &Path, to: &Path) -> Result<(), RepoError> {
    if to.exists() {
        return Err(RepoError::Conflict(to.display().to_string()));
    }
    fs::rename(from, to).map_err(|e| RepoError::io(from, e))
}

/// Remove a directory tree. A directory that is already gone counts as removed.
pub(crate) fn remove_dir(dir: &Path) -> Result<(), RepoError> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(RepoError::io(dir, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn list_subdirs_skips_files_and_hidden() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("beta")).unwrap();
        fs::create_dir_all(tmp.path().join("alpha")).unwrap();
        fs::create_dir_all(tmp.path().join(".hangar")).unwrap();
        fs::write(tmp.path().join("notes.txt"), "x").unwrap();
        assert_eq!(list_subdirs(tmp.path()).unwrap(), vec!["alpha", "beta"]);
    }

    #[test]
    fn list_subdirs_missing_dir_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = list_subdirs(&tmp.path().join("nope")).unwrap_err();
        assert!(matches!(err, RepoError::Io { .. }));
    }

    #[test]
    fn rename_dir_refuses_existing_target() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("a")).unwrap();
        fs::create_dir_all(tmp.path().join("b")).unwrap();
        let err = rename_dir(&tmp.path().join("a"), &tmp.path().join("b")).unwrap_err();
        assert!(matches!(err, RepoError::Conflict(_)));
        assert!(tmp.path().join("a").is_dir());
    }

    #[test]
    fn remove_dir_tolerates_missing() {
        let tmp = TempDir::new().unwrap();
        remove_dir(&tmp.path().join("gone")).unwrap();
    }
}
