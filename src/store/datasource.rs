use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;

/// Error type for persisted document operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid TOML: {0}")]
    TomlDe(#[from] toml::de::Error),
    #[error("could not encode TOML: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

/// On-disk encoding of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Toml,
}

impl Format {
    fn encode<T: Serialize>(self, value: &T) -> Result<String, StoreError> {
        Ok(match self {
            Format::Json => {
                let mut text = serde_json::to_string_pretty(value)?;
                text.push('\n');
                text
            }
            Format::Toml => toml::to_string_pretty(value)?,
        })
    }

    fn decode<T: DeserializeOwned>(self, text: &str) -> Result<T, StoreError> {
        Ok(match self {
            Format::Json => serde_json::from_str(text)?,
            Format::Toml => toml::from_str(text)?,
        })
    }
}

/// An in-memory value mirrored to a single file.
///
/// `get` never observes a value that has not reached disk: `save` encodes,
/// writes through a temp file and rename, and only then swaps the in-memory
/// copy, all while holding the write lock.
#[derive(Debug)]
pub struct Datasource<T> {
    path: PathBuf,
    format: Format,
    value: RwLock<T>,
}

impl<T> Datasource<T>
where
    T: Serialize + DeserializeOwned + Clone + Default,
{
    pub fn new(path: impl Into<PathBuf>, format: Format) -> Self {
        Datasource {
            path: path.into(),
            format,
            value: RwLock::new(T::default()),
        }
    }

    pub fn json(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Format::Json)
    }

    pub fn toml(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Format::Toml)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the in-memory value with the file's contents.
    /// A missing file leaves the current value untouched.
    pub fn load(&self) -> Result<(), StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };
        let decoded: T = self.format.decode(&text)?;
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = decoded;
        Ok(())
    }

    /// Like `load`, but an undecodable file is copied to `<file>.bak` and the
    /// document starts over from its default.
    pub fn load_or_recover(&self) -> Result<(), StoreError> {
        match self.load() {
            Err(e @ StoreError::Read { .. }) => Err(e),
            Err(e) => {
                let bak = backup_path(&self.path);
                // The corrupt file is only replaced once a copy of it exists.
                if let Err(source) = fs::copy(&self.path, &bak) {
                    tracing::warn!(
                        path = %self.path.display(),
                        backup = %bak.display(),
                        error = %source,
                        "could not back up unreadable document"
                    );
                    return Err(StoreError::Write { path: bak, source });
                }
                tracing::warn!(
                    path = %self.path.display(),
                    backup = %bak.display(),
                    error = %e,
                    "could not parse document, starting empty"
                );
                *self.value.write().unwrap_or_else(PoisonError::into_inner) = T::default();
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    }

    /// Snapshot of the current value
    pub fn get(&self) -> T {
        self.value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Write `value` to disk and make it current.
    pub fn save(&self, value: T) -> Result<(), StoreError> {
        let mut current = self.value.write().unwrap_or_else(PoisonError::into_inner);
        self.persist(&value)?;
        *current = value;
        Ok(())
    }

    /// Read-modify-write under a single lock. Nothing changes if encoding or
    /// writing fails.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, StoreError> {
        let mut current = self.value.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = current.clone();
        let result = f(&mut next);
        self.persist(&next)?;
        *current = next;
        Ok(result)
    }

    fn persist(&self, value: &T) -> Result<(), StoreError> {
        let content = self.format.encode(value)?;
        atomic_write(&self.path, content.as_bytes()).map_err(|e| StoreError::Write {
            path: self.path.clone(),
            source: e,
        })
    }
}

/// Write `content` to `path` through a temp file in the same directory.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Doc {
        #[serde(default)]
        name: String,
        #[serde(default)]
        counts: BTreeMap<String, u32>,
    }

    #[test]
    fn load_missing_file_keeps_default() {
        let tmp = TempDir::new().unwrap();
        let ds: Datasource<Doc> = Datasource::json(tmp.path().join("doc.json"));
        ds.load().unwrap();
        assert_eq!(ds.get(), Doc::default());
    }

    #[test]
    fn save_creates_file_and_parent_dirs() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".hangar").join("doc.json");
        let ds: Datasource<Doc> = Datasource::json(&path);
        let doc = Doc {
            name: "first".into(),
            ..Default::default()
        };
        ds.save(doc.clone()).unwrap();
        assert!(path.exists());
        assert_eq!(ds.get(), doc);

        let reloaded: Datasource<Doc> = Datasource::json(&path);
        reloaded.load().unwrap();
        assert_eq!(reloaded.get(), doc);
    }

    #[test]
    fn toml_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        let ds: Datasource<Doc> = Datasource::toml(&path);
        ds.update(|d| {
            d.name = "cfg".into();
            d.counts.insert("a".into(), 3);
        })
        .unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("name = \"cfg\""));

        let reloaded: Datasource<Doc> = Datasource::toml(&path);
        reloaded.load().unwrap();
        assert_eq!(reloaded.get().counts.get("a"), Some(&3));
    }

    #[test]
    fn load_rejects_malformed_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("doc.json");
        fs::write(&path, "not json {{{").unwrap();
        let ds: Datasource<Doc> = Datasource::json(&path);
        assert!(matches!(ds.load(), Err(StoreError::Json(_))));
    }

    #[test]
    fn load_or_recover_backs_up_corrupt_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("doc.json");
        fs::write(&path, "not json {{{").unwrap();
        let ds: Datasource<Doc> = Datasource::json(&path);
        ds.load_or_recover().unwrap();
        assert_eq!(ds.get(), Doc::default());
        assert!(tmp.path().join("doc.json.bak").exists());
    }

    #[cfg(unix)]
    #[test]
    fn failed_write_leaves_value_unchanged() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("locked");
        fs::create_dir_all(&dir).unwrap();
        let ds: Datasource<Doc> = Datasource::json(dir.join("doc.json"));
        ds.save(Doc {
            name: "kept".into(),
            ..Default::default()
        })
        .unwrap();

        fs::set_permissions(&dir, fs::Permissions::from_mode(0o500)).unwrap();
        // Root ignores directory permissions; nothing to assert there.
        if fs::File::create(dir.join("write-check")).is_ok() {
            fs::set_permissions(&dir, fs::Permissions::from_mode(0o700)).unwrap();
            return;
        }

        let result = ds.update(|d| d.name = "lost".into());
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o700)).unwrap();
        assert!(matches!(result, Err(StoreError::Write { .. })));
        assert_eq!(ds.get().name, "kept");
    }

    #[cfg(unix)]
    #[test]
    fn corrupt_file_kept_when_backup_fails() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("locked");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("doc.json");
        fs::write(&path, "not json {{{").unwrap();

        fs::set_permissions(&dir, fs::Permissions::from_mode(0o500)).unwrap();
        if fs::File::create(dir.join("write-check")).is_ok() {
            fs::set_permissions(&dir, fs::Permissions::from_mode(0o700)).unwrap();
            return;
        }

        let ds: Datasource<Doc> = Datasource::json(&path);
        let result = ds.load_or_recover();
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o700)).unwrap();

        assert!(matches!(result, Err(StoreError::Write { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), "not json {{{");
        assert!(!dir.join("doc.json.bak").exists());
    }
}
