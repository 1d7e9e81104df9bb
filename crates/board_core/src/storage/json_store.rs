use crate::error::AppError;
use crate::storage::{KeyValueStore, SlotWrite};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const SCHEMA_VERSION: u32 = 1;
pub const STORE_ENV_VAR: &str = "BOARD_STORE_PATH";
const STORE_FILE_NAME: &str = "store.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredEntries {
    schema_version: u32,
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

/// File-backed slot store. Every change writes a complete sibling file and
/// renames it over the old one, so readers see either version in full.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

pub fn store_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("board").join(STORE_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("board")
            .join(STORE_FILE_NAME))
    }
}

impl JsonFileStore {
    pub fn open_default() -> Result<Self, AppError> {
        let path = store_path()?;
        Self::open(path)
    }

    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self, AppError> {
        let path = path.into();
        let entries = load_entries(&path)?;
        tracing::debug!(path = %path.display(), keys = entries.len(), "opened store file");
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), AppError> {
        save_entries(&self.path, entries)
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.entries.get(key).cloned())
    }

    fn apply(&mut self, writes: &[SlotWrite<'_>]) -> Result<(), AppError> {
        let mut next = self.entries.clone();
        for (key, value) in writes {
            match value {
                Some(value) => {
                    next.insert(key.to_string(), value.to_string());
                }
                None => {
                    next.remove(*key);
                }
            }
        }
        if next == self.entries {
            return Ok(());
        }

        self.flush(&next)?;
        self.entries = next;
        Ok(())
    }
}

fn load_entries(path: &Path) -> Result<BTreeMap<String, String>, AppError> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let stored: StoredEntries = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;

    if stored.schema_version != SCHEMA_VERSION {
        return Err(AppError::invalid_data("schema_version mismatch"));
    }

    Ok(stored.entries)
}

fn save_entries(path: &Path, entries: &BTreeMap<String, String>) -> Result<(), AppError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent)?;
            parent
        }
        _ => Path::new("."),
    };

    let stored = StoredEntries {
        schema_version: SCHEMA_VERSION,
        entries: entries.clone(),
    };
    let content = serde_json::to_string_pretty(&stored)?;

    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(content.as_bytes())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        staged.as_file().set_permissions(permissions)?;
    }

    staged.as_file().sync_all()?;
    staged
        .persist(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err.error)))?;

    Ok(())
}
