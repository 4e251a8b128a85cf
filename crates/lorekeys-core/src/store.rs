//! Settings persistence.
//!
//! The host owns the storage; this module only defines the seam plus an
//! in-memory store and a JSON file store keyed by extension id.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::StoreError;
use crate::model::{Settings, EXTENSION_KEY};
use crate::registry::SnippetRegistry;

/// Backing store for the settings blob. Implementations may debounce saves.
pub trait SettingsStore: Send + Sync {
    /// Returns `None` when nothing has been saved yet.
    fn load(&self) -> Result<Option<Settings>, StoreError>;

    fn save(&self, settings: &Settings) -> Result<(), StoreError>;
}

/// Load the registry, initializing defaults on first access and persisting
/// legacy normalization.
pub fn load_registry(store: &dyn SettingsStore) -> Result<SnippetRegistry, StoreError> {
    match store.load()? {
        Some(mut settings) => {
            if settings.normalize() {
                tracing::info!("normalized legacy snippet content");
                store.save(&settings)?;
            }
            Ok(SnippetRegistry::new(settings))
        }
        None => {
            let settings = Settings::defaults();
            store.save(&settings)?;
            Ok(SnippetRegistry::new(settings))
        }
    }
}

/// In-memory store for tests and embedding.
#[derive(Default)]
pub struct MemorySettingsStore {
    settings: Mutex<Option<Settings>>,
    saves: Mutex<usize>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(Some(settings)),
            saves: Mutex::new(0),
        }
    }

    pub fn snapshot(&self) -> Option<Settings> {
        match self.settings.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn save_count(&self) -> usize {
        match self.saves.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<Option<Settings>, StoreError> {
        Ok(self.snapshot())
    }

    fn save(&self, settings: &Settings) -> Result<(), StoreError> {
        match self.settings.lock() {
            Ok(mut guard) => *guard = Some(settings.clone()),
            Err(poisoned) => *poisoned.into_inner() = Some(settings.clone()),
        }
        match self.saves.lock() {
            Ok(mut guard) => *guard += 1,
            Err(poisoned) => *poisoned.into_inner() += 1,
        }
        Ok(())
    }
}

/// JSON file holding every extension's settings in one object; this store
/// reads and writes only the `lorebook_keys` entry.
#[derive(Debug, Clone)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
}

impl JsonFileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_root(&self) -> Result<serde_json::Map<String, serde_json::Value>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(serde_json::Map::new())
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if text.trim().is_empty() {
            return Ok(serde_json::Map::new());
        }
        match serde_json::from_str::<serde_json::Value>(&text)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(StoreError::NotAnObject(self.path.clone())),
        }
    }

    fn write_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl SettingsStore for JsonFileSettingsStore {
    fn load(&self) -> Result<Option<Settings>, StoreError> {
        let mut root = self.read_root()?;
        match root.remove(EXTENSION_KEY) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    fn save(&self, settings: &Settings) -> Result<(), StoreError> {
        let mut root = self.read_root()?;
        root.insert(EXTENSION_KEY.to_string(), serde_json::to_value(settings)?);
        let data = serde_json::to_vec_pretty(&serde_json::Value::Object(root))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.write_err(e))?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp).map_err(|e| self.write_err(e))?;
        file.write_all(&data).map_err(|e| self.write_err(e))?;
        file.sync_all().map_err(|e| self.write_err(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.write_err(e))
    }
}
