//! Persistent key/value settings, grouped by section.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{HostError, Result};

/// A sectioned string store.  Typed accessors parse the stored text; a value
/// that is missing or does not parse reads as `None`.
pub trait SettingsStore: Send {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn set_string(&mut self, section: &str, key: &str, value: &str);

    fn get_int(&self, section: &str, key: &str) -> Option<i64> {
        self.get_string(section, key)?.trim().parse().ok()
    }

    fn set_int(&mut self, section: &str, key: &str, value: i64) {
        self.set_string(section, key, &value.to_string());
    }

    fn get_double(&self, section: &str, key: &str) -> Option<f64> {
        self.get_string(section, key)?.trim().parse().ok()
    }

    /// Store each `(key, value)` whose key is not set yet.
    fn set_defaults(&mut self, section: &str, defaults: &[(&str, &str)]) {
        for (key, value) in defaults {
            if self.get_string(section, key).is_none() {
                self.set_string(section, key, value);
            }
        }
    }

    /// Write pending changes to backing storage.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// In-memory store.  Clones share the same map, so a test can keep one
/// handle while the host owns another.
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    values: Arc<Mutex<HashMap<(String, String), String>>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.values
            .lock()
            .get(&(section.to_string(), key.to_string()))
            .cloned()
    }

    fn set_string(&mut self, section: &str, key: &str, value: &str) {
        self.values
            .lock()
            .insert((section.to_string(), key.to_string()), value.to_string());
    }
}

/// Settings kept in a pretty-printed JSON file of the form
/// `{ "section": { "key": "value" } }`.  Changes are held in memory until
/// [`flush`](SettingsStore::flush).
#[derive(Debug)]
pub struct JsonSettingsFile {
    path: PathBuf,
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl JsonSettingsFile {
    /// `<config dir>/ladspa-host/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("ladspa-host").join("config.json"))
    }

    /// Load `path`.  A file that does not exist yet gives an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let sections = match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("settings: {:?} does not exist yet", path);
                BTreeMap::new()
            }
            Err(source) => return Err(HostError::SettingsIo { path, source }),
        };

        Ok(Self { path, sections })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonSettingsFile {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.sections.get(section)?.get(key).cloned()
    }

    fn set_string(&mut self, section: &str, key: &str, value: &str) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
    }

    fn flush(&mut self) -> Result<()> {
        let io_err = |source| HostError::SettingsIo {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_string_pretty(&self.sections)?;
        std::fs::write(&self.path, json).map_err(io_err)?;

        log::debug!("settings: wrote {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_accessors() {
        let mut store = MemorySettings::new();
        store.set_int("ladspa", "plugin_count", 3);
        store.set_string("ladspa", "gain", " 0.25 ");
        store.set_string("ladspa", "junk", "abc");

        assert_eq!(store.get_int("ladspa", "plugin_count"), Some(3));
        assert_eq!(store.get_double("ladspa", "gain"), Some(0.25));
        assert_eq!(store.get_double("ladspa", "junk"), None);
        assert_eq!(store.get_int("other", "plugin_count"), None);
    }

    #[test]
    fn test_defaults_do_not_overwrite() {
        let mut store = MemorySettings::new();
        store.set_string("ladspa", "module_path", "/opt/ladspa");
        store.set_defaults("ladspa", &[("module_path", ""), ("plugin_count", "0")]);

        assert_eq!(
            store.get_string("ladspa", "module_path").as_deref(),
            Some("/opt/ladspa")
        );
        assert_eq!(store.get_int("ladspa", "plugin_count"), Some(0));
    }

    #[test]
    fn test_clones_share_values() {
        let store = MemorySettings::new();
        let mut writer = store.clone();
        writer.set_string("a", "b", "c");
        assert_eq!(store.get_string("a", "b").as_deref(), Some("c"));
    }

    #[test]
    fn test_json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut store = JsonSettingsFile::load(&path).unwrap();
        assert_eq!(store.get_string("ladspa", "plugin_count"), None);
        store.set_int("ladspa", "plugin_count", 2);
        store.set_string("ladspa", "plugin0_controls", "1,0.5");
        store.flush().unwrap();

        let reloaded = JsonSettingsFile::load(&path).unwrap();
        assert_eq!(reloaded.get_int("ladspa", "plugin_count"), Some(2));
        assert_eq!(
            reloaded.get_string("ladspa", "plugin0_controls").as_deref(),
            Some("1,0.5")
        );
    }

    #[test]
    fn test_json_file_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            JsonSettingsFile::load(&path),
            Err(HostError::SettingsFormat(_))
        ));
    }
}
