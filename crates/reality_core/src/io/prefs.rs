//! Key/value store for UI and debug preferences.
//!
//! Narrative state is never written here.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Preferences {
    path: Option<PathBuf>,
    values: BTreeMap<String, Value>,
}

impl Preferences {
    /// In-memory store that is never persisted.
    pub fn ephemeral() -> Self {
        Self::default()
    }

    /// Load `path`, or start empty when the file does not exist yet.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        let values = if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("failed to open preferences {:?}", path))?;
            serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("invalid preferences json in {:?}", path))?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path: Some(path.to_path_buf()),
            values,
        })
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<()> {
        let value = serde_json::to_value(value)
            .with_context(|| format!("preference {key:?} is not serializable"))?;
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Write the store back to its file. Ephemeral stores do nothing.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {:?}", parent))?;
        }
        let file =
            File::create(path).with_context(|| format!("failed to create {:?}", path))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.values)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("reality_core_prefs_{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn typed_get_and_set() {
        let mut prefs = Preferences::ephemeral();
        prefs.set("fps", 30u32).expect("set fps");
        prefs.set("autopilot", true).expect("set autopilot");
        assert_eq!(prefs.get::<u32>("fps"), Some(30));
        assert_eq!(prefs.get::<bool>("autopilot"), Some(true));
        assert_eq!(prefs.get::<String>("fps"), None);
        assert!(prefs.remove("fps"));
        assert_eq!(prefs.len(), 1);
        prefs.save().expect("ephemeral save is a no-op");
    }

    #[test]
    fn persists_between_loads() {
        let path = scratch_path("roundtrip.json");
        let _ = fs::remove_file(&path);

        let mut prefs = Preferences::load_or_default(&path).expect("missing file is empty");
        assert!(prefs.is_empty());
        prefs.set("debug_panel", "open").expect("set");
        prefs.save().expect("save");

        let reloaded = Preferences::load_or_default(&path).expect("reload");
        assert_eq!(reloaded.get::<String>("debug_panel").as_deref(), Some("open"));
        let _ = fs::remove_file(&path);
    }
}
