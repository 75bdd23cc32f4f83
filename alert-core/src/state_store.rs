use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Flat JSON file mapping alert key to active-flag, so dedup state survives
/// restarts. Deleting the file is a supported operator action to force
/// re-notification of an ongoing condition.
#[derive(Clone)]
pub struct StateStore {
    path: Arc<PathBuf>,
}

impl StateStore {
    pub fn open(path: &str) -> Result<Self, String> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
            }
        }
        Ok(StateStore {
            path: Arc::new(PathBuf::from(path)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or corrupt files recover to an empty map, never an error.
    /// Unknown or non-boolean entries are ignored.
    pub fn load(&self) -> BTreeMap<String, bool> {
        let raw = match std::fs::read_to_string(&*self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(err) => {
                tracing::warn!("could not read alert state {}: {err}", self.path.display());
                return BTreeMap::new();
            }
        };

        let value: serde_json::Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(
                    "corrupt alert state {}, starting empty: {err}",
                    self.path.display()
                );
                return BTreeMap::new();
            }
        };

        let Some(object) = value.as_object() else {
            tracing::warn!(
                "alert state {} is not a JSON object, starting empty",
                self.path.display()
            );
            return BTreeMap::new();
        };

        object
            .iter()
            .filter_map(|(key, value)| value.as_bool().map(|flag| (key.clone(), flag)))
            .collect()
    }

    /// Replace-on-write so a concurrent reader never observes a partial file.
    pub fn save(&self, state: &BTreeMap<String, bool>) -> Result<(), String> {
        let raw = serde_json::to_string_pretty(state).map_err(|e| e.to_string())?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, raw).map_err(|e| e.to_string())?;
        std::fs::rename(&tmp, &*self.path).map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn reset(&self) -> Result<(), String> {
        match std::fs::remove_file(&*self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.to_string()),
        }
    }
}
