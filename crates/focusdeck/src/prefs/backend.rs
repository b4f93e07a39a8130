use crate::config::FocusConfig;
use crate::error::{FocusError, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// String slots addressed by key, like a browser's local storage.
///
/// All methods take `&self`; implementations handle their own mutability.
pub trait KvBackend {
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// MUST replace the whole value or nothing (write to tmp then rename).
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Returns whether the key existed.
    fn remove(&self, key: &str) -> Result<bool>;
}

/// In-memory slots for tests.
#[derive(Debug, Default)]
pub struct MemKv {
    slots: RefCell<HashMap<String, String>>,
}

impl MemKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvBackend for MemKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.slots
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.slots.borrow_mut().remove(key).is_some())
    }
}

/// One `<key>.json` file per slot under `root`.
#[derive(Debug, Clone)]
pub struct FsKv {
    root: PathBuf,
}

impl FsKv {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Slots under the configured storage directory.
    pub fn from_config(config: &FocusConfig) -> Result<Self> {
        config
            .storage_dir()
            .map(Self::new)
            .ok_or_else(|| FocusError::Store("No storage directory available".to_string()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slot_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(FocusError::Validation(format!("Invalid storage key: {key:?}")));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl KvBackend for FsKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.slot_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.slot_path(key)?;
        if !self.root.exists() {
            fs::create_dir_all(&self.root)?;
        }
        let tmp_path = self.root.join(format!(".{key}-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp_path, value)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let path = self.slot_path(key)?;
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_slots_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let kv = FsKv::new(dir.path().join("nested"));
        assert_eq!(kv.get("prefs").unwrap(), None);

        kv.set("prefs", "{\"theme\":\"dark\"}").unwrap();
        kv.set("prefs", "{\"theme\":\"light\"}").unwrap();
        assert_eq!(kv.get("prefs").unwrap().as_deref(), Some("{\"theme\":\"light\"}"));

        let leftovers = fs::read_dir(kv.root())
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .map(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
                    .unwrap_or(false)
            })
            .count();
        assert_eq!(leftovers, 0);

        assert!(kv.remove("prefs").unwrap());
        assert!(!kv.remove("prefs").unwrap());
    }

    #[test]
    fn keys_cannot_escape_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let kv = FsKv::new(dir.path());
        assert!(matches!(kv.set("../evil", "x"), Err(FocusError::Validation(_))));
        assert!(kv.get("").is_err());
    }

    #[test]
    fn mem_slots_behave_like_fs() {
        let kv = MemKv::new();
        kv.set("a", "1").unwrap();
        assert_eq!(kv.get("a").unwrap().as_deref(), Some("1"));
        assert!(kv.remove("a").unwrap());
        assert_eq!(kv.get("a").unwrap(), None);
    }
}
