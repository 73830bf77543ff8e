use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::PathBuf;

use pixelbattle_core::ClientStore;

/// Client identity and stats kept in a small JSON file between runs.
pub struct FileStore {
    path: PathBuf,
    values: RefCell<BTreeMap<String, String>>,
}

impl FileStore {
    /// Missing or unreadable files start empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|err| {
                tracing::warn!(%err, path = %path.display(), "ignoring unreadable state file");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self {
            path,
            values: RefCell::new(values),
        }
    }

    fn persist(&self) {
        let text = match serde_json::to_string_pretty(&*self.values.borrow()) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(%err, "failed to encode state file");
                return;
            }
        };
        if let Err(err) = std::fs::write(&self.path, text) {
            tracing::warn!(%err, path = %self.path.display(), "failed to write state file");
        }
    }
}

impl ClientStore for FileStore {
    fn load(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn save(&self, key: &str, value: &str) {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self.persist();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("pixelbattle-{}-{name}.json", uuid::Uuid::new_v4()))
    }

    #[test]
    fn identity_survives_reopen() {
        let path = scratch("identity");
        let first = FileStore::open(&path).client_id();
        FileStore::open(&path).record_pixel_placed();
        let reopened = FileStore::open(&path);
        assert_eq!(reopened.client_id(), first);
        assert_eq!(reopened.pixels_placed(), 1);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn corrupt_file_starts_fresh() {
        let path = scratch("corrupt");
        std::fs::write(&path, "not json").unwrap();
        let store = FileStore::open(&path);
        assert_eq!(store.pixels_placed(), 0);
        assert!(!store.client_id().is_empty());
        let _ = std::fs::remove_file(path);
    }
}
