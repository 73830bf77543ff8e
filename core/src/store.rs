use std::cell::RefCell;
use std::collections::HashMap;

pub const CLIENT_ID_KEY: &str = "pixelBattleClientId";
pub const PIXELS_PLACED_KEY: &str = "pixelsPlaced";

/// Durable key-value storage for the client identity and local stats.
pub trait ClientStore {
    fn load(&self, key: &str) -> Option<String>;
    fn save(&self, key: &str, value: &str);

    /// Stable identity, created on first use.
    fn client_id(&self) -> String {
        if let Some(existing) = self.load(CLIENT_ID_KEY) {
            let trimmed = existing.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
        let created = uuid::Uuid::new_v4().to_string();
        self.save(CLIENT_ID_KEY, &created);
        tracing::info!(client_id = %created, "created client id");
        created
    }

    fn pixels_placed(&self) -> u64 {
        self.load(PIXELS_PLACED_KEY)
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(0)
    }

    fn record_pixel_placed(&self) -> u64 {
        let count = self.pixels_placed().saturating_add(1);
        self.save(PIXELS_PLACED_KEY, &count.to_string());
        count
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClientStore for MemoryStore {
    fn load(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn save(&self, key: &str, value: &str) {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_id_is_created_once() {
        let store = MemoryStore::new();
        let first = store.client_id();
        assert_eq!(first.len(), 36);
        assert_eq!(store.client_id(), first);
    }

    #[test]
    fn existing_client_id_is_kept() {
        let store = MemoryStore::new();
        store.save(CLIENT_ID_KEY, "legacy-id");
        assert_eq!(store.client_id(), "legacy-id");
    }

    #[test]
    fn counter_tolerates_garbage() {
        let store = MemoryStore::new();
        store.save(PIXELS_PLACED_KEY, "NaN");
        assert_eq!(store.pixels_placed(), 0);
        assert_eq!(store.record_pixel_placed(), 1);
        assert_eq!(store.record_pixel_placed(), 2);
    }
}
