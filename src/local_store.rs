use gloo::storage::{LocalStorage, Storage};
use pixelbattle_core::ClientStore;

/// Raw `localStorage` strings, so existing `pixelBattleClientId` and
/// `pixelsPlaced` entries are picked up as-is.
pub(crate) struct LocalStore;

impl ClientStore for LocalStore {
    fn load(&self, key: &str) -> Option<String> {
        LocalStorage::raw().get_item(key).ok().flatten()
    }

    fn save(&self, key: &str, value: &str) {
        if let Err(err) = LocalStorage::raw().set_item(key, value) {
            tracing::warn!(key, ?err, "localStorage write failed");
        }
    }
}
