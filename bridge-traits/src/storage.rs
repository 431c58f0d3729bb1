//! Durable key-value storage backing the content cache.

use async_trait::async_trait;

use crate::error::Result;

/// String-to-string store that survives restarts.
///
/// Hosts map it onto whatever the platform offers (UserDefaults or a file on
/// iOS, DataStore on Android, SQLite on desktop). The cache writes JSON
/// documents under keys like `surahList` or `tafsir_36`; the store treats
/// them as opaque text.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// `Ok(None)` when nothing is stored under `key`.
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Replaces any previous value. Must be durable once it returns `Ok`.
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// No-op when absent.
    async fn remove_item(&self, key: &str) -> Result<()>;

    async fn has_key(&self, key: &str) -> Result<bool> {
        Ok(self.get_item(key).await?.is_some())
    }

    async fn list_keys(&self) -> Result<Vec<String>>;

    async fn clear_all(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MapStore {
        items: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl KeyValueStore for MapStore {
        async fn get_item(&self, key: &str) -> Result<Option<String>> {
            Ok(self.items.lock().unwrap().get(key).cloned())
        }

        async fn set_item(&self, key: &str, value: &str) -> Result<()> {
            self.items
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn remove_item(&self, key: &str) -> Result<()> {
            self.items.lock().unwrap().remove(key);
            Ok(())
        }

        async fn list_keys(&self) -> Result<Vec<String>> {
            Ok(self.items.lock().unwrap().keys().cloned().collect())
        }

        async fn clear_all(&self) -> Result<()> {
            self.items.lock().unwrap().clear();
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_has_key_default_uses_get_item() {
        let store = MapStore::default();
        assert!(!store.has_key("surahList").await.unwrap());

        store.set_item("surahList", "[]").await.unwrap();
        assert!(store.has_key("surahList").await.unwrap());

        store.remove_item("surahList").await.unwrap();
        assert!(!store.has_key("surahList").await.unwrap());
    }
}
