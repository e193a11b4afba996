// ── Configuration persistence boundary ──

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::CoreError;

/// Storage for the last-used tunnel configuration text.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// `Ok(None)` when nothing has been saved yet.
    async fn load(&self) -> Result<Option<String>, CoreError>;
    async fn save(&self, text: &str) -> Result<(), CoreError>;
}

/// In-process store, useful for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    text: Mutex<Option<String>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Mutex::new(Some(text.into())),
        }
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn load(&self) -> Result<Option<String>, CoreError> {
        Ok(self.text.lock().await.clone())
    }

    async fn save(&self, text: &str) -> Result<(), CoreError> {
        *self.text.lock().await = Some(text.to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemoryConfigStore::new();
        assert_eq!(store.load().await.ok().flatten(), None);
        store.save("[Interface]").await.ok();
        assert_eq!(store.load().await.ok().flatten().as_deref(), Some("[Interface]"));
    }
}
