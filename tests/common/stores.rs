//! Flag stores with scriptable failures.

use async_trait::async_trait;

use millpass::flags::{FlagStore, FlagStoreError, MemoryFlagStore};

/// Wraps a [`MemoryFlagStore`] and fails selected calls.
#[derive(Default)]
pub struct FlakyFlagStore {
    inner: MemoryFlagStore,
    fail_exists: bool,
    fail_delete: bool,
}

impl FlakyFlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_exists(mut self) -> Self {
        self.fail_exists = true;
        self
    }

    pub fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    pub fn inner(&self) -> &MemoryFlagStore {
        &self.inner
    }
}

#[async_trait]
impl FlagStore for FlakyFlagStore {
    async fn exists(&self, key: &str) -> Result<bool, FlagStoreError> {
        if self.fail_exists {
            return Err(FlagStoreError::Backend("scripted exists failure".into()));
        }
        self.inner.exists(key).await
    }

    async fn set(&self, key: &str) -> Result<(), FlagStoreError> {
        self.inner.set(key).await
    }

    async fn delete(&self, key: &str) -> Result<(), FlagStoreError> {
        if self.fail_delete {
            return Err(FlagStoreError::Backend("scripted delete failure".into()));
        }
        self.inner.delete(key).await
    }
}
