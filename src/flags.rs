//! Persisted flag store contract.
//!
//! The scheduler needs exactly one durable fact per context: whether a
//! catch-up pass has been requested. The contract is therefore a minimal
//! keyed flag store (`exists` / `set` / `delete`) with the durable
//! backend supplied by the host. [`MemoryFlagStore`] is the volatile
//! reference implementation used by tests and demos.
//!
//! Flag keys follow the `Analysis.CatchUp.<id>` convention built by
//! [`ContextId::catch_up_key`](crate::context::ContextId::catch_up_key).

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use miette::Diagnostic;
use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::context::ContextId;

/// Minimal persisted flag store.
///
/// Implementations must be safe to call from concurrent walks of
/// *different* contexts; keys never collide across contexts.
#[async_trait]
pub trait FlagStore: Send + Sync + 'static {
    /// Whether the flag is currently set.
    async fn exists(&self, key: &str) -> Result<bool, FlagStoreError>;

    /// Set the flag. Setting an already-set flag is a no-op.
    async fn set(&self, key: &str) -> Result<(), FlagStoreError>;

    /// Delete the flag. Deleting an absent flag is a no-op.
    async fn delete(&self, key: &str) -> Result<(), FlagStoreError>;
}

/// Failure talking to the flag backend.
///
/// Read failures are downgraded by the catch-up switch to "flag absent"
/// (with a warning), so a flaky backend degrades to the cheaper normal
/// branch instead of crashing the walk.
#[derive(Debug, Error, Diagnostic)]
pub enum FlagStoreError {
    /// The backend is unreachable or rejected the request.
    #[error("flag backend unavailable: {0}")]
    #[diagnostic(
        code(millpass::flags::backend),
        help("Check the application-state storage; catch-up requests are kept until deleted.")
    )]
    Backend(String),

    /// The key is not one this store accepts.
    #[error("invalid flag key `{0}`")]
    #[diagnostic(code(millpass::flags::invalid_key))]
    InvalidKey(String),
}

/// Request a catch-up pass for the given context.
///
/// This is the whole of the administrative "turn on catch-up" switch: it
/// writes the persisted flag and nothing else. The next walk for that
/// context takes the catch-up branch and clears the flag once the branch
/// has run to completion.
pub async fn request_catch_up(
    store: &dyn FlagStore,
    context: &ContextId,
) -> Result<(), FlagStoreError> {
    store.set(&context.catch_up_key()).await
}

/// Volatile, in-process flag store.
///
/// Keeps flags in a hash set behind a mutex. Suitable for tests, demos and
/// single-process hosts that do not need catch-up requests to survive a
/// restart.
#[derive(Debug, Default)]
pub struct MemoryFlagStore {
    flags: Mutex<FxHashSet<String>>,
}

impl MemoryFlagStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FxHashSet<String>> {
        self.flags.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl FlagStore for MemoryFlagStore {
    async fn exists(&self, key: &str) -> Result<bool, FlagStoreError> {
        Ok(self.lock().contains(key))
    }

    async fn set(&self, key: &str) -> Result<(), FlagStoreError> {
        self.lock().insert(key.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), FlagStoreError> {
        self.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_exists_delete_round_trip() {
        let store = MemoryFlagStore::new();
        let key = ContextId::Machine(3).catch_up_key();
        assert!(!store.exists(&key).await.unwrap());

        request_catch_up(&store, &ContextId::Machine(3)).await.unwrap();
        assert!(store.exists(&key).await.unwrap());

        store.delete(&key).await.unwrap();
        assert!(!store.exists(&key).await.unwrap());
    }

    #[tokio::test]
    async fn delete_of_absent_flag_is_noop() {
        let store = MemoryFlagStore::new();
        store.delete("Analysis.CatchUp.g").await.unwrap();
        assert!(!store.exists("Analysis.CatchUp.g").await.unwrap());
    }
}
