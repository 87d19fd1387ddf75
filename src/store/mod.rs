//! Local clipboard store.
//!
//! The replicated value mirrors every change into a `LocalStore`. Two
//! backends: the OS clipboard (`SystemStore`) and an in-process buffer
//! (`MemoryStore`) for headless nodes and tests.

pub mod system;

use crate::error::StoreError;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub use system::SystemStore;

/// Get/set access to a text clipboard.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Current clipboard content
    async fn get(&self) -> Result<String, StoreError>;

    /// Replace clipboard content
    async fn set(&self, text: &str) -> Result<(), StoreError>;
}

/// Store backend selected in config
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// OS clipboard via platform helper programs
    #[default]
    System,
    /// Process-local buffer, discarded on exit
    Memory,
}

/// Build the store for `kind`.
pub fn build_store(kind: StoreKind) -> Result<Arc<dyn LocalStore>, StoreError> {
    match kind {
        StoreKind::System => Ok(Arc::new(SystemStore::detect()?)),
        StoreKind::Memory => Ok(Arc::new(MemoryStore::default())),
    }
}

/// In-memory clipboard.
///
/// `set_failing(true)` makes every call return `StoreError::Unavailable`
/// while leaving the buffered content untouched.
#[derive(Debug, Default)]
pub struct MemoryStore {
    content: Mutex<String>,
    failing: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            content: Mutex::new(initial.into()),
            failing: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Content as last successfully set
    pub fn contents(&self) -> String {
        self.lock().clone()
    }

    /// Number of successful `set` calls
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, String> {
        // A poisoned buffer still holds a complete String
        self.content.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable(
                "memory store is in failing mode".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LocalStore for MemoryStore {
    async fn get(&self) -> Result<String, StoreError> {
        self.check()?;
        Ok(self.contents())
    }

    async fn set(&self, text: &str) -> Result<(), StoreError> {
        self.check()?;
        *self.lock() = text.to_string();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
