//! Key-value persistence port.
//!
//! The [`KeyValueStore`] trait is the only persistence seam the core uses.
//! Preferences and click statistics are stored as JSON strings under fixed
//! keys, the same way a browser's local storage would hold them.
//!
//! Implementations must be `Send + Sync` so they can sit behind an `Arc`
//! shared with async request handlers.

pub mod memory;

use anyhow::Result;

pub use memory::MemoryStore;

/// String-to-string persistence.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}
