//! Persistent key-value backends.
//!
//! The store treats persistence as a flat map of string keys to JSON
//! documents, one document per key. Two backends are provided:
//! - `FileStore`: one `<key>.json` file per key in a data directory
//! - `MemoryStore`: an in-process map for tests and throwaway runs

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::Result;

/// Document-level key-value persistence.
///
/// Each `set` replaces the whole value; readers never see a partial write.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;

    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}
