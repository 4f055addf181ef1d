pub mod json_backend;
pub mod memory;

use crate::errors::Result;

/// Fixed key holding the quote collection.
pub const QUOTES_KEY: &str = "quotes";
/// Fixed key holding the active category filter.
pub const SELECTION_KEY: &str = "selected_category";

/// Abstraction over durable string storage addressed by fixed keys.
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value, or `None` when the key was never written.
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    fn read(&self, key: &str) -> Result<Option<String>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        (**self).write(key, value)
    }
}

pub use json_backend::JsonFileStore;
pub use memory::MemoryStore;
