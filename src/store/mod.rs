pub mod sqlite;

use crate::app::Result;

pub use sqlite::SqliteStore;

/// Local persistent key-value storage.
pub trait Store {
    fn get_value(&self, key: &str) -> Result<Option<String>>;
    fn set_value(&self, key: &str, value: &str) -> Result<()>;
    /// Write several keys atomically.
    fn set_values(&self, entries: &[(&str, &str)]) -> Result<()>;
    fn delete_value(&self, key: &str) -> Result<()>;
}
