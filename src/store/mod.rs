// Store module - where exercise test scripts come from

pub mod directory;
pub mod error;
pub mod memory;

pub use directory::DirectoryStore;
pub use error::{Result, StoreError};
pub use memory::MemoryStore;

use async_trait::async_trait;

/// Lookup of exercise test scripts by exercise id
#[async_trait]
pub trait TestScriptSource: Send + Sync {
    /// Test script source for `exercise_id`, or `None` if there is none
    async fn test_script(&self, exercise_id: &str) -> Result<Option<String>>;

    /// All exercise ids this source can serve, sorted
    async fn exercise_ids(&self) -> Result<Vec<String>>;
}
