// In-memory test script store

use crate::store::{Result, TestScriptSource};
use async_trait::async_trait;
use std::collections::HashMap;

/// Test scripts held in a map, keyed by exercise id
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    scripts: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, exercise_id: impl Into<String>, test_script: impl Into<String>) {
        self.scripts.insert(exercise_id.into(), test_script.into());
    }

    pub fn with(mut self, exercise_id: impl Into<String>, test_script: impl Into<String>) -> Self {
        self.insert(exercise_id, test_script);
        self
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            scripts: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

#[async_trait]
impl TestScriptSource for MemoryStore {
    async fn test_script(&self, exercise_id: &str) -> Result<Option<String>> {
        Ok(self.scripts.get(exercise_id).cloned())
    }

    async fn exercise_ids(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.scripts.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
