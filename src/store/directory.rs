// Directory-backed test script store
//
// Layout: <root>/<exercise_id>/test.py

use crate::store::{Result, StoreError, TestScriptSource};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Test script file name inside an exercise directory
pub const TEST_FILE: &str = "test.py";

/// Reads exercise test scripts from disk
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn script_path(&self, exercise_id: &str) -> PathBuf {
        self.root.join(exercise_id).join(TEST_FILE)
    }
}

/// Exercise ids are plain directory names: letters, digits, `_` and `-`
pub fn is_valid_exercise_id(exercise_id: &str) -> bool {
    !exercise_id.is_empty()
        && exercise_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[async_trait]
impl TestScriptSource for DirectoryStore {
    async fn test_script(&self, exercise_id: &str) -> Result<Option<String>> {
        if !is_valid_exercise_id(exercise_id) {
            warn!(exercise_id = %exercise_id, "rejecting malformed exercise id");
            return Ok(None);
        }

        let path = self.script_path(exercise_id);
        match tokio::fs::read_to_string(&path).await {
            Ok(script) => {
                debug!(path = %path.display(), bytes = script.len(), "loaded test script");
                Ok(Some(script))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "test script not found");
                Ok(None)
            }
            Err(source) => Err(StoreError::Read { path, source }),
        }
    }

    async fn exercise_ids(&self) -> Result<Vec<String>> {
        let list_err = |source| StoreError::List {
            path: self.root.clone(),
            source,
        };

        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(list_err(e)),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(list_err)? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if is_valid_exercise_id(&name)
                && tokio::fs::try_exists(entry.path().join(TEST_FILE))
                    .await
                    .unwrap_or(false)
            {
                ids.push(name);
            }
        }
        ids.sort();

        debug!(root = %self.root.display(), count = ids.len(), "listed exercises");
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exercise_id_validation() {
        assert!(is_valid_exercise_id("E1_tip_calc"));
        assert!(is_valid_exercise_id("e-2"));
        assert!(!is_valid_exercise_id(""));
        assert!(!is_valid_exercise_id("../etc"));
        assert!(!is_valid_exercise_id("a/b"));
        assert!(!is_valid_exercise_id("E1 tip"));
    }

    #[tokio::test]
    async fn test_reads_and_lists() {
        let root = tempfile::tempdir().unwrap();
        for (id, script) in [("E1_tip_calc", "print('OK')\n"), ("E0_greet", "pass\n")] {
            std::fs::create_dir_all(root.path().join(id)).unwrap();
            std::fs::write(root.path().join(id).join(TEST_FILE), script).unwrap();
        }
        std::fs::create_dir_all(root.path().join("E9_no_tests")).unwrap();
        std::fs::write(root.path().join("notes.txt"), "x").unwrap();

        let store = DirectoryStore::new(root.path());
        assert_eq!(
            store.test_script("E1_tip_calc").await.unwrap().as_deref(),
            Some("print('OK')\n")
        );
        assert_eq!(store.test_script("E9_no_tests").await.unwrap(), None);
        assert_eq!(store.test_script("../E1_tip_calc").await.unwrap(), None);
        assert_eq!(
            store.exercise_ids().await.unwrap(),
            vec!["E0_greet".to_string(), "E1_tip_calc".to_string()]
        );
    }

    #[tokio::test]
    async fn test_missing_root_lists_nothing() {
        let store = DirectoryStore::new("/nonexistent/pyrunner/exercises");
        assert!(store.exercise_ids().await.unwrap().is_empty());
        assert_eq!(store.test_script("E1").await.unwrap(), None);
    }
}
