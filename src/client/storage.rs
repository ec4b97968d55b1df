use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::ClientError;

/// Name the upvoted set is stored under.
pub const UPVOTED_KEY: &str = "upvotedIdeas";

/// Where a client keeps the ids it has upvoted.
pub trait UpvoteStorage: Send + Sync {
    fn load(&self) -> Result<Vec<String>, ClientError>;
    fn save(&self, ids: &[String]) -> Result<(), ClientError>;
}

/// JSON array of ids in `<dir>/upvotedIdeas.json`.
pub struct FileUpvoteStorage {
    path: PathBuf,
}

impl FileUpvoteStorage {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{UPVOTED_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl UpvoteStorage for FileUpvoteStorage {
    fn load(&self) -> Result<Vec<String>, ClientError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, ids: &[String]) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string(ids)?)?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryUpvoteStorage {
    ids: Mutex<Vec<String>>,
}

impl MemoryUpvoteStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids(ids: Vec<String>) -> Self {
        Self {
            ids: Mutex::new(ids),
        }
    }
}

impl UpvoteStorage for MemoryUpvoteStorage {
    fn load(&self) -> Result<Vec<String>, ClientError> {
        Ok(self.ids.lock().map(|ids| ids.clone()).unwrap_or_default())
    }

    fn save(&self, ids: &[String]) -> Result<(), ClientError> {
        if let Ok(mut stored) = self.ids.lock() {
            *stored = ids.to_vec();
        }
        Ok(())
    }
}
