use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::{KanbanError, KanbanResult};

/// A file fetched from the remote store together with its revision token.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteFile {
    pub content: String,
    pub token: String,
}

/// Abstraction over a versioned remote file store.
/// Real implementation: `GitHubStore`. In-process: `MemoryStore`.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Fetch a file. A missing file is `Ok(None)`, not an error.
    async fn read(&self, path: &str) -> KanbanResult<Option<RemoteFile>>;

    /// Create (`token` is `None`) or update a file and return the new token.
    ///
    /// An update whose token no longer matches the stored revision fails with
    /// `KanbanError::Conflict`, as does a create over an existing file.
    async fn write(
        &self,
        path: &str,
        content: &str,
        message: &str,
        token: Option<&str>,
    ) -> KanbanResult<String>;
}

#[derive(Debug, Clone)]
struct StoredFile {
    content: String,
    revision: u64,
    message: String,
}

/// In-process store with per-path revision counters.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: Mutex<HashMap<String, StoredFile>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file directly, bypassing commit semantics.
    pub fn insert(&self, path: &str, content: impl Into<String>) -> KanbanResult<String> {
        let mut files = self.lock()?;
        let revision = files.get(path).map_or(1, |f| f.revision + 1);
        files.insert(
            path.to_string(),
            StoredFile {
                content: content.into(),
                revision,
                message: String::new(),
            },
        );
        Ok(revision.to_string())
    }

    /// Current content of `path`, if present.
    pub fn content(&self, path: &str) -> Option<String> {
        self.lock().ok()?.get(path).map(|f| f.content.clone())
    }

    /// Message of the last write to `path`.
    pub fn last_message(&self, path: &str) -> Option<String> {
        self.lock().ok()?.get(path).map(|f| f.message.clone())
    }

    /// Number of writes `path` has seen, including the initial one.
    pub fn revision(&self, path: &str) -> Option<u64> {
        self.lock().ok()?.get(path).map(|f| f.revision)
    }

    fn lock(&self) -> KanbanResult<std::sync::MutexGuard<'_, HashMap<String, StoredFile>>> {
        self.files
            .lock()
            .map_err(|_| KanbanError::Transport("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl FileStore for MemoryStore {
    async fn read(&self, path: &str) -> KanbanResult<Option<RemoteFile>> {
        Ok(self.lock()?.get(path).map(|f| RemoteFile {
            content: f.content.clone(),
            token: f.revision.to_string(),
        }))
    }

    async fn write(
        &self,
        path: &str,
        content: &str,
        message: &str,
        token: Option<&str>,
    ) -> KanbanResult<String> {
        let mut files = self.lock()?;
        let current = files.get(path).map(|f| f.revision);
        let next = match (current, token) {
            (None, None) => 1,
            (Some(rev), Some(t)) if rev.to_string() == t => rev + 1,
            _ => {
                return Err(KanbanError::Conflict {
                    path: path.to_string(),
                });
            }
        };
        files.insert(
            path.to_string(),
            StoredFile {
                content: content.to_string(),
                revision: next,
                message: message.to_string(),
            },
        );
        Ok(next.to_string())
    }
}
