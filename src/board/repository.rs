use std::sync::Arc;

use chrono::Utc;

use super::codec::Document;
use super::store::FileStore;
use crate::errors::KanbanResult;

/// A state aggregate as loaded, with the revision it was loaded at.
///
/// `token` is `None` when the file was absent and `state` is the seed.
#[derive(Debug, Clone)]
pub struct Loaded<D> {
    pub state: D,
    pub token: Option<String>,
    /// The file existed but held no content.
    pub blank: bool,
}

impl<D> Loaded<D> {
    /// Whether the backing file needs to be (re)written before it can be trusted.
    pub fn needs_seed(&self) -> bool {
        self.token.is_none() || self.blank
    }
}

/// Loads and saves one document type at a fixed path.
pub struct Repository<D> {
    store: Arc<dyn FileStore>,
    path: String,
    _doc: std::marker::PhantomData<fn() -> D>,
}

impl<D> Clone for Repository<D> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            path: self.path.clone(),
            _doc: std::marker::PhantomData,
        }
    }
}

impl<D: Document> Repository<D> {
    pub fn new(store: Arc<dyn FileStore>, path: impl Into<String>) -> Self {
        Self {
            store,
            path: path.into(),
            _doc: std::marker::PhantomData,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// File name used in commit messages.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    pub async fn load(&self) -> KanbanResult<Loaded<D>> {
        match self.store.read(&self.path).await? {
            Some(file) => {
                let blank = file.content.trim().is_empty();
                Ok(Loaded {
                    state: D::parse(&file.content),
                    token: Some(file.token),
                    blank,
                })
            }
            None => {
                tracing::debug!(kind = D::KIND, path = %self.path, "file absent, using seed state");
                Ok(Loaded {
                    state: D::seed(Utc::now()),
                    token: None,
                    blank: false,
                })
            }
        }
    }

    /// Render `state` and write it over the revision identified by `token`.
    pub async fn save(
        &self,
        state: &D,
        message: &str,
        token: Option<&str>,
    ) -> KanbanResult<String> {
        self.store
            .write(&self.path, &state.render(), message, token)
            .await
    }
}
