//! CLI command implementations.
//!
//! | Module   | Commands handled |
//! |----------|------------------|
//! | `serve`  | `Serve`          |
//! | `board`  | `Init`, `Show`   |

pub mod board;
pub mod serve;

pub use board::{cmd_init, cmd_show};
pub use serve::cmd_serve;

use std::sync::Arc;

use anyhow::{Context, Result};
use milo_kanban::board::github::GitHubStore;
use milo_kanban::board::service::KanbanService;
use milo_kanban::board::store::{FileStore, MemoryStore};
use milo_kanban::config::{DocumentPaths, GitHubSettings};

use crate::StoreArgs;

/// Build the service over the store selected on the command line.
pub fn build_service(args: &StoreArgs) -> Result<KanbanService> {
    let paths = DocumentPaths::from_env();
    let store: Arc<dyn FileStore> = if args.in_memory {
        tracing::warn!("using in-memory store; changes are lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        let settings = GitHubSettings::from_env()
            .context("GitHub backend is not configured (or pass --in-memory)")?;
        tracing::info!(
            owner = %settings.owner,
            repo = %settings.repo,
            branch = %settings.branch,
            "using GitHub store"
        );
        Arc::new(GitHubStore::new(settings))
    };
    Ok(KanbanService::new(store, &paths))
}
