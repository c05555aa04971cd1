//! Kanban boards and the accomplishments log, persisted as markdown.
//!
//! ## Overview
//!
//! Two boards (`milo`, `moussa`) share one kanban document; completed work is
//! rolled up per day into a second document. Both documents live in a GitHub
//! repository and are read and rewritten in full on every request.
//!
//! ## Module Map
//!
//! ```text
//! ┌──────────┐   HTTP   ┌──────────────────────────────────────────────────┐
//! │  Client  │ ───────> │  server.rs  (axum Router, ServerConfig)          │
//! │ (ui/*.js)│ <─────── │    └─ api.rs  (route handlers, validation)       │
//! └──────────┘          │         │                                        │
//!                       │         │ KanbanService::update_task_status()    │
//!                       │         v                                        │
//!                       │  service.rs  (pure rules + load/mutate/save)     │
//!                       │         │                                        │
//!                       │         │ Repository<D>::load() / save()         │
//!                       │         v                                        │
//!                       │  repository.rs ── codec.rs (markdown + JSON)     │
//!                       │         │                                        │
//!                       │         │ FileStore::read() / write()            │
//!                       │         v                                        │
//!                       │  store.rs (MemoryStore)   github.rs (GitHubStore)│
//!                       └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Supporting Modules
//!
//! | Module     | Responsibility                                            |
//! |------------|-----------------------------------------------------------|
//! | `models`   | `Task`, `KanbanState`, `AccomplishmentsState`, enums      |
//! | `embedded` | Statically embeds the browser UI (`rust-embed`)           |
//!
//! ## Typical Request Flow (move task → "done")
//!
//! 1. `PATCH /tasks/M-004` → `api::update_task()` validates the status.
//! 2. `KanbanService` loads both documents with their blob SHAs.
//! 3. `apply_status_change()` checks the WIP limit (only when entering
//!    doing), stamps the task, defaults its result to `Completed`, and adds
//!    the ID and output path to today's accomplishment entry.
//! 4. Both documents are re-rendered and written concurrently with the SHAs
//!    from step 2; a SHA that went stale in between fails the request with
//!    409 instead of overwriting someone else's edit.

pub mod api;
pub mod codec;
pub mod embedded;
pub mod github;
pub mod models;
pub mod repository;
pub mod server;
pub mod service;
pub mod store;
