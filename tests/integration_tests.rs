//! Integration tests for milo-kanban
//!
//! CLI smoke tests run against the in-memory store, and the board scenarios
//! drive `KanbanService` end to end.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// Helper to create a milo-kanban Command in an empty directory so no
/// `.env` file is picked up.
fn kanban(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("milo-kanban");
    cmd.current_dir(dir.path())
        .env_remove("GITHUB_PAT")
        .env_remove("GITHUB_OWNER")
        .env_remove("GITHUB_REPO")
        .env_remove("KANBAN_LOG");
    cmd
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_help() {
        let dir = TempDir::new().unwrap();
        kanban(&dir)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("serve"))
            .stdout(predicate::str::contains("show"));
    }

    #[test]
    fn test_version() {
        let dir = TempDir::new().unwrap();
        kanban(&dir)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("milo-kanban"));
    }

    #[test]
    fn test_show_in_memory_prints_seed_boards() {
        let dir = TempDir::new().unwrap();
        kanban(&dir)
            .args(["show", "--in-memory"])
            .assert()
            .success()
            .stdout(predicate::str::contains("MILO Kanban (doing 3/3)"))
            .stdout(predicate::str::contains("MOUSSA Kanban (doing 0/3)"));
    }

    #[test]
    fn test_show_json_is_a_snapshot() {
        let dir = TempDir::new().unwrap();
        let output = kanban(&dir)
            .args(["show", "--json", "--in-memory"])
            .output()
            .unwrap();
        assert!(output.status.success());
        let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(value["kanban"]["wipLimit"], 3);
        assert_eq!(value["kanban"]["tasks"].as_array().unwrap().len(), 7);
        assert_eq!(value["accomplishments"]["entries"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_init_in_memory() {
        let dir = TempDir::new().unwrap();
        kanban(&dir)
            .args(["init", "--in-memory"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "Initialized kanban (7 tasks) and accomplishments log (1 entries)",
            ));
    }

    #[test]
    fn test_show_without_github_settings_fails() {
        let dir = TempDir::new().unwrap();
        kanban(&dir)
            .arg("show")
            .assert()
            .failure()
            .stderr(predicate::str::contains("GITHUB_PAT"));
    }
}

// =============================================================================
// Board Scenarios
// =============================================================================

mod board_scenarios {
    use std::sync::Arc;

    use milo_kanban::board::codec::Document;
    use milo_kanban::board::models::{
        AccomplishmentsState, Board, KanbanState, Lane, NewTask, Owner, Priority, StatusChange,
        TaskStatus,
    };
    use milo_kanban::board::service::KanbanService;
    use milo_kanban::board::store::MemoryStore;
    use milo_kanban::config::DocumentPaths;
    use milo_kanban::errors::KanbanError;

    fn paths() -> DocumentPaths {
        DocumentPaths {
            kanban: "kanban.md".into(),
            accomplishments: "accomplishments.md".into(),
        }
    }

    fn service() -> (Arc<MemoryStore>, KanbanService) {
        let store = Arc::new(MemoryStore::new());
        let service = KanbanService::new(store.clone(), &paths());
        (store, service)
    }

    fn task(title: &str, board: Board) -> NewTask {
        NewTask {
            title: title.into(),
            owner: Owner::Milo,
            lane: Lane::Admin,
            priority: Priority::P1,
            due: "Today".into(),
            board,
        }
    }

    fn change(id: &str, status: TaskStatus) -> StatusChange {
        StatusChange {
            id: id.into(),
            status,
            result: None,
            output_path: None,
        }
    }

    #[tokio::test]
    async fn test_bootstrap_writes_both_documents_once() {
        let (store, service) = service();
        service.ensure_bootstrap().await.unwrap();
        service.ensure_bootstrap().await.unwrap();

        assert_eq!(store.revision("kanban.md"), Some(1));
        assert_eq!(store.revision("accomplishments.md"), Some(1));
        let kanban = KanbanState::parse(&store.content("kanban.md").unwrap());
        assert_eq!(kanban.tasks.len(), 7);
    }

    #[tokio::test]
    async fn test_ids_are_sequential_per_board() {
        let (_store, service) = service();
        service.ensure_bootstrap().await.unwrap();

        let a = service.create_task(task("one", Board::Moussa)).await.unwrap();
        let b = service.create_task(task("two", Board::Moussa)).await.unwrap();
        let c = service.create_task(task("three", Board::Milo)).await.unwrap();

        assert_eq!(a.id, "U-001");
        assert_eq!(b.id, "U-002");
        assert_eq!(c.id, "M-008");
        assert_eq!(a.status, TaskStatus::Backlog);
    }

    #[tokio::test]
    async fn test_full_doing_column_rejects_fourth_task() {
        let (store, service) = service();
        service.ensure_bootstrap().await.unwrap();

        // The seed already has three MILO tasks in Doing.
        let err = service
            .update_task_status(change("M-002", TaskStatus::Doing))
            .await
            .unwrap_err();
        assert!(matches!(err, KanbanError::WipLimitReached { board: Board::Milo }));
        assert_eq!(store.revision("kanban.md"), Some(1));

        // The other board has its own limit.
        let moussa = service.create_task(task("elsewhere", Board::Moussa)).await.unwrap();
        service
            .update_task_status(change(&moussa.id, TaskStatus::Doing))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_done_twice_is_recorded_once() {
        let (store, service) = service();
        service.ensure_bootstrap().await.unwrap();

        let done = StatusChange {
            id: "M-001".into(),
            status: TaskStatus::Done,
            result: None,
            output_path: Some("notes/outline.md".into()),
        };
        let first = service.update_task_status(done.clone()).await.unwrap();
        assert_eq!(first.result.as_deref(), Some("Completed"));
        service.update_task_status(done).await.unwrap();

        let log = AccomplishmentsState::parse(&store.content("accomplishments.md").unwrap());
        assert_eq!(log.entries.len(), 1);
        assert_eq!(log.entries[0].completed_ids, vec!["M-001".to_string()]);
        assert_eq!(log.entries[0].outputs, vec!["notes/outline.md".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_task_is_not_found() {
        let (_store, service) = service();
        service.ensure_bootstrap().await.unwrap();

        let err = service
            .update_task_status(change("M-999", TaskStatus::Next))
            .await
            .unwrap_err();
        assert!(matches!(err, KanbanError::TaskNotFound { .. }));
    }

    #[tokio::test]
    async fn test_concurrent_writer_causes_conflict() {
        let (store, service) = service();
        service.ensure_bootstrap().await.unwrap();

        // Another client edits the board between our read and write.
        let loaded = service.load_state().await.unwrap().0;
        let mut theirs = loaded.state.clone();
        theirs.wip_limit = 5;
        use milo_kanban::board::store::FileStore;
        store
            .write("kanban.md", &theirs.render(), "external edit", loaded.token.as_deref())
            .await
            .unwrap();
        let err = store
            .write("kanban.md", &loaded.state.render(), "stale edit", loaded.token.as_deref())
            .await
            .unwrap_err();
        assert!(matches!(err, KanbanError::Conflict { .. }));
    }
}
