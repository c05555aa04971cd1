//! Board mutations: task creation, status moves and bootstrap.
//!
//! Every operation loads both documents, mutates them in memory with the
//! pure functions below, and writes whole documents back with the tokens
//! captured at load time. Nothing is cached between calls.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::models::{
    AccomplishmentEntry, AccomplishmentsState, Board, KanbanState, NewTask, StatusChange, Task,
    TaskStatus,
};
use super::repository::{Loaded, Repository};
use super::store::FileStore;
use crate::config::DocumentPaths;
use crate::errors::{KanbanError, KanbanResult};
use crate::util::{iso_date, iso_timestamp, non_blank};

/// Trailer on every commit written by this service.
const COMMIT_SOURCE: &str = "via milo-kanban-ui";

/// Result recorded for a task moved to done without an explicit one.
pub const DEFAULT_RESULT: &str = "Completed";

/// Both documents, as returned by `GET /state`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BoardSnapshot {
    pub kanban: KanbanState,
    pub accomplishments: AccomplishmentsState,
}

// ── Pure mutation rules ───────────────────────────────────────────────

/// Highest numeric suffix among `board`'s IDs plus one, padded to three digits.
///
/// Fails once the suffix space is exhausted, so IDs never wrap.
pub fn next_task_id(tasks: &[Task], board: Board) -> KanbanResult<String> {
    let prefix = format!("{}-", board.prefix());
    let max = tasks
        .iter()
        .filter_map(|t| t.id.strip_prefix(&prefix))
        .filter_map(|suffix| suffix.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    let next = max.checked_add(1).ok_or_else(|| {
        KanbanError::Validation(format!("No task IDs left on {}.", board.label()))
    })?;
    Ok(format!("{}{:03}", prefix, next))
}

/// Reject a move into doing when `board` already holds `wip_limit` doing
/// tasks, not counting `moving_id`.
pub fn enforce_wip_limit(
    state: &KanbanState,
    board: Board,
    moving_id: Option<&str>,
) -> KanbanResult<()> {
    let doing = state
        .tasks
        .iter()
        .filter(|t| t.board == board && t.status == TaskStatus::Doing)
        .filter(|t| moving_id != Some(t.id.as_str()))
        .count();
    if doing >= state.wip_limit as usize {
        return Err(KanbanError::WipLimitReached { board });
    }
    Ok(())
}

/// Append a backlog task built from `input` and return it.
pub fn add_task(
    state: &mut KanbanState,
    input: NewTask,
    now: DateTime<Utc>,
) -> KanbanResult<Task> {
    let timestamp = iso_timestamp(now);
    let task = Task {
        id: next_task_id(&state.tasks, input.board)?,
        title: input.title.trim().to_string(),
        owner: input.owner,
        lane: input.lane,
        priority: input.priority,
        due: non_blank(Some(&input.due)).unwrap_or_else(|| "TBD".to_string()),
        board: input.board,
        status: TaskStatus::Backlog,
        result: None,
        output_path: None,
        updated_at: timestamp.clone(),
    };
    state.tasks.push(task.clone());
    state.last_updated = timestamp;
    Ok(task)
}

/// The entry for `date`, inserted at the front of the log if missing.
pub fn upsert_entry<'a>(
    log: &'a mut AccomplishmentsState,
    date: &str,
) -> &'a mut AccomplishmentEntry {
    let index = match log.entries.iter().position(|e| e.date == date) {
        Some(index) => index,
        None => {
            log.entries.insert(0, AccomplishmentEntry::empty(date));
            0
        }
    };
    &mut log.entries[index]
}

fn push_unique(items: &mut Vec<String>, value: &str) {
    if !items.iter().any(|i| i == value) {
        items.push(value.to_string());
    }
}

/// Apply `change` to the board, recording done tasks in today's log entry.
///
/// Fails without touching either aggregate when the task is unknown or the
/// move would exceed the WIP limit.
pub fn apply_status_change(
    board: &mut KanbanState,
    log: &mut AccomplishmentsState,
    change: &StatusChange,
    now: DateTime<Utc>,
) -> KanbanResult<Task> {
    let index = board
        .tasks
        .iter()
        .position(|t| t.id == change.id)
        .ok_or_else(|| KanbanError::TaskNotFound {
            id: change.id.clone(),
        })?;

    let current = &board.tasks[index];
    if change.status == TaskStatus::Doing && current.status != TaskStatus::Doing {
        enforce_wip_limit(board, current.board, Some(&current.id))?;
    }

    let timestamp = iso_timestamp(now);
    let task = &mut board.tasks[index];
    task.status = change.status;
    task.updated_at = timestamp.clone();

    if change.status == TaskStatus::Done {
        task.result = Some(
            non_blank(change.result.as_deref()).unwrap_or_else(|| DEFAULT_RESULT.to_string()),
        );
        task.output_path = non_blank(change.output_path.as_deref());

        let entry = upsert_entry(log, &iso_date(now));
        push_unique(&mut entry.completed_ids, &task.id);
        if let Some(output) = &task.output_path {
            push_unique(&mut entry.outputs, output);
        }
        log.last_updated = timestamp.clone();
    }

    let updated = task.clone();
    board.last_updated = timestamp;
    Ok(updated)
}

// ── Service ───────────────────────────────────────────────────────────

/// Loads, mutates and persists the two documents through a [`FileStore`].
#[derive(Clone)]
pub struct KanbanService {
    kanban: Repository<KanbanState>,
    accomplishments: Repository<AccomplishmentsState>,
}

impl KanbanService {
    pub fn new(store: Arc<dyn FileStore>, paths: &DocumentPaths) -> Self {
        Self {
            kanban: Repository::new(Arc::clone(&store), paths.kanban.clone()),
            accomplishments: Repository::new(store, paths.accomplishments.clone()),
        }
    }

    /// Load both documents without writing anything.
    pub async fn load_state(
        &self,
    ) -> KanbanResult<(Loaded<KanbanState>, Loaded<AccomplishmentsState>)> {
        tokio::try_join!(self.kanban.load(), self.accomplishments.load())
    }

    /// Make sure both files exist, seeding any that are absent or blank, and
    /// return their canonical contents.
    pub async fn ensure_bootstrap(&self) -> KanbanResult<BoardSnapshot> {
        let (kanban, accomplishments) = self.load_state().await?;

        if kanban.needs_seed() {
            let message = format!("Initialize {} {}", self.kanban.file_name(), COMMIT_SOURCE);
            self.kanban
                .save(&kanban.state, &message, kanban.token.as_deref())
                .await?;
            tracing::info!(path = self.kanban.path(), "seeded kanban document");
        }
        if accomplishments.needs_seed() {
            let message = format!(
                "Initialize {} {}",
                self.accomplishments.file_name(),
                COMMIT_SOURCE
            );
            self.accomplishments
                .save(&accomplishments.state, &message, accomplishments.token.as_deref())
                .await?;
            tracing::info!(
                path = self.accomplishments.path(),
                "seeded accomplishments document"
            );
        }

        let (kanban, accomplishments) = self.load_state().await?;
        Ok(BoardSnapshot {
            kanban: kanban.state,
            accomplishments: accomplishments.state,
        })
    }

    pub async fn create_task(&self, input: NewTask) -> KanbanResult<Task> {
        let mut loaded = self.kanban.load().await?;
        let task = add_task(&mut loaded.state, input, Utc::now())?;

        let message = format!("Add task {} {}", task.id, COMMIT_SOURCE);
        self.kanban
            .save(&loaded.state, &message, loaded.token.as_deref())
            .await?;
        tracing::info!(id = %task.id, board = %task.board, "created task");
        Ok(task)
    }

    pub async fn update_task_status(&self, change: StatusChange) -> KanbanResult<Task> {
        let (mut kanban, mut accomplishments) = self.load_state().await?;

        let task = match apply_status_change(
            &mut kanban.state,
            &mut accomplishments.state,
            &change,
            Utc::now(),
        ) {
            Ok(task) => task,
            Err(e) => {
                tracing::warn!(
                    id = %change.id,
                    status = %change.status,
                    error = %e,
                    "rejected status change"
                );
                return Err(e);
            }
        };

        let board_message = format!("Move task {} to {} {}", task.id, task.status, COMMIT_SOURCE);
        if task.status == TaskStatus::Done {
            let log_message = format!("Update accomplishments for {} {}", task.id, COMMIT_SOURCE);
            tokio::try_join!(
                self.kanban
                    .save(&kanban.state, &board_message, kanban.token.as_deref()),
                self.accomplishments.save(
                    &accomplishments.state,
                    &log_message,
                    accomplishments.token.as_deref()
                ),
            )?;
        } else {
            self.kanban
                .save(&kanban.state, &board_message, kanban.token.as_deref())
                .await?;
        }
        tracing::info!(id = %task.id, status = %task.status, "moved task");
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::codec::Document;
    use crate::board::models::{Lane, Owner, Priority};
    use crate::board::store::MemoryStore;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap()
    }

    fn new_task(title: &str, board: Board) -> NewTask {
        NewTask {
            title: title.to_string(),
            owner: Owner::Milo,
            lane: Lane::Admin,
            priority: Priority::P1,
            due: String::new(),
            board,
        }
    }

    fn change(id: &str, status: TaskStatus) -> StatusChange {
        StatusChange {
            id: id.to_string(),
            status,
            result: None,
            output_path: None,
        }
    }

    fn empty_board() -> KanbanState {
        KanbanState {
            last_updated: iso_timestamp(now()),
            wip_limit: 3,
            tasks: Vec::new(),
        }
    }

    fn apply(
        board: &mut KanbanState,
        log: &mut AccomplishmentsState,
        id: &str,
        status: TaskStatus,
    ) -> KanbanResult<Task> {
        apply_status_change(board, log, &change(id, status), now())
    }

    fn empty_log() -> AccomplishmentsState {
        AccomplishmentsState {
            last_updated: iso_timestamp(now()),
            entries: Vec::new(),
        }
    }

    #[test]
    fn test_next_task_id_starts_at_one() {
        assert_eq!(next_task_id(&[], Board::Moussa).unwrap(), "U-001");
    }

    #[test]
    fn test_next_task_id_uses_max_suffix_per_board() {
        let state = KanbanState::seed(now());
        assert_eq!(next_task_id(&state.tasks, Board::Milo).unwrap(), "M-008");
        assert_eq!(next_task_id(&state.tasks, Board::Moussa).unwrap(), "U-001");
    }

    #[test]
    fn test_next_task_id_skips_gaps_and_foreign_ids() {
        let mut state = empty_board();
        for id in ["M-002", "M-010", "U-040", "M-abc", "MX-900"] {
            add_task(&mut state, new_task("x", Board::Milo), now()).unwrap();
            state.tasks.last_mut().unwrap().id = id.to_string();
        }
        assert_eq!(next_task_id(&state.tasks, Board::Milo).unwrap(), "M-011");
    }

    #[test]
    fn test_next_task_id_grows_past_three_digits() {
        let mut state = empty_board();
        add_task(&mut state, new_task("x", Board::Milo), now()).unwrap();
        state.tasks[0].id = "M-999".into();
        assert_eq!(next_task_id(&state.tasks, Board::Milo).unwrap(), "M-1000");
    }

    #[test]
    fn test_exhausted_id_space_is_rejected() {
        let mut state = empty_board();
        add_task(&mut state, new_task("x", Board::Milo), now()).unwrap();
        state.tasks[0].id = format!("M-{}", u32::MAX);
        let before = state.clone();

        let err = add_task(&mut state, new_task("y", Board::Milo), now()).unwrap_err();
        assert!(matches!(err, KanbanError::Validation(_)));
        assert_eq!(state, before);
        // The other board is unaffected.
        assert_eq!(next_task_id(&state.tasks, Board::Moussa).unwrap(), "U-001");
    }

    #[test]
    fn test_add_task_defaults() {
        let mut state = empty_board();
        let mut input = new_task("  Draft listing copy  ", Board::Moussa);
        input.due = "   ".into();
        let task = add_task(&mut state, input, now()).unwrap();
        assert_eq!(task.id, "U-001");
        assert_eq!(task.title, "Draft listing copy");
        assert_eq!(task.due, "TBD");
        assert_eq!(task.status, TaskStatus::Backlog);
        assert_eq!(task.updated_at, "2026-10-14T12:00:00.000Z");
        assert_eq!(state.tasks, vec![task]);
    }

    #[test]
    fn test_sequential_ids_interleaved_with_moves() {
        let mut board = empty_board();
        let mut log = empty_log();
        let mut ids = Vec::new();
        for i in 0..6 {
            let input = new_task(&format!("t{}", i), Board::Milo);
            let task = add_task(&mut board, input, now()).unwrap();
            ids.push(task.id.clone());
            let status = if i % 2 == 0 { TaskStatus::Done } else { TaskStatus::Blocked };
            apply_status_change(&mut board, &mut log, &change(&task.id, status), now()).unwrap();
        }
        assert_eq!(ids, ["M-001", "M-002", "M-003", "M-004", "M-005", "M-006"]);
    }

    #[test]
    fn test_wip_limit_blocks_fourth_doing_task() {
        let mut board = KanbanState::seed(now());
        let mut log = empty_log();
        let task = add_task(&mut board, new_task("M-008 candidate", Board::Milo), now()).unwrap();
        let before = board.clone();

        let err = apply(&mut board, &mut log, &task.id, TaskStatus::Doing).unwrap_err();
        assert!(err.to_string().contains("WIP limit"));
        assert!(matches!(err, KanbanError::WipLimitReached { board: Board::Milo }));
        assert_eq!(board, before);
        assert!(log.entries.is_empty());
    }

    #[test]
    fn test_wip_limit_frees_up_after_moving_out() {
        let mut board = KanbanState::seed(now());
        let mut log = empty_log();
        let task = add_task(&mut board, new_task("next up", Board::Milo), now()).unwrap();
        apply(&mut board, &mut log, "M-001", TaskStatus::Blocked).unwrap();
        let moved = apply(&mut board, &mut log, &task.id, TaskStatus::Doing).unwrap();
        assert_eq!(moved.status, TaskStatus::Doing);
    }

    #[test]
    fn test_wip_limit_is_per_board() {
        let mut board = KanbanState::seed(now());
        let mut log = empty_log();
        let task = add_task(&mut board, new_task("other board", Board::Moussa), now()).unwrap();
        apply(&mut board, &mut log, &task.id, TaskStatus::Doing).unwrap();
    }

    #[test]
    fn test_doing_to_doing_skips_wip_check() {
        let mut board = KanbanState::seed(now());
        let mut log = empty_log();
        let task = apply(&mut board, &mut log, "M-001", TaskStatus::Doing).unwrap();
        assert_eq!(task.status, TaskStatus::Doing);
    }

    #[test]
    fn test_unknown_task_is_not_found() {
        let mut board = KanbanState::seed(now());
        let mut log = empty_log();
        let err = apply(&mut board, &mut log, "M-404", TaskStatus::Next).unwrap_err();
        assert!(matches!(err, KanbanError::TaskNotFound { ref id } if id == "M-404"));
    }

    #[test]
    fn test_done_defaults_result_and_records_once() {
        let mut board = KanbanState::seed(now());
        let mut log = AccomplishmentsState::seed(now());
        let mut done = change("M-002", TaskStatus::Done);
        done.result = Some("   ".into());
        done.output_path = Some(" docs/compliance.md ".into());

        let task = apply_status_change(&mut board, &mut log, &done, now()).unwrap();
        assert_eq!(task.result.as_deref(), Some("Completed"));
        assert_eq!(task.output_path.as_deref(), Some("docs/compliance.md"));

        apply_status_change(&mut board, &mut log, &done, now()).unwrap();
        assert_eq!(log.entries.len(), 1);
        assert_eq!(log.entries[0].completed_ids, vec!["M-002".to_string()]);
        assert_eq!(log.entries[0].outputs, vec!["docs/compliance.md".to_string()]);
        assert_eq!(log.last_updated, "2026-10-14T12:00:00.000Z");
    }

    #[test]
    fn test_done_on_new_day_inserts_entry_at_front() {
        let mut board = KanbanState::seed(now());
        let mut log = AccomplishmentsState::seed(now());
        let tomorrow = Utc.with_ymd_and_hms(2026, 10, 15, 7, 0, 0).unwrap();
        let done = change("M-003", TaskStatus::Done);
        apply_status_change(&mut board, &mut log, &done, tomorrow).unwrap();
        assert_eq!(log.entries.len(), 2);
        assert_eq!(log.entries[0].date, "2026-10-15");
        assert_eq!(log.entries[0].completed_ids, vec!["M-003".to_string()]);
        assert_eq!(log.entries[1].date, "2026-10-14");
    }

    #[test]
    fn test_blank_output_is_absent() {
        let mut board = KanbanState::seed(now());
        let mut log = empty_log();
        let mut done = change("M-006", TaskStatus::Done);
        done.result = Some(" Tracker shipped ".into());
        done.output_path = Some("".into());
        let task = apply_status_change(&mut board, &mut log, &done, now()).unwrap();
        assert_eq!(task.result.as_deref(), Some("Tracker shipped"));
        assert!(task.output_path.is_none());
        assert!(log.entries[0].outputs.is_empty());
    }

    #[test]
    fn test_reopening_done_task_keeps_result() {
        let mut board = KanbanState::seed(now());
        let mut log = empty_log();
        apply(&mut board, &mut log, "M-007", TaskStatus::Done).unwrap();
        let reopened = apply(&mut board, &mut log, "M-007", TaskStatus::Backlog).unwrap();
        assert_eq!(reopened.status, TaskStatus::Backlog);
        assert_eq!(reopened.result.as_deref(), Some("Completed"));
    }

    // ── Service over MemoryStore ─────────────────────────────────────

    fn service() -> (Arc<MemoryStore>, KanbanService) {
        let store = Arc::new(MemoryStore::new());
        let svc = KanbanService::new(store.clone(), &DocumentPaths::default());
        (store, svc)
    }

    #[tokio::test]
    async fn test_bootstrap_seeds_and_persists_both_files() {
        let (store, svc) = service();
        let snapshot = svc.ensure_bootstrap().await.unwrap();
        assert_eq!(snapshot.kanban.tasks.len(), 7);
        assert_eq!(snapshot.accomplishments.entries.len(), 1);

        let kanban = store.content("kanban.md").unwrap();
        assert_eq!(KanbanState::parse(&kanban), snapshot.kanban);
        assert_eq!(
            store.last_message("kanban.md").as_deref(),
            Some("Initialize kanban.md via milo-kanban-ui")
        );
        assert_eq!(
            store.last_message("accomplishments.md").as_deref(),
            Some("Initialize accomplishments.md via milo-kanban-ui")
        );
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let (store, svc) = service();
        let first = svc.ensure_bootstrap().await.unwrap();
        let second = svc.ensure_bootstrap().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.revision("kanban.md"), Some(1));
    }

    #[tokio::test]
    async fn test_bootstrap_reseeds_blank_file() {
        let (store, svc) = service();
        store.insert("kanban.md", "").unwrap();
        svc.ensure_bootstrap().await.unwrap();
        assert_eq!(store.revision("kanban.md"), Some(2));
        assert!(store.content("kanban.md").unwrap().starts_with("# Kanban"));
    }

    #[tokio::test]
    async fn test_create_task_persists_board_only() {
        let (store, svc) = service();
        svc.ensure_bootstrap().await.unwrap();
        let task = svc.create_task(new_task("Review offers", Board::Milo)).await.unwrap();
        assert_eq!(task.id, "M-008");
        assert_eq!(
            store.last_message("kanban.md").as_deref(),
            Some("Add task M-008 via milo-kanban-ui")
        );
        assert_eq!(store.revision("accomplishments.md"), Some(1));

        let saved = KanbanState::parse(&store.content("kanban.md").unwrap());
        assert_eq!(saved.tasks.last(), Some(&task));
    }

    #[tokio::test]
    async fn test_rejected_move_writes_nothing() {
        let (store, svc) = service();
        svc.ensure_bootstrap().await.unwrap();
        let task = svc.create_task(new_task("M-008", Board::Milo)).await.unwrap();
        let before = store.content("kanban.md");

        let err = svc
            .update_task_status(change(&task.id, TaskStatus::Doing))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("WIP limit"));
        assert_eq!(store.content("kanban.md"), before);
    }

    #[tokio::test]
    async fn test_done_move_writes_both_documents() {
        let (store, svc) = service();
        svc.ensure_bootstrap().await.unwrap();
        svc.update_task_status(change("M-004", TaskStatus::Done))
            .await
            .unwrap();
        assert_eq!(
            store.last_message("kanban.md").as_deref(),
            Some("Move task M-004 to done via milo-kanban-ui")
        );
        assert_eq!(
            store.last_message("accomplishments.md").as_deref(),
            Some("Update accomplishments for M-004 via milo-kanban-ui")
        );
        let log = AccomplishmentsState::parse(&store.content("accomplishments.md").unwrap());
        assert!(log.entries[0].completed_ids.contains(&"M-004".to_string()));
    }

    #[tokio::test]
    async fn test_non_done_move_leaves_log_untouched() {
        let (store, svc) = service();
        svc.ensure_bootstrap().await.unwrap();
        svc.update_task_status(change("M-004", TaskStatus::Blocked))
            .await
            .unwrap();
        assert_eq!(store.revision("accomplishments.md"), Some(1));
        assert_eq!(store.revision("kanban.md"), Some(2));
    }

    #[tokio::test]
    async fn test_concurrent_edit_surfaces_conflict() {
        let (store, svc) = service();
        svc.ensure_bootstrap().await.unwrap();
        let (stale, _) = svc.load_state().await.unwrap();
        svc.create_task(new_task("first writer", Board::Milo)).await.unwrap();

        let repo: Repository<KanbanState> = Repository::new(store.clone(), "kanban.md");
        let err = repo
            .save(&stale.state, "second writer", stale.token.as_deref())
            .await
            .unwrap_err();
        assert!(matches!(err, KanbanError::Conflict { .. }));
    }
}
