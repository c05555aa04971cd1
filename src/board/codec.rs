//! Markdown documents with an embedded JSON snapshot.
//!
//! Each document has a human-readable projection followed by a fenced
//! `json` block holding the full state. Only the snapshot is ever read back;
//! the bullet sections are write-only.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::models::{
    AccomplishmentEntry, AccomplishmentsState, Board, KanbanState, Lane, Owner, Priority, Task,
    TaskStatus,
};
use crate::util::{iso_date, iso_timestamp, single_line};

/// First fenced `json` block. Fences only count at the start of a line.
static JSON_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^```json[ \t]*\r?\n(?s:(.*?))\r?\n```[ \t\r]*$").expect("valid regex")
});

pub const DEFAULT_WIP_LIMIT: u32 = 3;

/// A state aggregate persisted as one markdown document.
pub trait Document: Sized + Serialize + DeserializeOwned {
    /// Short name used in logs and commit messages.
    const KIND: &'static str;

    /// The default state written on first use.
    fn seed(now: DateTime<Utc>) -> Self;

    /// Human-readable sections, without the snapshot.
    fn render_sections(&self, lines: &mut Vec<String>);

    fn render(&self) -> String {
        let mut lines = Vec::new();
        self.render_sections(&mut lines);
        lines.push("```json".to_string());
        // Serializing plain data with string keys cannot fail.
        lines.push(serde_json::to_string_pretty(self).unwrap_or_default());
        lines.push("```".to_string());
        lines.join("\n")
    }

    /// Parse the embedded snapshot, or seed a fresh state if it is missing
    /// or does not match the schema.
    fn parse_or_seed(text: &str, now: DateTime<Utc>) -> Self {
        match extract_snapshot::<Self>(text) {
            Ok(state) => state,
            Err(reason) => {
                tracing::warn!(kind = Self::KIND, %reason, "unusable snapshot, using seed state");
                Self::seed(now)
            }
        }
    }

    fn parse(text: &str) -> Self {
        Self::parse_or_seed(text, Utc::now())
    }
}

fn extract_snapshot<T: DeserializeOwned>(text: &str) -> Result<T, String> {
    let block = JSON_BLOCK
        .captures(text)
        .and_then(|c| c.get(1))
        .ok_or_else(|| "no ```json block".to_string())?;
    serde_json::from_str(block.as_str()).map_err(|e| e.to_string())
}

impl Document for KanbanState {
    const KIND: &'static str = "kanban";

    fn seed(now: DateTime<Utc>) -> Self {
        let updated_at = iso_timestamp(now);
        let seed = |n: u32, title: &str, lane: Lane, priority: Priority, status: TaskStatus| Task {
            id: format!("M-{:03}", n),
            title: title.to_string(),
            owner: Owner::Milo,
            lane,
            priority,
            due: "TBD".to_string(),
            board: Board::Milo,
            status,
            result: None,
            output_path: None,
            updated_at: updated_at.clone(),
        };
        let tasks = vec![
            seed(
                1,
                "Reduce route misses with daily exception list and follow-up prompts",
                Lane::Icebreaker,
                Priority::P0,
                TaskStatus::Doing,
            ),
            seed(
                2,
                "Improve reporting compliance tracker and daily submission checks",
                Lane::Icebreaker,
                Priority::P0,
                TaskStatus::Next,
            ),
            seed(
                3,
                "Build accountability clarity map for route and reporting ownership",
                Lane::Icebreaker,
                Priority::P1,
                TaskStatus::Next,
            ),
            seed(
                4,
                "Set real estate pipeline rhythm checklist with follow-up discipline",
                Lane::RealEstate,
                Priority::P0,
                TaskStatus::Doing,
            ),
            seed(
                5,
                "Build PhotonLabs pre-launch readiness checklist and milestone tracker",
                Lane::Omoto,
                Priority::P1,
                TaskStatus::Doing,
            ),
            seed(
                6,
                "Create health routine tracker for training, back and ankle safety, and sleep",
                Lane::Health,
                Priority::P1,
                TaskStatus::Backlog,
            ),
            seed(
                7,
                "Create family admin planning template to reduce communication friction",
                Lane::Family,
                Priority::P1,
                TaskStatus::Backlog,
            ),
        ];
        Self {
            last_updated: updated_at.clone(),
            wip_limit: DEFAULT_WIP_LIMIT,
            tasks,
        }
    }

    fn render_sections(&self, lines: &mut Vec<String>) {
        lines.push("# Kanban".to_string());
        lines.push(String::new());
        lines.push(format!("Last updated: {}", single_line(&self.last_updated)));
        lines.push(format!(
            "WIP limit: max {} items in Doing per board.",
            self.wip_limit
        ));
        lines.push(String::new());

        for board in Board::ALL {
            lines.push(format!("## {}", board.label()));
            lines.push(String::new());
            for status in TaskStatus::ALL {
                lines.push(format!("### {}", status.label()));
                let mut any = false;
                for task in self
                    .tasks
                    .iter()
                    .filter(|t| t.board == board && t.status == status)
                {
                    lines.push(task_line(task));
                    any = true;
                }
                if !any {
                    lines.push("- (empty)".to_string());
                }
                lines.push(String::new());
            }
        }
    }
}

fn task_line(task: &Task) -> String {
    let mut line = format!(
        "- [{}] {} - Owner: {} - Lane: {} - Priority: {} - Due: {}",
        task.id,
        single_line(&task.title),
        task.owner.as_str(),
        task.lane.as_str(),
        task.priority.as_str(),
        single_line(&task.due),
    );
    if task.status == TaskStatus::Done {
        if let Some(result) = task.result.as_deref().filter(|r| !r.is_empty()) {
            line.push_str(" - Result: ");
            line.push_str(&single_line(result));
        }
        if let Some(output) = task.output_path.as_deref().filter(|o| !o.is_empty()) {
            line.push_str(" - Output: ");
            line.push_str(&single_line(output));
        }
    }
    line
}

impl Document for AccomplishmentsState {
    const KIND: &'static str = "accomplishments";

    fn seed(now: DateTime<Utc>) -> Self {
        Self {
            last_updated: iso_timestamp(now),
            entries: vec![AccomplishmentEntry::empty(iso_date(now))],
        }
    }

    fn render_sections(&self, lines: &mut Vec<String>) {
        lines.push("# Accomplishments Log".to_string());
        lines.push(String::new());
        lines.push(format!("Last updated: {}", single_line(&self.last_updated)));
        lines.push(String::new());

        for entry in &self.entries {
            lines.push(format!("## {}", single_line(&entry.date)));
            lines.push(format!(
                "- Completed (IDs): {}",
                joined(&entry.completed_ids, ", ")
            ));
            lines.push(format!(
                "- Outputs produced (paths/links): {}",
                joined(&entry.outputs, ", ")
            ));
            lines.push(format!(
                "- Decisions needed from Moussa: {}",
                joined(&entry.decisions_needed, "; ")
            ));
            lines.push("- Next 3 actions:".to_string());
            if entry.next_actions.is_empty() {
                lines.push("  - none".to_string());
            } else {
                for action in &entry.next_actions {
                    lines.push(format!("  - {}", single_line(action)));
                }
            }
            lines.push(String::new());
        }
    }
}

fn joined(items: &[String], sep: &str) -> String {
    items
        .iter()
        .map(|s| single_line(s))
        .collect::<Vec<_>>()
        .join(sep)
}
