//! Board inspection commands: `milo-kanban init` and `milo-kanban show`.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use milo_kanban::board::models::{Board, TaskStatus};
use milo_kanban::board::service::BoardSnapshot;

use crate::StoreArgs;

pub async fn cmd_init(store: &StoreArgs) -> Result<()> {
    let service = super::build_service(store)?;
    let snapshot = service
        .ensure_bootstrap()
        .await
        .context("Failed to initialize documents")?;
    println!(
        "Initialized kanban ({} tasks) and accomplishments log ({} entries)",
        snapshot.kanban.tasks.len(),
        snapshot.accomplishments.entries.len()
    );
    Ok(())
}

pub async fn cmd_show(json: bool, store: &StoreArgs) -> Result<()> {
    let service = super::build_service(store)?;
    let (kanban, accomplishments) = service
        .load_state()
        .await
        .context("Failed to load documents")?;
    let snapshot = BoardSnapshot {
        kanban: kanban.state,
        accomplishments: accomplishments.state,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{}", summarize(&snapshot));
    }
    Ok(())
}

/// Per-board column counts followed by the most recent log entry.
pub fn summarize(snapshot: &BoardSnapshot) -> String {
    let kanban = &snapshot.kanban;
    let mut out = String::new();
    for board in Board::ALL {
        let on_board: Vec<_> = kanban.tasks.iter().filter(|t| t.board == board).collect();
        let doing = on_board
            .iter()
            .filter(|t| t.status == TaskStatus::Doing)
            .count();
        let _ = writeln!(
            out,
            "{} (doing {}/{})",
            board.label(),
            doing,
            kanban.wip_limit
        );
        for status in TaskStatus::ALL {
            let count = on_board.iter().filter(|t| t.status == status).count();
            let _ = writeln!(out, "  {:<8} {}", status.label(), count);
        }
    }

    match snapshot.accomplishments.entries.first() {
        Some(entry) if entry.completed_ids.is_empty() => {
            let _ = writeln!(out, "Accomplishments {}: nothing completed yet", entry.date);
        }
        Some(entry) => {
            let _ = writeln!(
                out,
                "Accomplishments {}: {}",
                entry.date,
                entry.completed_ids.join(", ")
            );
        }
        None => {
            let _ = writeln!(out, "Accomplishments: no entries");
        }
    }
    out
}
