use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Owner {
    #[serde(rename = "MILO")]
    Milo,
    #[serde(rename = "MOUSSA")]
    Moussa,
}

impl Owner {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Milo => "MILO",
            Self::Moussa => "MOUSSA",
        }
    }
}

impl FromStr for Owner {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MILO" => Ok(Self::Milo),
            "MOUSSA" => Ok(Self::Moussa),
            _ => Err(format!("Invalid owner: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Lane {
    Icebreaker,
    RealEstate,
    #[serde(rename = "OMOTO")]
    Omoto,
    Hathor,
    Health,
    Family,
    Admin,
}

impl Lane {
    pub const ALL: [Lane; 7] = [
        Self::Icebreaker,
        Self::RealEstate,
        Self::Omoto,
        Self::Hathor,
        Self::Health,
        Self::Family,
        Self::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Icebreaker => "Icebreaker",
            Self::RealEstate => "RealEstate",
            Self::Omoto => "OMOTO",
            Self::Hathor => "Hathor",
            Self::Health => "Health",
            Self::Family => "Family",
            Self::Admin => "Admin",
        }
    }
}

impl FromStr for Lane {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|lane| lane.as_str() == s)
            .ok_or_else(|| format!("Invalid lane: {}", s))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Priority {
    P0,
    P1,
    P2,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P0 => "P0",
            Self::P1 => "P1",
            Self::P2 => "P2",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "P0" => Ok(Self::P0),
            "P1" => Ok(Self::P1),
            "P2" => Ok(Self::P2),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}

/// One of the two independent kanban instances. Each board has its own
/// task-ID namespace.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Board {
    Milo,
    Moussa,
}

impl Board {
    /// Render order of the boards in the kanban document.
    pub const ALL: [Board; 2] = [Self::Milo, Self::Moussa];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Milo => "milo",
            Self::Moussa => "moussa",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Milo => "MILO Kanban",
            Self::Moussa => "MOUSSA Kanban",
        }
    }

    /// Prefix of every task ID allocated on this board.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Milo => "M",
            Self::Moussa => "U",
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Board {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "milo" => Ok(Self::Milo),
            "moussa" => Ok(Self::Moussa),
            _ => Err(format!("Invalid board: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Backlog,
    Next,
    Doing,
    Blocked,
    Done,
}

impl TaskStatus {
    /// Column order within a board. Transitions are not restricted by it.
    pub const ALL: [TaskStatus; 5] = [
        Self::Backlog,
        Self::Next,
        Self::Doing,
        Self::Blocked,
        Self::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::Next => "next",
            Self::Doing => "doing",
            Self::Blocked => "blocked",
            Self::Done => "done",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Backlog => "Backlog",
            Self::Next => "Next",
            Self::Doing => "Doing",
            Self::Blocked => "Blocked",
            Self::Done => "Done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backlog" => Ok(Self::Backlog),
            "next" => Ok(Self::Next),
            "doing" => Ok(Self::Doing),
            "blocked" => Ok(Self::Blocked),
            "done" => Ok(Self::Done),
            _ => Err(format!("Invalid status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub owner: Owner,
    pub lane: Lane,
    pub priority: Priority,
    pub due: String,
    pub board: Board,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KanbanState {
    pub last_updated: String,
    pub wip_limit: u32,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccomplishmentEntry {
    /// Calendar day, `YYYY-MM-DD`.
    pub date: String,
    pub completed_ids: Vec<String>,
    pub outputs: Vec<String>,
    #[serde(default)]
    pub decisions_needed: Vec<String>,
    #[serde(default)]
    pub next_actions: Vec<String>,
}

impl AccomplishmentEntry {
    pub fn empty(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            completed_ids: Vec::new(),
            outputs: Vec::new(),
            decisions_needed: Vec::new(),
            next_actions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccomplishmentsState {
    pub last_updated: String,
    /// Newest first.
    pub entries: Vec<AccomplishmentEntry>,
}

/// A validated task creation request.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub owner: Owner,
    pub lane: Lane,
    pub priority: Priority,
    pub due: String,
    pub board: Board,
}

/// A validated status change for an existing task.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub id: String,
    pub status: TaskStatus,
    pub result: Option<String>,
    pub output_path: Option<String>,
}
