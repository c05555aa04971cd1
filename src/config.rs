use crate::errors::{KanbanError, KanbanResult};

pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_KANBAN_PATH: &str = "kanban.md";
pub const DEFAULT_ACCOMPLISHMENTS_PATH: &str = "accomplishments.md";

/// Where the two documents live inside the backing store.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentPaths {
    pub kanban: String,
    pub accomplishments: String,
}

impl Default for DocumentPaths {
    fn default() -> Self {
        Self {
            kanban: DEFAULT_KANBAN_PATH.to_string(),
            accomplishments: DEFAULT_ACCOMPLISHMENTS_PATH.to_string(),
        }
    }
}

impl DocumentPaths {
    /// `KANBAN_FILE_PATH` / `ACCOMPLISHMENTS_FILE_PATH`, each falling back to its default.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            kanban: non_empty(lookup("KANBAN_FILE_PATH")).unwrap_or(defaults.kanban),
            accomplishments: non_empty(lookup("ACCOMPLISHMENTS_FILE_PATH"))
                .unwrap_or(defaults.accomplishments),
        }
    }
}

/// Credentials and coordinates of the GitHub repository holding the documents.
#[derive(Clone, PartialEq)]
pub struct GitHubSettings {
    pub token: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub api_url: String,
}

impl std::fmt::Debug for GitHubSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubSettings")
            .field("token", &"<redacted>")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl GitHubSettings {
    /// Read `GITHUB_PAT`, `GITHUB_OWNER`, `GITHUB_REPO` (required) and
    /// `GITHUB_BRANCH`, `GITHUB_API_URL` (optional) from the environment.
    pub fn from_env() -> KanbanResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> KanbanResult<Self> {
        let require =
            |name: &'static str| non_empty(lookup(name)).ok_or(KanbanError::MissingEnv(name));
        Ok(Self {
            token: require("GITHUB_PAT")?,
            owner: require("GITHUB_OWNER")?,
            repo: require("GITHUB_REPO")?,
            branch: non_empty(lookup("GITHUB_BRANCH"))
                .unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
            api_url: non_empty(lookup("GITHUB_API_URL"))
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
