//! GitHub contents API backend for [`FileStore`].

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::store::{FileStore, RemoteFile};
use crate::config::GitHubSettings;
use crate::errors::{KanbanError, KanbanResult};

const USER_AGENT: &str = "milo-kanban-ui";

/// Known GitHub token prefixes.
/// See: https://github.blog/2021-04-05-behind-githubs-new-authentication-token-formats/
const GITHUB_TOKEN_PREFIXES: &[&str] = &[
    "ghp_",        // Personal access tokens (classic)
    "github_pat_", // Fine-grained personal access tokens
    "gho_",        // OAuth access tokens
    "ghu_",        // GitHub App user-to-server tokens
    "ghs_",        // GitHub App server-to-server tokens
    "ghr_",        // GitHub App refresh tokens
];

/// Format check only; says nothing about whether the token is active or
/// has `contents: write` on the repository.
pub fn is_valid_github_token(token: &str) -> bool {
    if token.is_empty() {
        return false;
    }
    GITHUB_TOKEN_PREFIXES
        .iter()
        .any(|prefix| token.starts_with(prefix))
}

/// `GET /repos/{owner}/{repo}/contents/{path}` returns an object for a file
/// and an array for a directory.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    File(ContentsFile),
    Directory(Vec<serde_json::Value>),
}

#[derive(Debug, Deserialize)]
struct ContentsFile {
    sha: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PutContentsResponse {
    content: PutContentsFile,
}

#[derive(Debug, Deserialize)]
struct PutContentsFile {
    sha: String,
}

/// Reads and writes files on one branch of one repository.
pub struct GitHubStore {
    client: reqwest::Client,
    settings: GitHubSettings,
}

impl GitHubStore {
    pub fn new(settings: GitHubSettings) -> Self {
        if !is_valid_github_token(&settings.token) {
            tracing::warn!(
                "GITHUB_PAT does not look like a GitHub token; requests will likely fail"
            );
        }
        Self {
            client: reqwest::Client::new(),
            settings,
        }
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.settings.api_url.trim_end_matches('/'),
            self.settings.owner,
            self.settings.repo,
            path.trim_start_matches('/'),
        )
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.contents_url(path))
            .header("Authorization", format!("Bearer {}", self.settings.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
            .header("X-GitHub-Api-Version", "2022-11-28")
    }
}

/// GitHub wraps base64 payloads at 60 columns.
pub fn decode_content(encoded: &str) -> KanbanResult<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = BASE64
        .decode(compact)
        .map_err(|e| KanbanError::Transport(format!("Invalid base64 content: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| KanbanError::Transport(format!("File is not valid UTF-8: {}", e)))
}

async fn failure(path: &str, resp: reqwest::Response) -> KanbanError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    KanbanError::Transport(format!(
        "GitHub contents API returned {} for {}: {}",
        status,
        path,
        body.trim()
    ))
}

#[async_trait]
impl FileStore for GitHubStore {
    async fn read(&self, path: &str) -> KanbanResult<Option<RemoteFile>> {
        tracing::debug!(path, branch = %self.settings.branch, "reading file from GitHub");
        let resp = self
            .request(reqwest::Method::GET, path)
            .query(&[("ref", self.settings.branch.as_str())])
            .send()
            .await
            .map_err(|e| {
                KanbanError::Transport(format!("Failed to read {} from GitHub: {}", path, e))
            })?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(failure(path, resp).await);
        }

        let body = resp
            .json::<ContentsResponse>()
            .await
            .map_err(|e| {
                KanbanError::Transport(format!("Failed to parse contents of {}: {}", path, e))
            })?;

        match body {
            ContentsResponse::Directory(_) => Err(KanbanError::NotAFile {
                path: path.to_string(),
            }),
            ContentsResponse::File(file) => {
                let content = match file.content.as_deref() {
                    Some(encoded) => decode_content(encoded)?,
                    None => String::new(),
                };
                Ok(Some(RemoteFile {
                    content,
                    token: file.sha,
                }))
            }
        }
    }

    async fn write(
        &self,
        path: &str,
        content: &str,
        message: &str,
        token: Option<&str>,
    ) -> KanbanResult<String> {
        let body = PutContentsRequest {
            message,
            content: BASE64.encode(content.as_bytes()),
            branch: &self.settings.branch,
            sha: token,
        };
        let resp = self
            .request(reqwest::Method::PUT, path)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                KanbanError::Transport(format!("Failed to write {} to GitHub: {}", path, e))
            })?;

        let status = resp.status();
        // 409: sha does not match the branch head. 422: sha missing for an existing file.
        if status == StatusCode::CONFLICT
            || (status == StatusCode::UNPROCESSABLE_ENTITY && token.is_none())
        {
            return Err(KanbanError::Conflict {
                path: path.to_string(),
            });
        }
        if !status.is_success() {
            return Err(failure(path, resp).await);
        }

        let written = resp
            .json::<PutContentsResponse>()
            .await
            .map_err(|e| {
                KanbanError::Transport(format!(
                    "Failed to parse write response for {}: {}",
                    path, e
                ))
            })?;
        tracing::info!(path, message, sha = %written.content.sha, "committed file to GitHub");
        Ok(written.content.sha)
    }
}
