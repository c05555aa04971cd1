use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use serde::Deserialize;

use super::models::{NewTask, StatusChange, Task, TaskStatus};
use super::service::KanbanService;
use crate::errors::{KanbanError, KanbanResult};

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub service: KanbanService,
}

pub type SharedState = Arc<AppState>;

// ── Request payload types ─────────────────────────────────────────────

/// Every field is optional so that missing values get the same
/// `{"error": ...}` treatment as invalid ones.
#[derive(Debug, Default, Deserialize)]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub owner: Option<String>,
    pub lane: Option<String>,
    pub priority: Option<String>,
    pub due: Option<String>,
    pub board: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub status: Option<String>,
    pub result: Option<String>,
    pub output_path: Option<String>,
}

#[derive(serde::Serialize)]
struct TaskResponse {
    task: Task,
}

fn parse_field<T: std::str::FromStr>(value: Option<&str>, error: &str) -> KanbanResult<T> {
    value
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| KanbanError::Validation(error.to_string()))
}

impl CreateTaskRequest {
    /// Check fields in a fixed order and report the first problem.
    pub fn validate(self) -> KanbanResult<NewTask> {
        let title = self
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| KanbanError::Validation("Title is required.".into()))?
            .to_string();
        let owner = parse_field(self.owner.as_deref(), "Owner is invalid.")?;
        let lane = parse_field(self.lane.as_deref(), "Lane is invalid.")?;
        let priority = parse_field(self.priority.as_deref(), "Priority is invalid.")?;
        let board = parse_field(self.board.as_deref(), "Board is invalid.")?;
        Ok(NewTask {
            title,
            owner,
            lane,
            priority,
            due: self.due.unwrap_or_default(),
            board,
        })
    }
}

impl UpdateTaskRequest {
    pub fn validate(self, id: String) -> KanbanResult<StatusChange> {
        let status: TaskStatus = parse_field(self.status.as_deref(), "Status is invalid.")?;
        Ok(StatusChange {
            id,
            status,
            result: self.result,
            output_path: self.output_path,
        })
    }
}

// ── Error handling ────────────────────────────────────────────────────

/// Client mistakes and rule violations are 400; everything else is 500.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl From<KanbanError> for ApiError {
    fn from(err: KanbanError) -> Self {
        let msg = err.to_string();
        match err {
            KanbanError::Validation(_) | KanbanError::WipLimitReached { .. } => {
                ApiError::BadRequest(msg)
            }
            KanbanError::TaskNotFound { ref id } => {
                tracing::warn!(%id, "status change for unknown task");
                ApiError::Internal(msg)
            }
            KanbanError::Conflict { ref path } => {
                tracing::warn!(%path, "document changed since it was loaded");
                ApiError::Internal(msg)
            }
            KanbanError::NotAFile { .. }
            | KanbanError::Transport(_)
            | KanbanError::MissingEnv(_)
            | KanbanError::Other(_) => {
                tracing::error!(error = %msg, "request failed");
                ApiError::Internal(msg)
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/state", get(get_state))
        .route("/tasks", post(create_task))
        .route("/tasks/{id}", patch(update_task))
        .route("/health", get(health_check))
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

async fn get_state(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state.service.ensure_bootstrap().await?;
    Ok(Json(snapshot))
}

async fn create_task(
    State(state): State<SharedState>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let input = req.validate()?;
    let task = state.service.create_task(input).await?;
    Ok((StatusCode::CREATED, Json(TaskResponse { task })))
}

async fn update_task(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let change = req.validate(id)?;
    let task = state.service.update_task_status(change).await?;
    Ok(Json(TaskResponse { task }))
}

// ── Tests ─────────────────────────────────────────────────────────────
