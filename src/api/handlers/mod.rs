use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::error::RegistryError;
use crate::models::{
    Epic, EpicInput, Subtask, SubtaskInput, Task, TaskEntry, TaskId, TaskInput,
};
use crate::registry::Registry;

// ============================================================
// Error Handling
// ============================================================

/// Map a registry error to an outward status. The taxonomy is typed, so no
/// message sniffing is needed: absent ids are 404, schedule conflicts 409,
/// structurally invalid references 422.
fn registry_error(err: RegistryError) -> (StatusCode, String) {
    let status = match &err {
        RegistryError::NotFound { .. } => StatusCode::NOT_FOUND,
        RegistryError::TimeConflict { .. } => StatusCode::CONFLICT,
        RegistryError::InvalidReference(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };
    tracing::warn!("request rejected: {err}");
    (status, err.to_string())
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Tasks
// ============================================================

pub async fn list_tasks(State(registry): State<Registry>) -> Json<Vec<Task>> {
    Json(registry.all_tasks())
}

pub async fn create_task(
    State(registry): State<Registry>,
    Json(input): Json<TaskInput>,
) -> Result<(StatusCode, Json<Task>), (StatusCode, String)> {
    registry
        .add_task(input)
        .map(|task| (StatusCode::CREATED, Json(task)))
        .map_err(registry_error)
}

pub async fn get_task(
    State(registry): State<Registry>,
    Path(id): Path<TaskId>,
) -> Result<Json<Task>, (StatusCode, String)> {
    registry.get_task(id).map(Json).map_err(registry_error)
}

pub async fn update_task(
    State(registry): State<Registry>,
    Path(id): Path<TaskId>,
    Json(input): Json<TaskInput>,
) -> Result<Json<Task>, (StatusCode, String)> {
    registry
        .update_task(id, input)
        .map(Json)
        .map_err(registry_error)
}

pub async fn remove_task(
    State(registry): State<Registry>,
    Path(id): Path<TaskId>,
) -> Result<StatusCode, (StatusCode, String)> {
    registry
        .remove_task(id)
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(registry_error)
}

pub async fn clear_tasks(State(registry): State<Registry>) -> StatusCode {
    registry.clear_tasks();
    StatusCode::NO_CONTENT
}

// ============================================================
// Subtasks
// ============================================================

pub async fn list_subtasks(State(registry): State<Registry>) -> Json<Vec<Subtask>> {
    Json(registry.all_subtasks())
}

pub async fn create_subtask(
    State(registry): State<Registry>,
    Json(input): Json<SubtaskInput>,
) -> Result<(StatusCode, Json<Subtask>), (StatusCode, String)> {
    registry
        .add_subtask(input)
        .map(|subtask| (StatusCode::CREATED, Json(subtask)))
        .map_err(registry_error)
}

pub async fn get_subtask(
    State(registry): State<Registry>,
    Path(id): Path<TaskId>,
) -> Result<Json<Subtask>, (StatusCode, String)> {
    registry.get_subtask(id).map(Json).map_err(registry_error)
}

pub async fn update_subtask(
    State(registry): State<Registry>,
    Path(id): Path<TaskId>,
    Json(input): Json<SubtaskInput>,
) -> Result<Json<Subtask>, (StatusCode, String)> {
    registry
        .update_subtask(id, input)
        .map(Json)
        .map_err(registry_error)
}

pub async fn remove_subtask(
    State(registry): State<Registry>,
    Path(id): Path<TaskId>,
) -> Result<StatusCode, (StatusCode, String)> {
    registry
        .remove_subtask(id)
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(registry_error)
}

pub async fn clear_subtasks(State(registry): State<Registry>) -> StatusCode {
    registry.clear_subtasks();
    StatusCode::NO_CONTENT
}

// ============================================================
// Epics
// ============================================================

pub async fn list_epics(State(registry): State<Registry>) -> Json<Vec<Epic>> {
    Json(registry.all_epics())
}

pub async fn create_epic(
    State(registry): State<Registry>,
    Json(input): Json<EpicInput>,
) -> Result<(StatusCode, Json<Epic>), (StatusCode, String)> {
    registry
        .add_epic(input)
        .map(|epic| (StatusCode::CREATED, Json(epic)))
        .map_err(registry_error)
}

pub async fn get_epic(
    State(registry): State<Registry>,
    Path(id): Path<TaskId>,
) -> Result<Json<Epic>, (StatusCode, String)> {
    registry.get_epic(id).map(Json).map_err(registry_error)
}

pub async fn update_epic(
    State(registry): State<Registry>,
    Path(id): Path<TaskId>,
    Json(input): Json<EpicInput>,
) -> Result<Json<Epic>, (StatusCode, String)> {
    registry
        .update_epic(id, input)
        .map(Json)
        .map_err(registry_error)
}

pub async fn remove_epic(
    State(registry): State<Registry>,
    Path(id): Path<TaskId>,
) -> Result<StatusCode, (StatusCode, String)> {
    registry
        .remove_epic(id)
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(registry_error)
}

pub async fn clear_epics(State(registry): State<Registry>) -> StatusCode {
    registry.clear_epics();
    StatusCode::NO_CONTENT
}

pub async fn list_epic_subtasks(
    State(registry): State<Registry>,
    Path(id): Path<TaskId>,
) -> Result<Json<Vec<Subtask>>, (StatusCode, String)> {
    registry.epic_subtasks(id).map(Json).map_err(registry_error)
}

/// Create a subtask under the epic named in the path.
pub async fn create_epic_subtask(
    State(registry): State<Registry>,
    Path(epic_id): Path<TaskId>,
    Json(fields): Json<TaskInput>,
) -> Result<(StatusCode, Json<Subtask>), (StatusCode, String)> {
    registry
        .add_subtask(SubtaskInput { epic_id, fields })
        .map(|subtask| (StatusCode::CREATED, Json(subtask)))
        .map_err(registry_error)
}

// ============================================================
// Derived views
// ============================================================

pub async fn get_history(State(registry): State<Registry>) -> Json<Vec<TaskEntry>> {
    Json(registry.history())
}

pub async fn get_prioritized(State(registry): State<Registry>) -> Json<Vec<TaskEntry>> {
    Json(registry.prioritized())
}
