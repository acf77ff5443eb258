mod handlers;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::registry::Registry;

pub fn create_router(registry: Registry) -> Router {
    let api = Router::new()
        // Tasks
        .route("/tasks", get(handlers::list_tasks))
        .route("/tasks", post(handlers::create_task))
        .route("/tasks", delete(handlers::clear_tasks))
        .route("/tasks/{id}", get(handlers::get_task))
        .route("/tasks/{id}", put(handlers::update_task))
        .route("/tasks/{id}", delete(handlers::remove_task))
        // Subtasks
        .route("/subtasks", get(handlers::list_subtasks))
        .route("/subtasks", post(handlers::create_subtask))
        .route("/subtasks", delete(handlers::clear_subtasks))
        .route("/subtasks/{id}", get(handlers::get_subtask))
        .route("/subtasks/{id}", put(handlers::update_subtask))
        .route("/subtasks/{id}", delete(handlers::remove_subtask))
        // Epics
        .route("/epics", get(handlers::list_epics))
        .route("/epics", post(handlers::create_epic))
        .route("/epics", delete(handlers::clear_epics))
        .route("/epics/{id}", get(handlers::get_epic))
        .route("/epics/{id}", put(handlers::update_epic))
        .route("/epics/{id}", delete(handlers::remove_epic))
        .route("/epics/{id}/subtasks", get(handlers::list_epic_subtasks))
        .route("/epics/{id}/subtasks", post(handlers::create_epic_subtask))
        // Derived views
        .route("/history", get(handlers::get_history))
        .route("/prioritized", get(handlers::get_prioritized))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(registry)
}
