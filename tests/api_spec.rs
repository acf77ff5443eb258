use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

use taskboard::api::create_router;
use taskboard::models::{Epic, Subtask, Task, TaskEntry};
use taskboard::registry::Registry;

fn setup() -> TestServer {
    let registry = Registry::open_memory();
    let app = create_router(registry);
    TestServer::new(app).expect("Failed to create test server")
}

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, hour, minute, 0).unwrap()
}

async fn create_test_epic(server: &TestServer) -> Epic {
    server
        .post("/api/v1/epics")
        .json(&json!({ "title": "Release", "description": "ship it" }))
        .await
        .json::<Epic>()
}

mod tasks {
    use super::*;

    #[tokio::test]
    async fn create_returns_201_with_the_assigned_id() {
        let server = setup();

        let response = server
            .post("/api/v1/tasks")
            .json(&json!({
                "title": "Write report",
                "start_time": at(9, 0),
                "duration_minutes": 60
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let task: Task = response.json();
        assert_eq!(task.id, 1);
        assert_eq!(task.title, "Write report");
        assert_eq!(task.status.as_str(), "new");
    }

    #[tokio::test]
    async fn get_of_an_unknown_id_is_404() {
        let server = setup();

        let response = server.get("/api/v1/tasks/42").await;

        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn overlapping_create_is_409_and_not_stored() {
        let server = setup();

        server
            .post("/api/v1/tasks")
            .json(&json!({ "title": "A", "start_time": at(9, 0), "duration_minutes": 60 }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post("/api/v1/tasks")
            .json(&json!({ "title": "B", "start_time": at(9, 30), "duration_minutes": 60 }))
            .await;
        response.assert_status(StatusCode::CONFLICT);

        let tasks: Vec<Task> = server.get("/api/v1/tasks").await.json();
        assert_eq!(tasks.len(), 1);
    }

    #[tokio::test]
    async fn update_fully_replaces_and_delete_returns_204() {
        let server = setup();

        let task: Task = server
            .post("/api/v1/tasks")
            .json(&json!({ "title": "Draft", "duration_minutes": 15 }))
            .await
            .json();

        let updated: Task = server
            .put(&format!("/api/v1/tasks/{}", task.id))
            .json(&json!({ "title": "Final", "status": "done" }))
            .await
            .json();
        assert_eq!(updated.id, task.id);
        assert_eq!(updated.title, "Final");
        // full replace: the omitted duration resets
        assert_eq!(updated.duration_minutes, 0);

        let response = server.delete(&format!("/api/v1/tasks/{}", task.id)).await;
        response.assert_status(StatusCode::NO_CONTENT);

        server
            .get(&format!("/api/v1/tasks/{}", task.id))
            .await
            .assert_status_not_found();
    }
}

mod subtasks {
    use super::*;

    #[tokio::test]
    async fn nested_create_attaches_to_the_epic_in_the_path() {
        let server = setup();
        let epic = create_test_epic(&server).await;

        let response = server
            .post(&format!("/api/v1/epics/{}/subtasks", epic.id()))
            .json(&json!({ "title": "Deploy", "status": "done" }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let subtask: Subtask = response.json();
        assert_eq!(subtask.epic_id, epic.id());

        let listed: Vec<Subtask> = server
            .get(&format!("/api/v1/epics/{}/subtasks", epic.id()))
            .await
            .json();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id(), subtask.id());
    }

    #[tokio::test]
    async fn create_against_a_missing_epic_is_404() {
        let server = setup();

        let response = server
            .post("/api/v1/subtasks")
            .json(&json!({ "epic_id": 99, "title": "Orphan" }))
            .await;

        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn self_referencing_update_is_422() {
        let server = setup();
        let epic = create_test_epic(&server).await;

        let subtask: Subtask = server
            .post(&format!("/api/v1/epics/{}/subtasks", epic.id()))
            .json(&json!({ "title": "Deploy" }))
            .await
            .json();

        let response = server
            .put(&format!("/api/v1/subtasks/{}", subtask.id()))
            .json(&json!({ "epic_id": subtask.id(), "title": "Deploy" }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
}

mod epics {
    use super::*;

    #[tokio::test]
    async fn aggregated_state_is_visible_through_get() {
        let server = setup();
        let epic = create_test_epic(&server).await;

        server
            .post(&format!("/api/v1/epics/{}/subtasks", epic.id()))
            .json(&json!({
                "title": "S1", "status": "new",
                "start_time": at(9, 0), "duration_minutes": 30
            }))
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post(&format!("/api/v1/epics/{}/subtasks", epic.id()))
            .json(&json!({
                "title": "S2", "status": "done",
                "start_time": at(10, 0), "duration_minutes": 30
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let fetched: Epic = server
            .get(&format!("/api/v1/epics/{}", epic.id()))
            .await
            .json();
        assert_eq!(fetched.task.status.as_str(), "in_progress");
        assert_eq!(fetched.task.start_time, Some(at(9, 0)));
        assert_eq!(fetched.end_time, Some(at(10, 30)));
        assert_eq!(fetched.task.duration_minutes, 60);
    }

    #[tokio::test]
    async fn delete_cascades_to_subtasks() {
        let server = setup();
        let epic = create_test_epic(&server).await;

        let subtask: Subtask = server
            .post(&format!("/api/v1/epics/{}/subtasks", epic.id()))
            .json(&json!({ "title": "S1" }))
            .await
            .json();

        server
            .delete(&format!("/api/v1/epics/{}", epic.id()))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        server
            .get(&format!("/api/v1/subtasks/{}", subtask.id()))
            .await
            .assert_status_not_found();
    }
}

mod views {
    use super::*;

    #[tokio::test]
    async fn prioritized_lists_timed_items_in_start_order() {
        let server = setup();
        let epic = create_test_epic(&server).await;

        server
            .post("/api/v1/tasks")
            .json(&json!({ "title": "Noon", "start_time": at(12, 0), "duration_minutes": 30 }))
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post(&format!("/api/v1/epics/{}/subtasks", epic.id()))
            .json(&json!({ "title": "Dawn", "start_time": at(6, 0), "duration_minutes": 30 }))
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post("/api/v1/tasks")
            .json(&json!({ "title": "Someday" }))
            .await
            .assert_status(StatusCode::CREATED);

        let entries: Vec<TaskEntry> = server.get("/api/v1/prioritized").await.json();
        let titles: Vec<&str> = entries.iter().map(|e| e.record().title.as_str()).collect();
        assert_eq!(titles, vec!["Dawn", "Noon"]);
    }

    #[tokio::test]
    async fn history_reflects_gets_in_order() {
        let server = setup();
        let epic = create_test_epic(&server).await;

        let task: Task = server
            .post("/api/v1/tasks")
            .json(&json!({ "title": "Solo" }))
            .await
            .json();

        server.get(&format!("/api/v1/tasks/{}", task.id)).await;
        server.get(&format!("/api/v1/epics/{}", epic.id())).await;
        server.get(&format!("/api/v1/tasks/{}", task.id)).await;

        let entries: Vec<TaskEntry> = server.get("/api/v1/history").await.json();
        let ids: Vec<u32> = entries.iter().map(TaskEntry::id).collect();
        assert_eq!(ids, vec![epic.id(), task.id]);
    }
}
