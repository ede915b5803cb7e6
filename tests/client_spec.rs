use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{TimeZone, Utc};

use taskpulse::client::{ApiClient, ApiError};
use taskpulse::models::*;
use taskpulse::session::{CredentialStore, SessionState, SessionSupervisor};

fn sample_user() -> User {
    User {
        id: 1,
        telegram_id: Some(4242),
        username: Some("alice".to_string()),
        full_name: Some("Alice".to_string()),
        login: Some("alice".to_string()),
        role: UserRole::MainOrganizer,
        created_by_id: None,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

fn sample_task() -> Task {
    Task {
        id: 1,
        title: "Prepare the venue".to_string(),
        description: None,
        status: TaskStatus::InProgress,
        project_id: None,
        workgroup_id: Some(3),
        created_by_id: 1,
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap(),
        due_date: Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()),
        completed_at: None,
        poll_interval_days: Some(2),
        poll_time: Some("10:00".to_string()),
        last_polled_at: None,
        assignee_ids: vec![1],
        assignees: vec![sample_user()],
        poll_responses: vec![],
    }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

async fn login_handler(Json(req): Json<LoginRequest>) -> Result<Json<TokenResponse>, StatusCode> {
    if req.login == "alice" && req.password == "x" {
        Ok(Json(TokenResponse {
            access_token: "T1".to_string(),
            token_type: "bearer".to_string(),
            user: sample_user(),
        }))
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

async fn me_handler(headers: HeaderMap) -> Result<Json<User>, StatusCode> {
    if bearer(&headers) == Some("T1") {
        Ok(Json(sample_user()))
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

async fn tasks_handler(headers: HeaderMap) -> Result<Json<Vec<Task>>, StatusCode> {
    if bearer(&headers) == Some("T1") {
        Ok(Json(vec![sample_task()]))
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

async fn task_handler(
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<Task>, StatusCode> {
    if bearer(&headers) != Some("T1") {
        return Err(StatusCode::UNAUTHORIZED);
    }
    if id == 1 {
        Ok(Json(sample_task()))
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

async fn nudge_handler(Path(_id): Path<i64>, headers: HeaderMap) -> StatusCode {
    if bearer(&headers) == Some("T1") {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::UNAUTHORIZED
    }
}

fn stub_router() -> Router {
    Router::new()
        .route("/api/auth/login", post(login_handler))
        .route("/api/users/me", get(me_handler))
        .route("/api/tasks/", get(tasks_handler))
        .route("/api/tasks/{id}", get(task_handler))
        .route("/api/tasks/{id}/nudge", post(nudge_handler))
}

/// Serve a router on an ephemeral port and return the API base URL.
async fn spawn_stub(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api", addr)
}

fn login_request(login: &str, password: &str) -> LoginRequest {
    LoginRequest {
        login: login.to_string(),
        password: password.to_string(),
    }
}

mod status_mapping {
    use super::*;

    #[tokio::test]
    async fn login_success_returns_token_and_profile() {
        let client = ApiClient::new(spawn_stub(stub_router()).await);
        let response = client.login(&login_request("alice", "x")).await.unwrap();
        assert_eq!(response.access_token, "T1");
        assert_eq!(response.user.id, 1);
    }

    #[tokio::test]
    async fn rejected_login_is_unauthorized() {
        let client = ApiClient::new(spawn_stub(stub_router()).await);
        let err = client.login(&login_request("alice", "wrong")).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[tokio::test]
    async fn whoami_with_wrong_token_is_unauthorized() {
        let client = ApiClient::new(spawn_stub(stub_router()).await);
        let err = client.whoami("T_stale").await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[tokio::test]
    async fn missing_task_is_not_found() {
        let client = ApiClient::new(spawn_stub(stub_router()).await);
        let err = client.get_task("T1", 999).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn undecodable_payload_is_malformed() {
        let app = Router::new().route("/api/users/me", get(|| async { "not json" }));
        let client = ApiClient::new(spawn_stub(app).await);
        let err = client.whoami("T1").await.unwrap_err();
        assert!(matches!(err, ApiError::Malformed(_)));
    }

    #[tokio::test]
    async fn wrong_shape_payload_is_malformed() {
        // Valid JSON that is not a profile record.
        let app = Router::new().route(
            "/api/users/me",
            get(|| async { Json(serde_json::json!({ "unexpected": true })) }),
        );
        let client = ApiClient::new(spawn_stub(app).await);
        let err = client.whoami("T1").await.unwrap_err();
        assert!(matches!(err, ApiError::Malformed(_)));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_failure() {
        // Reserved port with nothing listening.
        let client = ApiClient::new("http://127.0.0.1:1/api");
        let err = client.whoami("T1").await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
    }

    #[tokio::test]
    async fn empty_body_success_is_ok() {
        let client = ApiClient::new(spawn_stub(stub_router()).await);
        client.nudge_task("T1", 1).await.unwrap();
    }

    #[tokio::test]
    async fn list_tasks_decodes_the_payload() {
        let client = ApiClient::new(spawn_stub(stub_router()).await);
        let tasks = client.list_tasks("T1").await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].status, TaskStatus::InProgress);
        assert_eq!(tasks[0].assignees[0].display_name(), "Alice");
    }
}

mod session_over_http {
    use super::*;

    #[tokio::test]
    async fn login_then_validate_authenticates() {
        let client = ApiClient::new(spawn_stub(stub_router()).await);
        let store = CredentialStore::open_memory();
        let supervisor = SessionSupervisor::new(client, store.clone());

        let user = supervisor.login(&login_request("alice", "x")).await.unwrap();
        assert_eq!(user.login.as_deref(), Some("alice"));
        assert_eq!(store.get(), Some("T1".to_string()));

        let state = supervisor.validate_session().await.unwrap();
        assert!(matches!(state, SessionState::Authenticated(u) if u.id == 1));
    }

    #[tokio::test]
    async fn rejected_stored_token_drops_the_session() {
        let client = ApiClient::new(spawn_stub(stub_router()).await);
        let store = CredentialStore::open_memory();
        store.set("T_revoked").unwrap();
        let supervisor = SessionSupervisor::new(client, store.clone());
        assert_eq!(supervisor.state(), SessionState::Validating);

        let state = supervisor.validate_session().await.unwrap();
        assert_eq!(state, SessionState::Unauthenticated);
        assert_eq!(store.get(), None);
    }
}
