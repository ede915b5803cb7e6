//! HTTP client for the TaskPulse API.
//!
//! Configuration is via environment variables:
//! - `TASKPULSE_URL` - Base URL (default: `http://localhost:8000/api`)
//!
//! The bearer token is not part of the client's state: credentials are owned
//! by the session layer, and every authorized call takes the token it should
//! present. This keeps an in-flight request tied to the exact token it was
//! issued with, which the session staleness check depends on.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::models::*;
use crate::session::AuthProvider;

/// Default URL for local development.
const DEFAULT_URL: &str = "http://localhost:8000/api";

/// HTTP client errors.
///
/// `Unauthorized`, `Network` and `Malformed` are the classes the session
/// layer distinguishes; the rest map the remaining HTTP statuses for data
/// endpoints.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: credential rejected by server")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Network failure: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Server error: {0}")]
    Server(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// HTTP client for the TaskPulse API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    /// Create client from environment variables.
    pub fn from_env() -> Self {
        let base_url = std::env::var("TASKPULSE_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
        Self::new(base_url)
    }

    /// Create with an explicit base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::new(),
        }
    }

    /// Build a request with a bearer token.
    fn request(&self, method: reqwest::Method, path: &str, token: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, &url).bearer_auth(token)
    }

    /// Build a request without credentials (login only).
    fn request_anonymous(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, &url)
    }

    /// Handle response, converting HTTP errors to ApiError.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(Self::status_error(status, body))
        }
    }

    /// Handle response that may return empty body (204 No Content).
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<(), ApiError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(Self::status_error(status, body))
        }
    }

    fn status_error(status: StatusCode, body: String) -> ApiError {
        match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
            StatusCode::NOT_FOUND => ApiError::NotFound(body),
            StatusCode::BAD_REQUEST => ApiError::BadRequest(body),
            _ => ApiError::Server(format!("{}: {}", status, body)),
        }
    }

    // ============================================================
    // Auth Operations
    // ============================================================

    /// Sign in with login credentials.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<TokenResponse, ApiError> {
        let response = self
            .request_anonymous(reqwest::Method::POST, "/auth/login")
            .json(credentials)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Fetch the profile the given token belongs to.
    pub async fn whoami(&self, token: &str) -> Result<User, ApiError> {
        let response = self
            .request(reqwest::Method::GET, "/users/me", token)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Send a test message to the current user's Telegram account.
    pub async fn test_telegram(&self, token: &str) -> Result<(), ApiError> {
        let response = self
            .request(reqwest::Method::POST, "/users/me/test-telegram", token)
            .send()
            .await?;
        self.handle_empty_response(response).await
    }

    // ============================================================
    // Task Operations
    // ============================================================

    /// List all tasks visible to the current user.
    pub async fn list_tasks(&self, token: &str) -> Result<Vec<Task>, ApiError> {
        let response = self
            .request(reqwest::Method::GET, "/tasks/", token)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Get a task by ID.
    pub async fn get_task(&self, token: &str, id: i64) -> Result<Task, ApiError> {
        let response = self
            .request(reqwest::Method::GET, &format!("/tasks/{}", id), token)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Create a task.
    pub async fn create_task(&self, token: &str, input: &CreateTaskInput) -> Result<Task, ApiError> {
        let response = self
            .request(reqwest::Method::POST, "/tasks/", token)
            .json(input)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Update a task.
    pub async fn update_task(
        &self,
        token: &str,
        id: i64,
        input: &UpdateTaskInput,
    ) -> Result<Task, ApiError> {
        let response = self
            .request(reqwest::Method::PUT, &format!("/tasks/{}", id), token)
            .json(input)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Delete a task.
    pub async fn delete_task(&self, token: &str, id: i64) -> Result<(), ApiError> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("/tasks/{}", id), token)
            .send()
            .await?;
        self.handle_empty_response(response).await
    }

    /// Nudge a task's assignees with an immediate Telegram reminder.
    pub async fn nudge_task(&self, token: &str, id: i64) -> Result<(), ApiError> {
        let response = self
            .request(reqwest::Method::POST, &format!("/tasks/{}/nudge", id), token)
            .send()
            .await?;
        self.handle_empty_response(response).await
    }

    /// Users assignable to tasks, optionally narrowed to a workgroup.
    pub async fn assignable_users(
        &self,
        token: &str,
        workgroup_id: Option<i64>,
    ) -> Result<Vec<User>, ApiError> {
        let path = match workgroup_id {
            Some(id) => format!("/tasks/assignable-users?workgroup_id={}", id),
            None => "/tasks/assignable-users".to_string(),
        };
        let response = self.request(reqwest::Method::GET, &path, token).send().await?;
        self.handle_response(response).await
    }

    // ============================================================
    // Workgroup Operations
    // ============================================================

    /// List all workgroups.
    pub async fn list_workgroups(&self, token: &str) -> Result<Vec<Workgroup>, ApiError> {
        let response = self
            .request(reqwest::Method::GET, "/workgroups/", token)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Get a workgroup by ID.
    pub async fn get_workgroup(&self, token: &str, id: i64) -> Result<Workgroup, ApiError> {
        let response = self
            .request(reqwest::Method::GET, &format!("/workgroups/{}", id), token)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Create a workgroup.
    pub async fn create_workgroup(
        &self,
        token: &str,
        input: &CreateWorkgroupInput,
    ) -> Result<Workgroup, ApiError> {
        let response = self
            .request(reqwest::Method::POST, "/workgroups/", token)
            .json(input)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Update a workgroup.
    pub async fn update_workgroup(
        &self,
        token: &str,
        id: i64,
        input: &UpdateWorkgroupInput,
    ) -> Result<Workgroup, ApiError> {
        let response = self
            .request(reqwest::Method::PUT, &format!("/workgroups/{}", id), token)
            .json(input)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Delete a workgroup.
    pub async fn delete_workgroup(&self, token: &str, id: i64) -> Result<(), ApiError> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("/workgroups/{}", id), token)
            .send()
            .await?;
        self.handle_empty_response(response).await
    }

    // ============================================================
    // User Operations
    // ============================================================

    /// List all users visible to the current user.
    pub async fn list_users(&self, token: &str) -> Result<Vec<User>, ApiError> {
        let response = self
            .request(reqwest::Method::GET, "/users/", token)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Get a user by ID.
    pub async fn get_user(&self, token: &str, id: i64) -> Result<User, ApiError> {
        let response = self
            .request(reqwest::Method::GET, &format!("/users/{}", id), token)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Create a user.
    pub async fn create_user(&self, token: &str, input: &CreateUserInput) -> Result<User, ApiError> {
        let response = self
            .request(reqwest::Method::POST, "/users/", token)
            .json(input)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Update a user.
    pub async fn update_user(
        &self,
        token: &str,
        id: i64,
        input: &UpdateUserInput,
    ) -> Result<User, ApiError> {
        let response = self
            .request(reqwest::Method::PUT, &format!("/users/{}", id), token)
            .json(input)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Delete a user.
    pub async fn delete_user(&self, token: &str, id: i64) -> Result<(), ApiError> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("/users/{}", id), token)
            .send()
            .await?;
        self.handle_empty_response(response).await
    }
}

impl AuthProvider for ApiClient {
    async fn login(&self, credentials: &LoginRequest) -> Result<TokenResponse, ApiError> {
        ApiClient::login(self, credentials).await
    }

    async fn whoami(&self, token: &str) -> Result<User, ApiError> {
        ApiClient::whoami(self, token).await
    }
}
