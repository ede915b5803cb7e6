use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An account in the tracker.
///
/// Most identity fields are optional: bot-only workers may have nothing but a
/// Telegram id, while web users carry a login and (server-side) a password.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub telegram_id: Option<i64>,
    pub username: Option<String>,
    pub full_name: Option<String>,
    /// Sign-in name. Absent for bot-only workers.
    pub login: Option<String>,
    pub role: UserRole,
    /// The user who created this account, for the role hierarchy.
    pub created_by_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Best human-readable name, falling back through the identity fields.
    pub fn display_name(&self) -> String {
        self.full_name
            .clone()
            .or_else(|| self.username.clone())
            .or_else(|| self.login.clone())
            .unwrap_or_else(|| format!("user {}", self.id))
    }
}

/// The role of a user in the tracker hierarchy.
///
/// - `ProjectManager`: One person, full access
/// - `MainOrganizer`: A couple of people, manages organizers and tasks
/// - `Responsible`: Several people, owns tasks within their workgroups
/// - `Worker`: Many people, reachable only through the Telegram bot
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    ProjectManager,
    MainOrganizer,
    Responsible,
    Worker,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectManager => "project_manager",
            Self::MainOrganizer => "main_organizer",
            Self::Responsible => "responsible",
            Self::Worker => "worker",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "project_manager" => Some(Self::ProjectManager),
            "main_organizer" => Some(Self::MainOrganizer),
            "responsible" => Some(Self::Responsible),
            "worker" => Some(Self::Worker),
            _ => None,
        }
    }

    /// Display label. Total over the enum so a new role cannot silently
    /// render as a default string.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ProjectManager => "Project manager",
            Self::MainOrganizer => "Main organizer",
            Self::Responsible => "Responsible",
            Self::Worker => "Worker",
        }
    }
}

/// Input for creating a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserInput {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub role: UserRole,
    pub telegram_id: Option<i64>,
    pub login: Option<String>,
    pub password: Option<String>,
}

/// Input for updating a user. Absent fields are left unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateUserInput {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<UserRole>,
    pub login: Option<String>,
    pub password: Option<String>,
    pub telegram_id: Option<i64>,
}

/// Credentials for signing in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

/// Response from a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Opaque bearer token; the client never inspects its structure.
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}
