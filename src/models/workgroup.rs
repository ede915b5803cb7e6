use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::User;

/// A named group of users that tasks can be scoped to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workgroup {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub members: Vec<User>,
}

/// Input for creating a workgroup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkgroupInput {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub member_ids: Vec<i64>,
}

/// Input for updating a workgroup. Absent fields are left unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateWorkgroupInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub member_ids: Option<Vec<i64>>,
}
