//! Request and response bodies.

use crate::types::TaskFilter;
use serde::{Deserialize, Serialize};

pub const EXECUTION_CREATED: &str = "OK";
pub const EXECUTION_COMPLETED: &str = "complete status is OK";
pub const EXECUTION_DELETED: &str = "delete status is OK";

/// `POST /tasks` body. Missing fields decode as empty and fail validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl CreateTaskRequest {
    /// Both fields must contain something other than whitespace.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("name is empty");
        }
        if self.description.trim().is_empty() {
            return Err("description is empty");
        }
        Ok(())
    }
}

/// `PATCH /tasks` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompleteTaskRequest {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub complete: bool,
}

/// `GET /tasks` query string. The first `complete` parameter wins.
#[derive(Debug, Clone, Default)]
pub struct ListTasksQuery {
    pub complete: Option<String>,
}

impl ListTasksQuery {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self {
            complete: pairs
                .into_iter()
                .find(|(key, _)| key == "complete")
                .map(|(_, value)| value),
        }
    }

    pub fn filter(&self) -> TaskFilter {
        TaskFilter::from_query_value(self.complete.as_deref())
    }
}

/// Acknowledgement for create, complete and delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    pub id: i64,
    pub name: String,
    pub execution: String,
}

impl TaskResponse {
    pub fn new(id: i64, name: impl Into<String>, execution: &str) -> Self {
        Self {
            id,
            name: name.into(),
            execution: execution.to_string(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
