//! Core types for the todo API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted unit of work.
///
/// `complete` mirrors `completed_at.is_some()`; the store refuses to load a
/// row where the two disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub complete: bool,
}

/// Selection applied when listing tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    #[default]
    All,
    Completed,
    Incomplete,
}

impl TaskFilter {
    /// Map the `?complete=` query value onto a filter. Only the exact strings
    /// `true` and `false` narrow the list; anything else, or no value, is all.
    pub fn from_query_value(value: Option<&str>) -> Self {
        match value {
            Some("true") => TaskFilter::Completed,
            Some("false") => TaskFilter::Incomplete,
            _ => TaskFilter::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskFilter::All => "all",
            TaskFilter::Completed => "completed",
            TaskFilter::Incomplete => "incomplete",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_from_query_value() {
        assert_eq!(TaskFilter::from_query_value(None), TaskFilter::All);
        assert_eq!(TaskFilter::from_query_value(Some("true")), TaskFilter::Completed);
        assert_eq!(TaskFilter::from_query_value(Some("false")), TaskFilter::Incomplete);
    }

    #[test]
    fn unrecognized_query_values_list_everything() {
        for value in ["", "TRUE", "1", "yes", "False"] {
            assert_eq!(TaskFilter::from_query_value(Some(value)), TaskFilter::All);
        }
    }

    #[test]
    fn task_serializes_missing_completion_as_null() {
        let task = Task {
            id: 1,
            name: "Buy milk".to_string(),
            description: "2% gallon".to_string(),
            created_at: "2024-05-01T12:00:00Z".parse().unwrap(),
            completed_at: None,
            complete: false,
        };
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["completed_at"], serde_json::Value::Null);
        assert_eq!(json["complete"], false);
        assert_eq!(json["id"], 1);
    }
}
