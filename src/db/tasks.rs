//! Task CRUD and the completion transition.

use super::{Database, format_timestamp, now, parse_timestamp};
use crate::error::{StoreError, StoreResult};
use crate::types::{Task, TaskFilter};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};

const SELECT_TASK: &str = "SELECT id, name, description, time_of_create, time_of_complete, complete
     FROM tasks";

/// What `complete_task` did to the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The task went from incomplete to complete in this call.
    Transitioned,
    /// The task was already complete; nothing was written.
    AlreadyComplete,
}

/// Raw column values, before timestamp parsing.
struct TaskRow {
    id: i64,
    name: String,
    description: Option<String>,
    created: String,
    completed: Option<String>,
    complete: i64,
}

fn read_task_row(row: &Row) -> rusqlite::Result<TaskRow> {
    Ok(TaskRow {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        created: row.get("time_of_create")?,
        completed: row.get("time_of_complete")?,
        complete: row.get("complete")?,
    })
}

impl TaskRow {
    fn into_task(self) -> StoreResult<Task> {
        let created_at = parse_timestamp("time_of_create", &self.created)?;
        let completed_at = match self.completed.as_deref() {
            None | Some("") => None,
            Some(value) => Some(parse_timestamp("time_of_complete", value)?),
        };
        let complete = self.complete != 0;

        if complete != completed_at.is_some() {
            return Err(StoreError::Corrupt {
                id: self.id,
                reason: format!(
                    "complete = {} but time_of_complete is {}",
                    self.complete,
                    if completed_at.is_some() { "set" } else { "empty" }
                ),
            });
        }

        Ok(Task {
            id: self.id,
            name: self.name,
            description: self.description.unwrap_or_default(),
            created_at,
            completed_at,
            complete,
        })
    }
}

pub(crate) fn insert_task(conn: &Connection, name: &str, description: &str) -> StoreResult<i64> {
    conn.execute(
        "INSERT INTO tasks (name, description, time_of_create, complete)
         VALUES (?1, ?2, ?3, 0)",
        params![name, description, format_timestamp(now())],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Internal helper to get a task using an existing connection.
fn get_task_internal(conn: &Connection, id: i64) -> StoreResult<Option<Task>> {
    let row = conn
        .query_row(&format!("{} WHERE id = ?1", SELECT_TASK), params![id], read_task_row)
        .optional()?;
    row.map(TaskRow::into_task).transpose()
}

pub(crate) fn select_task(conn: &Connection, id: i64) -> StoreResult<Task> {
    get_task_internal(conn, id)?.ok_or(StoreError::NotFound { id })
}

pub(crate) fn select_tasks(conn: &Connection, filter: TaskFilter) -> StoreResult<Vec<Task>> {
    let sql = match filter {
        TaskFilter::All => format!("{} ORDER BY id", SELECT_TASK),
        TaskFilter::Completed => format!("{} WHERE complete = 1 ORDER BY id", SELECT_TASK),
        TaskFilter::Incomplete => format!("{} WHERE complete = 0 ORDER BY id", SELECT_TASK),
    };

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], read_task_row)?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter().map(TaskRow::into_task).collect()
}

/// Conditional update, then an existence check when nothing changed.
///
/// Both statements run in one IMMEDIATE transaction: the write lock is taken
/// up front, so a concurrent completion of the same id waits and then sees
/// `complete = 1`.
pub(crate) fn mark_complete(conn: &mut Connection, id: i64) -> StoreResult<Completion> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let updated = tx.execute(
        "UPDATE tasks
         SET complete = 1, time_of_complete = ?2
         WHERE id = ?1 AND complete = 0",
        params![id, format_timestamp(now())],
    )?;

    let outcome = if updated > 0 {
        Completion::Transitioned
    } else {
        let exists: Option<i64> = tx
            .query_row("SELECT 1 FROM tasks WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;
        match exists {
            Some(_) => Completion::AlreadyComplete,
            None => return Err(StoreError::NotFound { id }),
        }
    };

    tx.commit()?;
    Ok(outcome)
}

pub(crate) fn remove_task(conn: &Connection, id: i64) -> StoreResult<()> {
    let removed = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
    if removed == 0 {
        return Err(StoreError::NotFound { id });
    }
    Ok(())
}

impl Database {
    /// Create a new task and return its store-assigned id.
    ///
    /// Inputs are stored as given; non-empty validation belongs to the caller.
    pub fn create_task(&self, name: &str, description: &str) -> StoreResult<i64> {
        self.with_conn(|conn| insert_task(conn, name, description))
    }

    /// Get a task by id.
    pub fn get_task(&self, id: i64) -> StoreResult<Task> {
        self.with_conn(|conn| select_task(conn, id))
    }

    /// List tasks matching the filter, in insertion order.
    pub fn list_tasks(&self, filter: TaskFilter) -> StoreResult<Vec<Task>> {
        self.with_conn(|conn| select_tasks(conn, filter))
    }

    /// Mark a task complete. Completing a complete task is a no-op.
    pub fn complete_task(&self, id: i64) -> StoreResult<Completion> {
        self.with_conn_mut(|conn| mark_complete(conn, id))
    }

    /// Permanently delete a task.
    pub fn delete_task(&self, id: i64) -> StoreResult<()> {
        self.with_conn(|conn| remove_task(conn, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        Database::open_in_memory().expect("Failed to create in-memory database")
    }

    #[test]
    fn ids_are_assigned_in_order() {
        let db = setup_db();
        let first = db.create_task("a", "one").unwrap();
        let second = db.create_task("b", "two").unwrap();
        assert!(second > first);
    }

    #[test]
    fn store_accepts_empty_description() {
        let db = setup_db();
        let id = db.create_task("no details", "").unwrap();
        assert_eq!(db.get_task(id).unwrap().description, "");
    }

    #[test]
    fn null_description_reads_as_empty() {
        let db = setup_db();
        db.with_conn(|conn| {
            conn.execute("INSERT INTO tasks (name) VALUES ('legacy')", [])?;
            Ok(())
        })
        .unwrap();

        let tasks = db.list_tasks(TaskFilter::All).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].description, "");
        assert!(!tasks[0].complete);
    }

    #[test]
    fn complete_reports_transition_once() {
        let db = setup_db();
        let id = db.create_task("walk", "dog").unwrap();
        assert_eq!(db.complete_task(id).unwrap(), Completion::Transitioned);
        assert_eq!(db.complete_task(id).unwrap(), Completion::AlreadyComplete);
    }

    #[test]
    fn inconsistent_completion_columns_are_corrupt() {
        let db = setup_db();
        let id = db.create_task("half", "done").unwrap();
        db.with_conn(|conn| {
            conn.execute("UPDATE tasks SET complete = 1 WHERE id = ?1", params![id])?;
            Ok(())
        })
        .unwrap();

        let err = db.get_task(id).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { id: bad, .. } if bad == id));
    }

    #[test]
    fn check_constraint_rejects_other_flags() {
        let db = setup_db();
        let id = db.create_task("flag", "check").unwrap();
        let result = db.with_conn(|conn| {
            conn.execute("UPDATE tasks SET complete = 2 WHERE id = ?1", params![id])?;
            Ok(())
        });
        assert!(matches!(result, Err(StoreError::Sqlite(_))));
    }
}
