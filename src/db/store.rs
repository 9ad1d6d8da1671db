//! Async facade over the blocking task operations.
//!
//! Every call runs on tokio's blocking pool. Dropping the returned future
//! cancels the operation: the guard raises the operation's [`CancelFlag`] and
//! the statement running under [`Database::with_interrupt`] is interrupted.
//! Wrap a call in `tokio::time::timeout` to give it a deadline.

use super::tasks::{self, Completion};
use super::{CancelFlag, Database};
use crate::error::{StoreError, StoreResult};
use crate::types::{Task, TaskFilter};
use rusqlite::Connection;

/// Shared, cloneable handle to the task store.
#[derive(Clone)]
pub struct TaskStore {
    db: Database,
}

/// Raises the flag unless the operation finished first.
struct CancelOnDrop {
    flag: CancelFlag,
    armed: bool,
}

impl CancelOnDrop {
    fn new(flag: CancelFlag) -> Self {
        Self { flag, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if self.armed {
            self.flag.cancel();
        }
    }
}

impl TaskStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create(&self, name: String, description: String) -> StoreResult<i64> {
        self.run(move |conn| tasks::insert_task(conn, &name, &description))
            .await
    }

    pub async fn get(&self, id: i64) -> StoreResult<Task> {
        self.run(move |conn| tasks::select_task(conn, id)).await
    }

    pub async fn list(&self, filter: TaskFilter) -> StoreResult<Vec<Task>> {
        self.run(move |conn| tasks::select_tasks(conn, filter)).await
    }

    pub async fn complete(&self, id: i64) -> StoreResult<Completion> {
        self.run(move |conn| tasks::mark_complete(conn, id)).await
    }

    pub async fn delete(&self, id: i64) -> StoreResult<()> {
        self.run(move |conn| tasks::remove_task(conn, id)).await
    }

    async fn run<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let flag = CancelFlag::new();
        let guard = CancelOnDrop::new(flag.clone());
        let db = self.db.clone();

        let joined = tokio::task::spawn_blocking(move || db.with_interrupt(&flag, f)).await;
        guard.disarm();

        match joined {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(StoreError::Canceled),
            Err(e) => Err(StoreError::Join(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_store() -> TaskStore {
        TaskStore::new(Database::open_in_memory().unwrap())
    }

    #[tokio::test]
    async fn async_round_trip() {
        let store = setup_store();
        let id = store
            .create("Buy milk".to_string(), "2% gallon".to_string())
            .await
            .unwrap();

        let task = store.get(id).await.unwrap();
        assert_eq!(task.name, "Buy milk");
        assert!(!task.complete);

        assert_eq!(store.complete(id).await.unwrap(), Completion::Transitioned);
        assert_eq!(store.list(TaskFilter::Completed).await.unwrap().len(), 1);

        store.delete(id).await.unwrap();
        assert!(store.get(id).await.unwrap_err().is_not_found());
    }

    #[test]
    fn dropped_guard_raises_flag() {
        let flag = CancelFlag::new();
        {
            let _guard = CancelOnDrop::new(flag.clone());
        }
        assert!(flag.is_canceled());

        let flag = CancelFlag::new();
        CancelOnDrop::new(flag.clone()).disarm();
        assert!(!flag.is_canceled());
    }
}
