//! HTTP adapter: axum router over the task store.
//!
//! | Method | Path | Handler |
//! |---|---|---|
//! | POST | `/tasks` | [`handlers::create_task`] |
//! | GET | `/tasks` | [`handlers::list_tasks`] |
//! | PATCH | `/tasks` | [`handlers::complete_task`] |
//! | GET | `/tasks/{id}` | [`handlers::get_task`] |
//! | DELETE | `/tasks/{id}` | [`handlers::delete_task`] |
//! | GET | `/health` | [`handlers::health`] |

pub mod dto;
pub mod error;
pub mod handlers;
mod server;

pub use server::{IdleTimeoutListener, ServeLimits, ServeOutcome, serve, shutdown_signal};

use crate::db::TaskStore;
use axum::{
    Router,
    routing::{get, post},
};
use std::time::Duration;
use tower_http::trace::TraceLayer;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: TaskStore,
    /// Deadline for a whole request, body read included.
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(store: TaskStore, request_timeout: Duration) -> Self {
        Self {
            store,
            request_timeout,
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/tasks",
            post(handlers::create_task)
                .get(handlers::list_tasks)
                .patch(handlers::complete_task),
        )
        .route(
            "/tasks/{id}",
            get(handlers::get_task).delete(handlers::delete_task),
        )
        .route("/health", get(handlers::health))
        .fallback(handlers::no_route)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
