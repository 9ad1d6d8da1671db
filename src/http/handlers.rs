//! Route handlers.
//!
//! Each handler takes one deadline when it starts. The body read and every
//! store call share it, and the handler renders either a success body or an
//! [`ApiError`].

use super::AppState;
use super::dto::{
    CompleteTaskRequest, CreateTaskRequest, EXECUTION_COMPLETED, EXECUTION_CREATED,
    EXECUTION_DELETED, HealthResponse, ListTasksQuery, TaskResponse,
};
use super::error::*;
use crate::error::StoreResult;
use crate::types::Task;
use axum::{
    Json,
    body::Body,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::de::DeserializeOwned;
use std::future::Future;
use tokio::time::Instant;
use tracing::{debug, info};

/// Largest request body read before giving up.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Point in time by which the whole request must be answered.
fn deadline(state: &AppState) -> Instant {
    Instant::now() + state.request_timeout
}

/// Await a store call under the request deadline.
///
/// On expiry the store future is dropped, which interrupts its statement.
async fn bounded<T, F>(
    deadline: Instant,
    op: &'static str,
    storage_message: &'static str,
    fut: F,
) -> ApiResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout_at(deadline, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(ApiError::from_store(op, e, storage_message)),
        Err(_) => Err(ApiError::timeout(op)),
    }
}

/// Read the body under the request deadline and decode it as JSON.
///
/// The `Content-Type` header is not consulted.
async fn read_json<T>(deadline: Instant, op: &'static str, body: Body) -> ApiResult<T>
where
    T: DeserializeOwned,
{
    let bytes = match tokio::time::timeout_at(deadline, axum::body::to_bytes(body, MAX_BODY_BYTES)).await {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(e)) => return Err(ApiError::bad_request(op, MSG_BODY_UNREADABLE).with_cause(e)),
        Err(_) => return Err(ApiError::timeout(op)),
    };

    serde_json::from_slice(&bytes).map_err(|e| ApiError::bad_request(op, MSG_INVALID_JSON).with_cause(e))
}

fn path_id(op: &'static str, id: Result<Path<i64>, PathRejection>) -> ApiResult<i64> {
    id.map(|Path(id)| id)
        .map_err(|rejection| ApiError::bad_request(op, MSG_INVALID_ID).with_cause(rejection.body_text()))
}

/// `POST /tasks`
pub async fn create_task(
    State(state): State<AppState>,
    body: Body,
) -> ApiResult<impl IntoResponse> {
    const OP: &str = "handlers.create_task";
    let deadline = deadline(&state);

    let req: CreateTaskRequest = read_json(deadline, OP, body).await?;
    req.validate().map_err(|reason| {
        ApiError::bad_request(OP, format!("field validation failed: {}", reason))
    })?;

    let name = req.name.clone();
    let id = bounded(
        deadline,
        OP,
        MSG_SAVE_ERROR,
        state.store.create(req.name, req.description),
    )
    .await?;

    info!(op = OP, id, "task created");

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/tasks/{}", id))],
        Json(TaskResponse::new(id, name, EXECUTION_CREATED)),
    ))
}

/// `GET /tasks/{id}`
pub async fn get_task(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Task>> {
    const OP: &str = "handlers.get_task";
    let deadline = deadline(&state);

    let id = path_id(OP, id)?;
    let task = bounded(deadline, OP, MSG_SELECT_ERROR, state.store.get(id)).await?;

    info!(op = OP, id, "get task");
    Ok(Json(task))
}

/// `GET /tasks` and `GET /tasks?complete=true|false`
///
/// Any other `complete` value lists every task.
pub async fn list_tasks(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ApiResult<Json<Vec<Task>>> {
    const OP: &str = "handlers.list_tasks";
    let deadline = deadline(&state);

    let query = match query {
        Ok(Query(pairs)) => ListTasksQuery::from_pairs(pairs),
        Err(rejection) => {
            debug!(op = OP, error = %rejection.body_text(), "unparsable query, listing all");
            ListTasksQuery::default()
        }
    };
    let filter = query.filter();

    let tasks = bounded(deadline, OP, MSG_DB_ERROR, state.store.list(filter)).await?;

    info!(op = OP, filter = filter.as_str(), count = tasks.len(), "list tasks");
    Ok(Json(tasks))
}

/// `PATCH /tasks`
pub async fn complete_task(
    State(state): State<AppState>,
    body: Body,
) -> ApiResult<Json<TaskResponse>> {
    const OP: &str = "handlers.complete_task";
    let deadline = deadline(&state);

    let req: CompleteTaskRequest = read_json(deadline, OP, body).await?;
    if req.id == 0 {
        return Err(ApiError::bad_request(OP, MSG_INVALID_ID));
    }
    if !req.complete {
        return Err(ApiError::bad_request(OP, MSG_COMPLETE_MUST_BE_TRUE));
    }

    let task = bounded(deadline, OP, MSG_SELECT_ERROR, state.store.get(req.id)).await?;
    let outcome = bounded(deadline, OP, MSG_UPDATE_ERROR, state.store.complete(req.id)).await?;

    info!(op = OP, id = req.id, outcome = ?outcome, "complete task");
    Ok(Json(TaskResponse::new(req.id, task.name, EXECUTION_COMPLETED)))
}

/// `DELETE /tasks/{id}`
pub async fn delete_task(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<TaskResponse>> {
    const OP: &str = "handlers.delete_task";
    let deadline = deadline(&state);

    let id = path_id(OP, id)?;
    let task = bounded(deadline, OP, MSG_SELECT_ERROR, state.store.get(id)).await?;
    bounded(deadline, OP, MSG_DELETE_ERROR, state.store.delete(id)).await?;

    info!(op = OP, id, "task deleted");
    Ok(Json(TaskResponse::new(id, task.name, EXECUTION_DELETED)))
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn no_route() -> ApiError {
    ApiError::new("router.fallback", StatusCode::NOT_FOUND, MSG_NO_ROUTE)
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::new(
        "router.method_not_allowed",
        StatusCode::METHOD_NOT_ALLOWED,
        MSG_METHOD_NOT_ALLOWED,
    )
}
