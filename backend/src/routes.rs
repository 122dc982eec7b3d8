use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json},
    routing::{get, put},
    Router,
};
use serde_json::{json, Value};
use shared::Todo;
use uuid::Uuid;

use crate::{
    error::{fault_boundary, AppError},
    state::AppState,
    store::TodoStore,
};

/// `/api/todos` plus the health probes, with JSON fault rendering.
/// Static assets and transport layers are added by [`crate::app`].
pub fn router<S: TodoStore>(state: AppState<S>) -> Router {
    let api = Router::new()
        .route("/todos", get(list_todos::<S>).post(create_todo::<S>))
        .route("/todos/:id", put(update_todo::<S>).delete(delete_todo::<S>))
        .fallback(route_not_found);

    Router::new()
        .route("/health", get(health::<S>))
        .route("/ready", get(ready::<S>))
        .nest("/api", api)
        .layer(middleware::from_fn(fault_boundary))
        .with_state(state)
}

fn todo_id(id: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, AppError> {
    id.map(|Path(id)| id).map_err(|_| AppError::InvalidId)
}

async fn list_todos<S: TodoStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<Todo>>, AppError> {
    Ok(Json(state.service.list_all().await?))
}

async fn create_todo<S: TodoStore>(
    State(state): State<AppState<S>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Todo>), AppError> {
    let Json(payload) = payload?;
    let todo = state.service.create(&payload).await?;

    Ok((StatusCode::CREATED, Json(todo)))
}

async fn update_todo<S: TodoStore>(
    State(state): State<AppState<S>>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Todo>, AppError> {
    let id = todo_id(id)?;
    let Json(payload) = payload?;

    Ok(Json(state.service.update(id, &payload).await?))
}

async fn delete_todo<S: TodoStore>(
    State(state): State<AppState<S>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, AppError> {
    state.service.delete(todo_id(id)?).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn health<S: TodoStore>(State(state): State<AppState<S>>) -> impl IntoResponse {
    Json(json!({
        "status": "OK",
        "uptime": state.started_at.elapsed().as_secs_f64(),
    }))
}

async fn ready<S: TodoStore>(State(state): State<AppState<S>>) -> impl IntoResponse {
    match state.service.store().find_all().await {
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "Ready" }))),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "Not Ready" })),
        ),
    }
}

async fn route_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Route not found" })),
    )
}
