use chrono::Utc;
use serde_json::Value;
use shared::{validate_create, validate_update, Todo};
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    error::AppError,
    store::{StoreError, TodoChanges, TodoStore},
};

/// Validates requests and drives the store. Stateless apart from the store
/// handle, so it is cheap to clone into every request.
#[derive(Clone)]
pub struct TodoService<S> {
    store: S,
}

fn storage_failure(error: StoreError) -> AppError {
    error!(%error, "Todo store operation failed");
    AppError::Storage(error)
}

impl<S: TodoStore> TodoService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Every todo, newest first.
    pub async fn list_all(&self) -> Result<Vec<Todo>, AppError> {
        self.store.find_all().await.map_err(storage_failure)
    }

    pub async fn create(&self, payload: &Value) -> Result<Todo, AppError> {
        let request = validate_create(payload)?;

        let todo = Todo::new(
            request.text,
            request.notes.unwrap_or_default(),
            request.due_date,
            request.priority.unwrap_or_default(),
            Utc::now(),
        );
        self.store.insert(&todo).await.map_err(storage_failure)?;

        info!(id = %todo.id, priority = %todo.priority, "Created todo");
        Ok(todo)
    }

    /// Applies only the fields present in `payload`.
    pub async fn update(&self, id: Uuid, payload: &Value) -> Result<Todo, AppError> {
        let request = validate_update(payload)?;
        let changes = TodoChanges::from_request(request, Utc::now());

        let todo = self
            .store
            .find_by_id_and_update(id, &changes)
            .await
            .map_err(storage_failure)?
            .ok_or(AppError::NotFound)?;

        info!(%id, completed = todo.completed, "Updated todo");
        Ok(todo)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.store
            .find_by_id_and_delete(id)
            .await
            .map_err(storage_failure)?
            .ok_or(AppError::NotFound)?;

        info!(%id, "Deleted todo");
        Ok(())
    }
}
