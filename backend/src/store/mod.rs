//! # Persistence
//!
//! Todos are stored as whole documents keyed by id. A backend only has to
//! provide four operations, each atomic for a single document:
//!
//! - list everything, newest `createdAt` first
//! - insert a new document, refusing an id that already exists
//! - find a document by id and merge a partial update into it
//! - find a document by id and remove it
//!
//! "No such id" is `Ok(None)`, never an error. Retries are left to the
//! backend's own client.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::{Patch, Priority, Todo, UpdateTodoRequest};
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod redis;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Duplicate key: {0}")]
    Duplicate(String),

    #[error("Storage backend failure: {0}")]
    Backend(String),

    #[error("Stored document is unreadable: {0}")]
    Corrupt(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        StoreError::Corrupt(error.to_string())
    }
}

pub trait TodoStore: Clone + Send + Sync + 'static {
    fn find_all(&self) -> impl Future<Output = Result<Vec<Todo>, StoreError>> + Send;

    fn insert(&self, todo: &Todo) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn find_by_id_and_update(
        &self,
        id: Uuid,
        changes: &TodoChanges,
    ) -> impl Future<Output = Result<Option<Todo>, StoreError>> + Send;

    fn find_by_id_and_delete(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Todo>, StoreError>> + Send;
}

/// The fields a partial update sets. Anything `None`/`Absent` is left as is.
///
/// Serializes to the camelCase subset of a stored [`Todo`] it overwrites, so a
/// backend can merge it into the document server-side.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Patch::is_absent")]
    pub due_date: Patch<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    pub updated_at: DateTime<Utc>,
}

impl TodoChanges {
    pub fn from_request(request: UpdateTodoRequest, updated_at: DateTime<Utc>) -> Self {
        Self {
            text: request.text,
            notes: request.notes,
            completed: request.completed,
            due_date: request.due_date,
            priority: request.priority,
            updated_at,
        }
    }

    pub fn apply(&self, todo: &mut Todo) {
        if let Some(text) = &self.text {
            todo.text.clone_from(text);
        }
        if let Some(notes) = &self.notes {
            todo.notes.clone_from(notes);
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
        if let Some(due_date) = self.due_date.into_change() {
            todo.due_date = due_date;
        }
        if let Some(priority) = self.priority {
            todo.priority = priority;
        }
        todo.updated_at = self.updated_at;
    }
}
