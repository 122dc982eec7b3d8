use std::{collections::HashMap, sync::Arc};

use shared::Todo;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, TodoChanges, TodoStore};

/// Process-local store. Selected with `TODO_STORE=memory` and used by tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    todos: Arc<RwLock<HashMap<Uuid, Todo>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TodoStore for MemoryStore {
    async fn find_all(&self) -> Result<Vec<Todo>, StoreError> {
        let mut todos: Vec<Todo> = self.todos.read().await.values().cloned().collect();
        todos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(todos)
    }

    async fn insert(&self, todo: &Todo) -> Result<(), StoreError> {
        let mut todos = self.todos.write().await;
        if todos.contains_key(&todo.id) {
            return Err(StoreError::Duplicate(todo.id.to_string()));
        }
        todos.insert(todo.id, todo.clone());
        Ok(())
    }

    async fn find_by_id_and_update(
        &self,
        id: Uuid,
        changes: &TodoChanges,
    ) -> Result<Option<Todo>, StoreError> {
        let mut todos = self.todos.write().await;
        Ok(todos.get_mut(&id).map(|todo| {
            changes.apply(todo);
            todo.clone()
        }))
    }

    async fn find_by_id_and_delete(&self, id: Uuid) -> Result<Option<Todo>, StoreError> {
        Ok(self.todos.write().await.remove(&id))
    }
}
