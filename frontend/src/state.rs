//! Client-side todo collection.
//!
//! Every user intent is one request round trip, split into a `start`/`begin`
//! half that runs before the request and a `finish`/`settle` half that runs
//! with its outcome. Only toggling touches the collection before the server
//! answers; its [`PendingToggle`] carries what is needed to undo the flip.
//!
//! The collection keeps server order. Sorting for display happens in the view.

use shared::Todo;
use uuid::Uuid;

pub const LOAD_FAILED: &str = "Failed to load todos";
pub const ADD_FAILED: &str = "Failed to add todo";
pub const TOGGLE_FAILED: &str = "Failed to toggle todo";
pub const EDIT_FAILED: &str = "Failed to edit todo";
pub const NOTES_FAILED: &str = "Failed to update notes";
pub const DELETE_FAILED: &str = "Failed to delete todo";

#[derive(Debug, Clone, PartialEq)]
pub struct TodoState {
    pub todos: Vec<Todo>,
    pub loading: bool,
    pub error: Option<String>,
}

/// An optimistic completion flip waiting for the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingToggle {
    pub id: Uuid,
    pub previous: bool,
}

impl PendingToggle {
    /// The value sent to the server.
    pub fn completed(&self) -> bool {
        !self.previous
    }
}

fn message_or(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

impl Default for TodoState {
    fn default() -> Self {
        Self {
            todos: Vec::new(),
            loading: true,
            error: None,
        }
    }
}

impl TodoState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, id: Uuid) -> Option<&Todo> {
        self.todos.iter().find(|t| t.id == id)
    }

    fn find_mut(&mut self, id: Uuid) -> Option<&mut Todo> {
        self.todos.iter_mut().find(|t| t.id == id)
    }

    fn replace(&mut self, todo: Todo) {
        if let Some(slot) = self.find_mut(todo.id) {
            *slot = todo;
        }
    }

    fn fail(&mut self, message: String, fallback: &str) {
        self.error = Some(message_or(message, fallback));
    }

    pub fn start_load(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// Replaces the collection with the server's. A failed load leaves it
    /// empty rather than showing stale todos.
    pub fn finish_load(&mut self, result: Result<Vec<Todo>, String>) {
        match result {
            Ok(todos) => self.todos = todos,
            Err(message) => {
                self.fail(message, LOAD_FAILED);
                self.todos.clear();
            }
        }
        self.loading = false;
    }

    pub fn start_add(&mut self) {
        self.error = None;
    }

    /// Appends the created todo. The failure is handed back so the form can
    /// keep its input.
    pub fn finish_add(&mut self, result: Result<Todo, String>) -> Result<(), String> {
        match result {
            Ok(todo) => {
                self.todos.push(todo);
                Ok(())
            }
            Err(message) => {
                let message = message_or(message, ADD_FAILED);
                self.error = Some(message.clone());
                Err(message)
            }
        }
    }

    /// Flips `completed` locally. `None` for an unknown id; nothing to send.
    pub fn begin_toggle(&mut self, id: Uuid) -> Option<PendingToggle> {
        self.error = None;
        let todo = self.find_mut(id)?;
        let previous = todo.completed;
        todo.completed = !previous;

        Some(PendingToggle { id, previous })
    }

    /// Takes the server's copy, or restores the pre-toggle value.
    pub fn settle_toggle(&mut self, pending: PendingToggle, result: Result<Todo, String>) {
        match result {
            Ok(todo) => self.replace(todo),
            Err(message) => {
                if let Some(todo) = self.find_mut(pending.id) {
                    todo.completed = pending.previous;
                }
                self.fail(message, TOGGLE_FAILED);
            }
        }
    }

    /// Clears the last error before a text, notes or delete request.
    /// `false` for an unknown id; nothing to send.
    pub fn start_mutation(&mut self, id: Uuid) -> bool {
        self.error = None;
        self.find(id).is_some()
    }

    pub fn finish_edit(&mut self, result: Result<Todo, String>) {
        match result {
            Ok(todo) => self.replace(todo),
            Err(message) => self.fail(message, EDIT_FAILED),
        }
    }

    pub fn finish_notes(&mut self, result: Result<Todo, String>) {
        match result {
            Ok(todo) => self.replace(todo),
            Err(message) => self.fail(message, NOTES_FAILED),
        }
    }

    pub fn finish_remove(&mut self, id: Uuid, result: Result<(), String>) {
        match result {
            Ok(()) => self.todos.retain(|t| t.id != id),
            Err(message) => self.fail(message, DELETE_FAILED),
        }
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rstest::{fixture, rstest};
    use shared::Priority;

    fn todo(text: &str) -> Todo {
        Todo::new(text.into(), String::new(), None, Priority::Medium, Utc::now())
    }

    #[fixture]
    fn loaded() -> TodoState {
        let mut state = TodoState::new();
        state.start_load();
        state.finish_load(Ok(vec![todo("first"), todo("second")]));
        state
    }

    mod load {
        use super::*;

        #[rstest]
        fn starts_loading() {
            let state = TodoState::new();
            assert!(state.loading);
            assert!(state.todos.is_empty());
            assert_eq!(state.error, None);
        }

        #[rstest]
        fn keeps_server_order(loaded: TodoState) {
            let texts: Vec<&str> = loaded.todos.iter().map(|t| t.text.as_str()).collect();
            assert_eq!(texts, ["first", "second"]);
            assert!(!loaded.loading);
        }

        #[rstest]
        fn failure_clears_collection(mut loaded: TodoState) {
            loaded.start_load();
            loaded.finish_load(Err("Fetch error".into()));

            assert!(loaded.todos.is_empty());
            assert_eq!(loaded.error.as_deref(), Some("Fetch error"));
            assert!(!loaded.loading);
        }

        #[rstest]
        fn blank_failure_uses_fallback() {
            let mut state = TodoState::new();
            state.finish_load(Err(String::new()));
            assert_eq!(state.error.as_deref(), Some(LOAD_FAILED));
        }
    }

    mod add {
        use super::*;

        #[rstest]
        fn appends_in_server_order(mut loaded: TodoState) {
            let mut urgent = todo("urgent");
            urgent.priority = Priority::High;

            loaded.start_add();
            assert_eq!(loaded.finish_add(Ok(urgent.clone())), Ok(()));

            assert_eq!(loaded.todos.last(), Some(&urgent));
        }

        #[rstest]
        fn failure_is_recorded_and_returned(mut loaded: TodoState) {
            loaded.start_add();
            let result = loaded.finish_add(Err("Create error".into()));

            assert_eq!(result, Err("Create error".to_string()));
            assert_eq!(loaded.error.as_deref(), Some("Create error"));
            assert_eq!(loaded.todos.len(), 2);
        }

        #[rstest]
        fn starting_clears_previous_error(mut loaded: TodoState) {
            loaded.error = Some("old".into());
            loaded.start_add();
            assert_eq!(loaded.error, None);
        }
    }

    mod toggle {
        use super::*;

        #[rstest]
        fn flips_before_the_server_answers(mut loaded: TodoState) {
            let id = loaded.todos[0].id;

            let pending = loaded.begin_toggle(id).unwrap();

            assert!(loaded.find(id).unwrap().completed);
            assert!(!pending.previous);
            assert!(pending.completed());
        }

        #[rstest]
        fn success_takes_server_copy(mut loaded: TodoState) {
            let id = loaded.todos[0].id;
            let pending = loaded.begin_toggle(id).unwrap();

            let mut server = loaded.find(id).unwrap().clone();
            server.updated_at = server.updated_at + Duration::seconds(3);
            loaded.settle_toggle(pending, Ok(server.clone()));

            assert_eq!(loaded.find(id), Some(&server));
            assert_eq!(loaded.error, None);
        }

        #[rstest]
        fn failure_rolls_back(mut loaded: TodoState) {
            let id = loaded.todos[1].id;
            let before = loaded.find(id).unwrap().completed;

            let pending = loaded.begin_toggle(id).unwrap();
            loaded.settle_toggle(pending, Err("Server error. Please try again later.".into()));

            assert_eq!(loaded.find(id).unwrap().completed, before);
            assert!(loaded.error.is_some());
        }

        #[rstest]
        fn rollback_restores_completed_todo(mut loaded: TodoState) {
            let id = loaded.todos[0].id;
            loaded.todos[0].completed = true;

            let pending = loaded.begin_toggle(id).unwrap();
            assert!(!loaded.find(id).unwrap().completed);
            loaded.settle_toggle(pending, Err(String::new()));

            assert!(loaded.find(id).unwrap().completed);
            assert_eq!(loaded.error.as_deref(), Some(TOGGLE_FAILED));
        }

        #[rstest]
        fn unknown_id_sends_nothing(mut loaded: TodoState) {
            let before = loaded.clone();
            assert_eq!(loaded.begin_toggle(Uuid::new_v4()), None);
            assert_eq!(loaded.todos, before.todos);
        }
    }

    mod edit {
        use super::*;

        #[rstest]
        fn waits_for_the_server(mut loaded: TodoState) {
            let id = loaded.todos[0].id;
            assert!(loaded.start_mutation(id));
            assert_eq!(loaded.find(id).unwrap().text, "first");

            let mut server = loaded.find(id).unwrap().clone();
            server.text = "renamed".into();
            loaded.finish_edit(Ok(server));

            assert_eq!(loaded.find(id).unwrap().text, "renamed");
        }

        #[rstest]
        fn failure_keeps_local_copy(mut loaded: TodoState) {
            let before = loaded.todos.clone();
            loaded.finish_edit(Err("Todo not found.".into()));

            assert_eq!(loaded.todos, before);
            assert_eq!(loaded.error.as_deref(), Some("Todo not found."));
        }

        #[rstest]
        fn notes_failure_uses_notes_fallback(mut loaded: TodoState) {
            loaded.finish_notes(Err(" ".into()));
            assert_eq!(loaded.error.as_deref(), Some(NOTES_FAILED));
        }

        #[rstest]
        fn unknown_id_is_not_sent(mut loaded: TodoState) {
            assert!(!loaded.start_mutation(Uuid::new_v4()));
        }
    }

    mod remove {
        use super::*;

        #[rstest]
        fn success_drops_the_todo(mut loaded: TodoState) {
            let id = loaded.todos[0].id;
            loaded.finish_remove(id, Ok(()));

            assert_eq!(loaded.find(id), None);
            assert_eq!(loaded.todos.len(), 1);
        }

        #[rstest]
        fn failure_leaves_collection_unchanged(mut loaded: TodoState) {
            let id = loaded.todos[0].id;
            let before = loaded.todos.clone();

            loaded.finish_remove(id, Err("Network error. Please check your connection.".into()));

            assert_eq!(loaded.todos, before);
            assert!(loaded.error.is_some());
        }
    }
}
