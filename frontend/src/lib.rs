use std::collections::HashSet;

use sauron::prelude::*;
use shared::UpdateTodoRequest;
use uuid::Uuid;
use web_sys::console;

pub mod api;
pub mod form;
pub mod state;
pub mod view;

use form::{notes_error, TodoForm};
use state::{PendingToggle, TodoState};

#[derive(Debug, Clone)]
pub enum Msg {
    LoadTodos,
    TodosLoaded(Result<Vec<shared::Todo>, String>),
    DismissError,

    // Add form
    ToggleForm,
    SetText(String),
    SetNotes(String),
    SetDueDate(String),
    SetDueTime(String),
    SetPriority(String),
    SubmitForm,
    TodoAdded(Result<shared::Todo, String>),

    // Items
    ToggleTodo(Uuid),
    ToggleSettled(PendingToggle, Result<shared::Todo, String>),
    EditText(Uuid),
    SetEditText(String),
    SaveText(Uuid),
    TextSaved(Uuid, Result<shared::Todo, String>),
    EditNotes(Uuid),
    SetEditNotes(String),
    SaveNotes(Uuid),
    NotesSaved(Uuid, Result<shared::Todo, String>),
    CancelEdit,
    DeleteTodo(Uuid),
    TodoDeleted(Uuid, Result<(), String>),

    // Sections
    ToggleActiveSection,
    ToggleCompletedSection,
}

#[derive(Debug, Clone)]
pub struct Model {
    state: TodoState,
    form: TodoForm,
    editing_text: Option<Uuid>,
    edit_text: String,
    editing_notes: Option<Uuid>,
    edit_notes: String,
    edit_notes_error: Option<String>,
    pending: HashSet<Uuid>, // ids with a request in flight
    show_active: bool,
    show_completed: bool,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            state: TodoState::new(),
            form: TodoForm::default(),
            editing_text: None,
            edit_text: String::new(),
            editing_notes: None,
            edit_notes: String::new(),
            edit_notes_error: None,
            pending: HashSet::new(),
            show_active: true,
            show_completed: true,
        }
    }
}

fn send_update(
    id: Uuid,
    request: UpdateTodoRequest,
    done: fn(Uuid, Result<shared::Todo, String>) -> Msg,
) -> Cmd<Msg> {
    Cmd::new(async move {
        let result = api::update_todo(id, &request).await.map_err(|e| e.to_string());
        done(id, result)
    })
}

impl Application for Model {
    type MSG = Msg;

    fn init(&mut self) -> Cmd<Msg> {
        Cmd::new(async { Msg::LoadTodos })
    }

    fn update(&mut self, msg: Msg) -> Cmd<Msg> {
        match msg {
            Msg::LoadTodos => {
                self.state.start_load();
                Cmd::new(async {
                    Msg::TodosLoaded(api::fetch_todos().await.map_err(|e| e.to_string()))
                })
            }
            Msg::TodosLoaded(result) => {
                if let Ok(todos) = &result {
                    console::log_1(&format!("Loaded {} todos", todos.len()).into());
                }
                self.state.finish_load(result);
                Cmd::none()
            }
            Msg::DismissError => {
                self.state.dismiss_error();
                Cmd::none()
            }
            Msg::ToggleForm => {
                self.form.open = !self.form.open;
                Cmd::none()
            }
            Msg::SetText(text) => {
                self.form.text = text;
                Cmd::none()
            }
            Msg::SetNotes(notes) => {
                self.form.set_notes(notes);
                Cmd::none()
            }
            Msg::SetDueDate(date) => {
                self.form.due_date = date;
                Cmd::none()
            }
            Msg::SetDueTime(time) => {
                self.form.due_time = time;
                Cmd::none()
            }
            Msg::SetPriority(name) => {
                self.form.set_priority(&name);
                Cmd::none()
            }
            Msg::SubmitForm => {
                if self.form.submitting {
                    return Cmd::none();
                }
                let Some(request) = self.form.submit() else {
                    return Cmd::none();
                };

                self.state.start_add();
                Cmd::new(async move {
                    Msg::TodoAdded(api::create_todo(&request).await.map_err(|e| e.to_string()))
                })
            }
            Msg::TodoAdded(result) => {
                let outcome = self.state.finish_add(result);
                self.form.submitted(outcome);
                Cmd::none()
            }
            Msg::ToggleTodo(id) => match self.state.begin_toggle(id) {
                Some(pending) => {
                    self.pending.insert(id);
                    Cmd::new(async move {
                        let request = UpdateTodoRequest::completed(pending.completed());
                        let result = api::update_todo(id, &request).await.map_err(|e| e.to_string());
                        Msg::ToggleSettled(pending, result)
                    })
                }
                None => {
                    console::log_1(&format!("Toggle ignored, todo {id} is not loaded").into());
                    Cmd::none()
                }
            },
            Msg::ToggleSettled(pending, result) => {
                self.pending.remove(&pending.id);
                if let Err(e) = &result {
                    console::log_1(&format!("Toggle of {} failed, reverting: {e}", pending.id).into());
                }
                self.state.settle_toggle(pending, result);
                Cmd::none()
            }
            Msg::EditText(id) => {
                if let Some(todo) = self.state.find(id) {
                    self.editing_text = Some(id);
                    self.edit_text = todo.text.clone();
                }
                Cmd::none()
            }
            Msg::SetEditText(text) => {
                self.edit_text = text;
                Cmd::none()
            }
            Msg::SaveText(id) => {
                // Exit edit mode first so a double click cannot save twice.
                if self.editing_text.take() != Some(id) {
                    return Cmd::none();
                }
                let text = self.edit_text.trim().to_string();
                let unchanged = self.state.find(id).is_some_and(|t| t.text == text);
                if text.is_empty() || unchanged || !self.state.start_mutation(id) {
                    return Cmd::none();
                }

                self.pending.insert(id);
                send_update(id, UpdateTodoRequest::text(text), Msg::TextSaved)
            }
            Msg::TextSaved(id, result) => {
                self.pending.remove(&id);
                self.state.finish_edit(result);
                Cmd::none()
            }
            Msg::EditNotes(id) => {
                if let Some(todo) = self.state.find(id) {
                    self.editing_notes = Some(id);
                    self.edit_notes = todo.notes.clone();
                    self.edit_notes_error = None;
                }
                Cmd::none()
            }
            Msg::SetEditNotes(notes) => {
                self.edit_notes_error = notes_error(&notes);
                self.edit_notes = notes;
                Cmd::none()
            }
            Msg::SaveNotes(id) => {
                if self.editing_notes != Some(id) || self.edit_notes_error.is_some() {
                    return Cmd::none();
                }
                self.editing_notes = None;
                let notes = self.edit_notes.trim().to_string();
                let unchanged = self.state.find(id).is_some_and(|t| t.notes == notes);
                if unchanged || !self.state.start_mutation(id) {
                    return Cmd::none();
                }

                self.pending.insert(id);
                send_update(id, UpdateTodoRequest::notes(notes), Msg::NotesSaved)
            }
            Msg::NotesSaved(id, result) => {
                self.pending.remove(&id);
                self.state.finish_notes(result);
                Cmd::none()
            }
            Msg::CancelEdit => {
                self.editing_text = None;
                self.editing_notes = None;
                self.edit_notes_error = None;
                Cmd::none()
            }
            Msg::DeleteTodo(id) => {
                if !self.state.start_mutation(id) {
                    return Cmd::none();
                }
                self.pending.insert(id);
                Cmd::new(async move {
                    Msg::TodoDeleted(id, api::delete_todo(id).await.map_err(|e| e.to_string()))
                })
            }
            Msg::TodoDeleted(id, result) => {
                self.pending.remove(&id);
                self.state.finish_remove(id, result);
                Cmd::none()
            }
            Msg::ToggleActiveSection => {
                self.show_active = !self.show_active;
                Cmd::none()
            }
            Msg::ToggleCompletedSection => {
                self.show_completed = !self.show_completed;
                Cmd::none()
            }
        }
    }

    fn view(&self) -> Node<Msg> {
        self.view_page()
    }
}

#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    Program::mount_to_body(Model::default());
}
